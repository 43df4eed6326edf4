//! Bit-selection heuristics for width reduction (C4): `best_min_similarity_bits`
//! picks `l` bits directly by a similarity score; `best_to_stay_minme` drops
//! one bit at a time (via `MAX_OI` or `BLOCKERS`) while maintaining a maximal
//! OI subset of the surviving filters.

use crate::config;
use crate::logging;
use crate::oi::{find_maximal_oi_subset, find_maximal_oi_subset_indices, is_oi};
use rayon::prelude::*;
use tcam_filter::{Bit, Filter};

/// Which signal `best_to_stay_minme` uses to choose the next bit to drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinMeMode {
    /// Score each candidate bit by the size of the maximal OI subset obtained
    /// by dropping it; keep the bit that leaves the largest subset.
    MaxOi,
    /// Score each candidate bit by how many filters it "blocks" from having
    /// that bit dropped without creating an unwanted overlap.
    Blockers,
}

/// Outcome of one `BLOCKERS` bit-removal step: an ordinary bit choice, or a
/// signal that the don't-care heuristic (§4.4.4) should fire. Replaces the
/// original implementation's `best_bit - 100000` sentinel with an explicit
/// variant; `bit_if_abandoned` is the bit that would have been chosen had the
/// fallback not fired, used if the fallback is later abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BitChoice {
    Bit(u32),
    Fallback { bit_if_abandoned: u32 },
}

/// Picks the bit from `all_bits` maximizing/minimizing `value`, preferring
/// bits not in `bits_to_avoid`; falls back to `bits_to_avoid` only if no
/// other candidate exists. `better(new, current_best)` returns `true` when
/// `new` should replace `current_best`.
fn find_best_bit(
    all_bits: &[u32],
    bits_to_avoid: &[u32],
    value: impl Fn(u32) -> f64,
    better: impl Fn(f64, f64) -> bool,
) -> u32 {
    let try_first: Vec<u32> = all_bits.iter().copied().filter(|b| !bits_to_avoid.contains(b)).collect();
    let try_second: Vec<u32> = all_bits.iter().copied().filter(|b| !try_first.contains(b)).collect();

    let mut best_bit: Option<u32> = None;
    let mut best_value = 0.0f64;
    for candidates in [&try_first, &try_second] {
        if best_bit.is_some() {
            break;
        }
        for &bit in candidates {
            let v = value(bit);
            if best_bit.is_none() || better(v, best_value) {
                best_bit = Some(bit);
                best_value = v;
            }
        }
    }
    best_bit.expect("find_best_bit requires at least one candidate bit")
}

/// Bits at which no filter in `filters` has `ANY`, restricted to `bits_in_use`.
fn find_exact(filters: &[Filter], bits_in_use: &[u32]) -> Vec<u32> {
    bits_in_use
        .iter()
        .copied()
        .filter(|&bit| filters.iter().all(|f| f.at(bit) != Bit::Any))
        .collect()
}

/// Picks `l` distinct bit columns directly: repeatedly takes the
/// not-yet-picked bit whose `max(count_zero, count_one)` is smallest, where
/// `count_one`/`count_zero` count filters compatible with `ONE`/`ZERO` there
/// (an `ANY` filter counts toward both). First-seen wins ties.
pub fn best_min_similarity_bits(filters: &[Filter], l: u32) -> Vec<u32> {
    assert!(!filters.is_empty(), "best_min_similarity_bits requires a non-empty filter list");
    let width = filters[0].width();
    let mut result: Vec<u32> = Vec::new();
    while (result.len() as u32) < l {
        let mut best_bit: Option<u32> = None;
        let mut best_value = u64::MAX;
        for i in 0..width {
            if result.contains(&i) {
                continue;
            }
            let (mut count_zero, mut count_one) = (0u64, 0u64);
            for f in filters {
                match f.at(i) {
                    Bit::Any => { count_zero += 1; count_one += 1; }
                    Bit::One => count_one += 1,
                    Bit::Zero => count_zero += 1,
                }
            }
            let value = count_zero.max(count_one);
            if best_bit.is_none() || value < best_value {
                best_bit = Some(i);
                best_value = value;
            }
        }
        result.push(best_bit.expect("at least one unpicked bit remains"));
    }
    result
}

/// A blocker of filter `i` at bit `b`: a higher-priority filter `j < i` whose
/// only positional conflict with `i` (within `bits_in_use`) is at `b`, so
/// dropping `b` would make `i` and `j` intersect. `blockers[i][b]` over the
/// full filter width; computed by the parallel scan described in §5 of the
/// specification (one task per `i`, writing only to its own row).
fn find_blockers(filters: &[Filter], bits_in_use: &[u32]) -> Vec<Vec<bool>> {
    let width = filters[0].width() as usize;
    let n = filters.len();
    let mut blockers = vec![vec![false; width]; n];
    config::run(|| {
        blockers.par_iter_mut().enumerate().for_each(|(i, row)| {
            for j in 0..i {
                let mut first_difference: Option<u32> = None;
                let mut only_difference = true;
                for &bit in bits_in_use {
                    let higher = filters[j].at(bit);
                    let lower = filters[i].at(bit);
                    if higher != Bit::Any && lower != Bit::Any && higher != lower {
                        if first_difference.is_some() {
                            only_difference = false;
                            break;
                        } else {
                            first_difference = Some(bit);
                        }
                    }
                }
                match first_difference {
                    None => {
                        for &bit in bits_in_use {
                            row[bit as usize] = true;
                        }
                        break;
                    }
                    Some(d) if only_difference => row[d as usize] = true,
                    _ => {}
                }
            }
        });
    });
    blockers
}

fn remove_bit_oi(filters: &[Filter], bits_in_use: &[u32], bits_to_avoid: &[u32]) -> (u32, Vec<usize>) {
    let best_bit = find_best_bit(
        bits_in_use,
        bits_to_avoid,
        |bit| {
            let remaining: Vec<u32> = bits_in_use.iter().copied().filter(|&b| b != bit).collect();
            find_maximal_oi_subset(filters, &remaining).len() as f64
        },
        |new, best| new > best,
    );
    let oi_indices = find_maximal_oi_subset(filters, bits_in_use);
    (best_bit, oi_indices)
}

/// `true` when the blockers signal has plateaued enough (§4.4.4) that the
/// don't-care fallback should fire: sorts `bits_in_use` ascending by blocker
/// count and compares the minimum against the count at rank `2l` — the
/// fallback fires when the lowest blocker count is already within 10% of the
/// count `2l` ranks up, i.e. blockers are nearly uniform across the bits a
/// normal reduction would consider.
fn dontcare_heuristic_should_fire(bits_in_use: &[u32], bit_num_blockers: &[u64], l: u32) -> bool {
    if bits_in_use.len() <= 2 * l as usize {
        return false;
    }
    let mut by_blockers_asc = bits_in_use.to_vec();
    by_blockers_asc.sort_unstable_by_key(|&b| bit_num_blockers[b as usize]);
    let min = bit_num_blockers[by_blockers_asc[0] as usize] as f64;
    let at_2l = bit_num_blockers[by_blockers_asc[2 * l as usize] as usize] as f64;
    min >= 0.9 * at_2l
}

fn remove_bit_blockers(
    filters: &[Filter],
    bits_in_use: &[u32],
    bits_to_avoid: &[u32],
    bit_num_dontcare: &[u64],
    l: u32,
) -> (BitChoice, Vec<usize>) {
    let blockers = find_blockers(filters, bits_in_use);
    let width = filters[0].width() as usize;

    let mut bit_num_blockers = vec![0u64; width];
    for row in &blockers {
        for (b, &blocked) in row.iter().enumerate() {
            if blocked {
                bit_num_blockers[b] += 1;
            }
        }
    }

    let use_dontcare_heuristic = dontcare_heuristic_should_fire(bits_in_use, &bit_num_blockers, l);

    let best_bit = find_best_bit(
        bits_in_use,
        bits_to_avoid,
        |bit| bit_num_blockers[bit as usize] as f64 - 0.000_001 * bit_num_dontcare[bit as usize] as f64,
        |new, best| new < best,
    );

    let oi_indices: Vec<usize> = (0..filters.len()).filter(|&i| !blockers[i][best_bit as usize]).collect();

    log::info!("best bit is {best_bit} with {} rules and {} ANY bits", oi_indices.len(), bit_num_dontcare[best_bit as usize]);

    let choice = if use_dontcare_heuristic {
        BitChoice::Fallback { bit_if_abandoned: best_bit }
    } else {
        BitChoice::Bit(best_bit)
    };
    (choice, oi_indices)
}

/// Drops one bit per iteration, restricting the filter list to a maximal OI
/// subset over the remaining bits each time, until `bits_in_use.len() == l`
/// (and, when `only_exact`, until every remaining bit is exact). Returns the
/// final `bits_in_use` and the original indices of the surviving filters.
///
/// # Panics
/// If `filters` is empty.
pub fn best_to_stay_minme(filters: &[Filter], l: u32, mode: MinMeMode, only_exact: bool) -> (Vec<u32>, Vec<usize>) {
    assert!(!filters.is_empty(), "best_to_stay_minme requires a non-empty filter list");
    logging::ensure_initialized();
    log::info!("starting minme; mode: {mode:?}; only_exact: {only_exact}");

    let width = filters[0].width();
    let mut bits_in_use: Vec<u32> = (0..width).collect();
    let mut exact_bits_in_use = find_exact(filters, &bits_in_use);

    let mut indices: Vec<usize> = (0..filters.len()).collect();
    let mut cur_filters: Vec<Filter> = filters.to_vec();

    loop {
        if bits_in_use.len() <= l as usize && !(only_exact && bits_in_use != exact_bits_in_use) {
            break;
        }

        let bits_to_avoid: Vec<u32> = if only_exact { exact_bits_in_use.clone() } else { Vec::new() };

        let mut bit_num_dontcare = vec![0u64; width as usize];
        for f in &cur_filters {
            for &i in &bits_in_use {
                if f.at(i) == Bit::Any {
                    bit_num_dontcare[i as usize] += 1;
                }
            }
        }

        let (choice, mut oi_indices) = match mode {
            MinMeMode::MaxOi => {
                let (bit, oi) = remove_bit_oi(&cur_filters, &bits_in_use, &bits_to_avoid);
                (BitChoice::Bit(bit), oi)
            }
            MinMeMode::Blockers => remove_bit_blockers(&cur_filters, &bits_in_use, &bits_to_avoid, &bit_num_dontcare, l),
        };

        let mut use_dontcare_heuristic = false;
        let mut fallback_bit_to_remove: Option<u32> = None;

        if let BitChoice::Fallback { bit_if_abandoned } = choice {
            log::info!("using don't-care heuristic");
            use_dontcare_heuristic = true;

            let mut by_dontcare_desc = bits_in_use.clone();
            by_dontcare_desc.sort_unstable_by(|&a, &b| bit_num_dontcare[b as usize].cmp(&bit_num_dontcare[a as usize]));
            let cur_in_use: Vec<u32> = by_dontcare_desc.into_iter().take(l as usize).collect();

            let new_exact_indices: Vec<usize> = (0..cur_filters.len())
                .filter(|&i| !only_exact || cur_in_use.iter().all(|&bit| cur_filters[i].at(bit) != Bit::Any))
                .collect();

            if (new_exact_indices.len() as f64) < 0.001 * cur_filters.len() as f64 {
                log::info!("don't-care heuristic abandoned: only {} surviving indices", new_exact_indices.len());
                use_dontcare_heuristic = false;
                fallback_bit_to_remove = Some(bit_if_abandoned);
            } else {
                bits_in_use = cur_in_use.clone();
                oi_indices = find_maximal_oi_subset_indices(&cur_filters, &new_exact_indices, &cur_in_use);
            }
        }

        if !use_dontcare_heuristic {
            let bit_to_remove = fallback_bit_to_remove.unwrap_or(match choice {
                BitChoice::Bit(b) => b,
                BitChoice::Fallback { bit_if_abandoned } => bit_if_abandoned,
            });
            bits_in_use.retain(|&b| b != bit_to_remove);
        }

        indices = oi_indices.iter().map(|&i| indices[i]).collect();
        cur_filters = oi_indices.iter().map(|&i| cur_filters[i]).collect();

        exact_bits_in_use = find_exact(&cur_filters, &bits_in_use);

        log::info!(
            "bits left: {}; exact bits left: {}; entries left: {}",
            bits_in_use.len(),
            exact_bits_in_use.len(),
            cur_filters.len()
        );

        if use_dontcare_heuristic {
            break;
        }
    }

    debug_assert!(is_oi(&cur_filters, &(0..cur_filters.len()).collect::<Vec<_>>(), &bits_in_use));

    (bits_in_use, indices)
}
