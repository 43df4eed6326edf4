//! Greedy antichain-contracting expansion loop (C8): repeatedly merges two
//! comparable-or-antichain supports into their union, paying the TCAM
//! blow-up this causes, until no merge fits the remaining memory budget.

use crate::antichain::max_antichain;
use crate::logging;
use tcam_filter::{is_subset, union, Support, SupportMap};

/// `2^exp`, saturating to `u128::MAX` if `exp >= 128` (the widest filter this
/// crate supports, 104 bits, never triggers this in practice; it exists so a
/// pathological exponent is treated as "forbidden" rather than wrapping).
fn pow2_saturating(exp: u32) -> u128 {
    if exp >= 128 {
        u128::MAX
    } else {
        1u128 << exp
    }
}

/// The TCAM-entry blow-up of merging supports `a` and `b` (with weights
/// `w_a`/`w_b`) into their union `u`: each original rule with support `a`
/// expands into `2^(|u|-|a|)` entries, so the net new entries contributed are
/// `w_a * (2^(|u|-|a|) - 1) + w_b * (2^(|u|-|b|) - 1)`.
fn calc_memory_increase(u: &Support, a: &Support, b: &Support, w_a: u64, w_b: u64) -> u128 {
    let delta_a = pow2_saturating((u.len() - a.len()) as u32).saturating_sub(1);
    let delta_b = pow2_saturating((u.len() - b.len()) as u32).saturating_sub(1);
    (w_a as u128).saturating_mul(delta_a).saturating_add((w_b as u128).saturating_mul(delta_b))
}

/// `(a_idx, b_idx, delta)` of the cheapest eligible merge in one group, or
/// `None` if none fits.
type Proposal = Option<(usize, usize, u128)>;

/// Tries Class 1 (preferred: one endpoint in the antichain, the other any
/// proper superset of it) then, only if Class 1 has no candidate at all,
/// Class 2 (both endpoints in the antichain). If Class 1 has candidates but
/// none fits `budget_remaining`, the group's proposal is invalid for this
/// round -- Class 2 is *not* tried as a fallback.
fn try_reduce_antichain(antichain: &[usize], ss: &[Support], weights: &[u64], budget_remaining: u128) -> Proposal {
    let mut best: Proposal = None;
    let mut class1_has_candidate = false;

    for &a in antichain {
        for i in 0..ss.len() {
            if ss[a] != ss[i] && is_subset(&ss[a], &ss[i]) {
                class1_has_candidate = true;
                let u = union(&ss[a], &ss[i]);
                let delta = calc_memory_increase(&u, &ss[a], &ss[i], weights[a], weights[i]);
                log::info!("trying to merge {:?} with {:?}, memory increase is {delta}", ss[a], ss[i]);
                if delta <= budget_remaining && best.map_or(true, |(_, _, best_delta)| delta < best_delta) {
                    best = Some((a, i, delta));
                }
            }
        }
    }
    if class1_has_candidate {
        return best;
    }

    for &a in antichain {
        for &b in antichain {
            if a != b {
                let u = union(&ss[a], &ss[b]);
                let delta = calc_memory_increase(&u, &ss[a], &ss[b], weights[a], weights[b]);
                log::info!("trying to merge {a} with {b}, memory increase is {delta}");
                if delta <= budget_remaining && best.map_or(true, |(_, _, best_delta)| delta < best_delta) {
                    best = Some((a, b, delta));
                }
            }
        }
    }
    best
}

fn preimage(expansions: &SupportMap<Support>, target: &Support) -> Vec<Support> {
    expansions.iter().filter(|(_, v)| *v == target).map(|(k, _)| k.clone()).collect()
}

/// Merges `ss[a]` and `ss[b]` into their union, rebinding every original
/// support that currently maps to either of them. Returns `delta` for the
/// caller to add to `current_memory`.
fn apply_merge(ss: &mut Vec<Support>, weights: &mut Vec<u64>, expansions: &mut SupportMap<Support>, a: usize, b: usize, delta: u128) -> u64 {
    let (a, b) = if a < b { (a, b) } else { (b, a) };

    let a_support = ss[a].clone();
    let b_support = ss[b].clone();
    let a_preimage = preimage(expansions, &a_support);
    let b_preimage = preimage(expansions, &b_support);

    let merged = union(&a_support, &b_support);
    let delta_u64 = delta as u64; // fits: delta was checked <= (max_memory - current_memory), a u64 budget.
    let new_weight = weights[a] + weights[b] + delta_u64;

    log::info!("expanding set #{a} and set #{b}, old size is {}", ss.len());

    ss.remove(b);
    weights.remove(b);
    ss.remove(a);
    weights.remove(a);
    ss.push(merged.clone());
    weights.push(new_weight);

    for k in a_preimage.into_iter().chain(b_preimage) {
        expansions.insert(k, merged.clone());
    }

    log::info!("stop expanding, new size is {}", ss.len());
    delta_u64
}

/// Result of [`min_chain_partition_with_expansion`]: per-group final
/// supports and the expansion map recording, for every original support,
/// which (possibly merged) support it now maps to.
pub struct ExpansionResult {
    pub supports: Vec<Vec<Support>>,
    pub expansion_maps: Vec<SupportMap<Support>>,
}

/// Greedily reduces the number of unique supports per group by repeatedly
/// contracting the cheapest eligible antichain merge across all groups,
/// subject to a global memory budget `max_memory` (in TCAM-entry units).
/// Terminates when no group has a merge within budget -- this is not an
/// error: the caller inspects the result sizes to see how far it got.
pub fn min_chain_partition_with_expansion(groups: &[Vec<Support>], weights: &[Vec<u64>], max_memory: u64) -> ExpansionResult {
    logging::ensure_initialized();

    let mut groups: Vec<Vec<Support>> = groups.to_vec();
    let mut weights: Vec<Vec<u64>> = weights.to_vec();

    let mut current_memory: u128 = weights.iter().flatten().map(|&w| w as u128).sum();

    let mut expansion_maps: Vec<SupportMap<Support>> =
        groups.iter().map(|ss| ss.iter().map(|s| (s.clone(), s.clone())).collect()).collect();

    loop {
        let max_memory = max_memory as u128;
        let budget_remaining = max_memory.saturating_sub(current_memory);

        let proposals: Vec<Proposal> = (0..groups.len())
            .map(|gi| {
                let antichain = max_antichain(&groups[gi]);
                try_reduce_antichain(&antichain, &groups[gi], &weights[gi], budget_remaining)
            })
            .collect();

        let winner = proposals
            .iter()
            .enumerate()
            .filter_map(|(gi, p)| p.map(|(_, _, delta)| (gi, delta)))
            .min_by_key(|&(_, delta)| delta)
            .map(|(gi, _)| gi);

        let Some(winner) = winner else { break };
        let (a, b, delta) = proposals[winner].expect("winner was selected from a Some proposal");
        let applied = apply_merge(&mut groups[winner], &mut weights[winner], &mut expansion_maps[winner], a, b, delta);
        current_memory += applied as u128;
    }

    ExpansionResult { supports: groups, expansion_maps }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_succeeds_within_budget() {
        let groups = vec![vec![vec![0, 1], vec![0, 2]]];
        let weights = vec![vec![1, 1]];
        let result = min_chain_partition_with_expansion(&groups, &weights, 4);
        assert_eq!(result.supports[0].len(), 1);
        assert_eq!(result.supports[0][0], vec![0, 1, 2]);
        let map = &result.expansion_maps[0];
        assert_eq!(map[&vec![0, 1]], vec![0, 1, 2]);
        assert_eq!(map[&vec![0, 2]], vec![0, 1, 2]);
    }

    #[test]
    fn expansion_blocked_by_budget_leaves_two_supports() {
        let groups = vec![vec![vec![0, 1], vec![0, 2]]];
        let weights = vec![vec![10, 10]];
        let result = min_chain_partition_with_expansion(&groups, &weights, 21);
        assert_eq!(result.supports[0].len(), 2);
    }

    #[test]
    fn expansion_map_value_set_equals_current_supports() {
        let groups = vec![vec![vec![0], vec![0, 1], vec![0, 2]]];
        let weights = vec![vec![1, 1, 1]];
        let result = min_chain_partition_with_expansion(&groups, &weights, 100);
        let mut values: Vec<Support> = result.expansion_maps[0].values().cloned().collect();
        values.sort();
        values.dedup();
        let mut current = result.supports[0].clone();
        current.sort();
        assert_eq!(values, current);
    }

    #[test]
    fn applying_expansion_map_twice_equals_once() {
        let groups = vec![vec![vec![0, 1], vec![0, 2]]];
        let weights = vec![vec![1, 1]];
        let result = min_chain_partition_with_expansion(&groups, &weights, 4);
        let map = &result.expansion_maps[0];
        let once = map[&vec![0, 1]].clone();
        // the map is idempotent on its own image: re-looking-up an already
        // merged support (if present) would return itself.
        if let Some(twice) = map.get(&once) {
            assert_eq!(*twice, once);
        }
    }
}
