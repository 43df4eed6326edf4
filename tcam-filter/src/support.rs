use crate::{Bit, Filter};
use std::collections::HashMap;

/// A filter's *support*: the strictly increasing sequence of bit positions at
/// which it is not `ANY`. Two filters with the same support agree on which
/// positions they care about, though not necessarily on the values there.
pub type Support = Vec<u32>;

/// Supports keyed associative container. `Vec<u32>`'s derived `Hash`/`Eq` are
/// already order-sensitive over the sorted form, so no custom canonicalization
/// is needed here.
pub type SupportMap<V> = HashMap<Support, V>;

/// The support of `filter`: sorted indices `i` with `filter.at(i) != Bit::Any`.
pub fn to_support(filter: &Filter) -> Support {
    (0..filter.width()).filter(|&i| filter.at(i) != Bit::Any).collect()
}

/// The supports of `filters`, in the same order.
pub fn to_supports(filters: &[Filter]) -> Vec<Support> {
    filters.iter().map(to_support).collect()
}

/// Sorts and deduplicates `supports`. Idempotent.
pub fn select_unique(mut supports: Vec<Support>) -> Vec<Support> {
    supports.sort_unstable();
    supports.dedup();
    supports
}

/// `true` iff every index in `sub` also occurs in `sup` (both sorted).
pub fn is_subset(sub: &[u32], sup: &[u32]) -> bool {
    let mut sup_it = sup.iter();
    'outer: for &s in sub {
        for &t in sup_it.by_ref() {
            if t == s {
                continue 'outer;
            }
            if t > s {
                return false;
            }
        }
        return false;
    }
    true
}

/// Sorted union of two sorted index sequences.
pub fn union(a: &[u32], b: &[u32]) -> Support {
    let mut result = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => { result.push(a[i]); i += 1; }
            std::cmp::Ordering::Greater => { result.push(b[j]); j += 1; }
            std::cmp::Ordering::Equal => { result.push(a[i]); i += 1; j += 1; }
        }
    }
    result.extend_from_slice(&a[i..]);
    result.extend_from_slice(&b[j..]);
    result
}

/// Per-unique-support occurrence counts ("weights") of `unique` within
/// `all_supports`.
pub fn weights_of(unique: &[Support], all_supports: &[Support]) -> Vec<u64> {
    let mut counts: SupportMap<u64> = SupportMap::new();
    for s in all_supports {
        *counts.entry(s.clone()).or_insert(0) += 1;
    }
    unique.iter().map(|s| counts.get(s).copied().unwrap_or(0)).collect()
}

/// Sorts and deduplicates `supports`, pairing each unique support with its
/// multiplicity in the original sequence.
pub fn select_unique_and_weigh(supports: &[Support]) -> (Vec<Support>, Vec<u64>) {
    let unique = select_unique(supports.to_vec());
    let weights = weights_of(&unique, supports);
    (unique, weights)
}
