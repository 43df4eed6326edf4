//! Maximal order-independent (OI) subset extraction (C3).

use tcam_filter::{intersect, Filter};

/// Greedily extends a (possibly empty) OI subset of `filters`, restricted to
/// `bits`, scanning in input order: index `i` is kept iff it doesn't
/// intersect (under `bits`) any index already kept. The result is maximal
/// under greedy extension (adding any omitted index would break OI-ness),
/// not necessarily the globally largest OI subset — callers exploit this by
/// permuting or pre-filtering the input.
pub fn find_maximal_oi_subset(filters: &[Filter], bits: &[u32]) -> Vec<usize> {
    let mut result = Vec::new();
    'next: for i in 0..filters.len() {
        for &j in &result {
            if intersect(&filters[j], &filters[i], bits) {
                continue 'next;
            }
        }
        result.push(i);
    }
    result
}

/// Same algorithm, restricted to `indices` (a caller-supplied subset of
/// `filters`' indices, scanned in the given order). Returns indices into the
/// original `filters` slice.
pub fn find_maximal_oi_subset_indices(filters: &[Filter], indices: &[usize], bits: &[u32]) -> Vec<usize> {
    let mut result = Vec::new();
    'next: for &i in indices {
        for &j in &result {
            if intersect(&filters[j], &filters[i], bits) {
                continue 'next;
            }
        }
        result.push(i);
    }
    result
}

/// `true` iff `filters[i]` restricted to `indices` is pairwise non-intersecting
/// under `bits`. Used as a `debug_assert!` postcondition, not on the hot path.
pub fn is_oi(filters: &[Filter], indices: &[usize], bits: &[u32]) -> bool {
    for (pos, &i) in indices.iter().enumerate() {
        for &j in &indices[..pos] {
            if intersect(&filters[i], &filters[j], bits) {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcam_filter::Filter;

    fn f(s: &str) -> Filter {
        let width = s.len();
        let mut value = vec![false; width];
        let mut mask = vec![false; width];
        for (pos, c) in s.chars().enumerate() {
            let i = width - 1 - pos;
            match c {
                '1' => { value[i] = true; mask[i] = true; }
                '0' => { mask[i] = true; }
                '*' => {}
                _ => panic!("bad char"),
            }
        }
        Filter::new(&value, &mask).unwrap()
    }

    #[test]
    fn maximal_oi_subset_is_oi() {
        let filters = vec![f("1*0"), f("0*1"), f("11*"), f("00*")];
        let bits = [0, 1, 2];
        let result = find_maximal_oi_subset(&filters, &bits);
        assert!(is_oi(&filters, &result, &bits));
    }

    #[test]
    fn maximal_oi_subset_is_order_dependent() {
        // f0 and f1 intersect; greedy keeps whichever comes first.
        let filters = vec![f("1**"), f("1**")];
        let bits = [0, 1, 2];
        assert_eq!(find_maximal_oi_subset(&filters, &bits), vec![0]);
    }

    #[test]
    fn disjoint_filters_are_all_kept() {
        let filters = vec![f("00"), f("01"), f("10"), f("11")];
        let bits = [0, 1];
        assert_eq!(find_maximal_oi_subset(&filters, &bits), vec![0, 1, 2, 3]);
    }

    #[test]
    fn indices_variant_preserves_caller_order() {
        let filters = vec![f("1**"), f("0**"), f("1**")];
        let bits = [0, 1, 2];
        // present index 2 before index 0; since 0 and 2 intersect, only the
        // first-seen (2) survives.
        let indices = [2, 0, 1];
        let result = find_maximal_oi_subset_indices(&filters, &indices, &bits);
        assert_eq!(result, vec![2, 1]);
    }
}
