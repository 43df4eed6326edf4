//! The five public batch entry points (C9): compose unique-support
//! extraction, per-support weights, and the C5-C8 algorithms into results
//! keyed back to the caller's original rule indices.

use crate::error::{Result, TcamError};
use crate::expansion::{self, ExpansionResult};
use crate::flow;
use crate::heuristics::{self, MinMeMode};
use crate::matching;
use crate::oi::find_maximal_oi_subset;
use std::collections::HashMap;
use tcam_filter::{select_unique, select_unique_and_weigh, to_support, to_supports, Filter, Support};

/// Result of [`min_chain_partition`] and [`min_bounded_chain_partition`]: the
/// chain decomposition of one group's unique supports, plus, for each chain,
/// the indices (into the group's original rule table) of rules mapping to a
/// support in that chain.
#[derive(Debug, Clone)]
pub struct ChainPartitionResult {
    pub chains: Vec<Vec<Support>>,
    pub rule_buckets: Vec<Vec<usize>>,
}

/// Result of [`min_chain_partition_with_expansion`]: the chain decomposition
/// of the group's *expanded* supports, rule buckets over those chains, and,
/// for every original rule, the expanded support it now maps to.
#[derive(Debug, Clone)]
pub struct ExpandedPartitionResult {
    pub chains: Vec<Vec<Support>>,
    pub rule_buckets: Vec<Vec<usize>>,
    pub rule_expanded_support: Vec<Support>,
}

/// Which bit-selection algorithm [`best_subgroup`] should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitSelectionAlgorithm {
    MinSimilarity,
    IcnpOi,
    IcnpBlockers,
}

fn assign_rule_buckets(filters: &[Filter], chains: &[Vec<Support>]) -> Vec<Vec<usize>> {
    let mut support_to_chain: HashMap<Support, usize> = HashMap::new();
    for (chain_id, chain) in chains.iter().enumerate() {
        for support in chain {
            support_to_chain.insert(support.clone(), chain_id);
        }
    }
    let mut buckets = vec![Vec::new(); chains.len()];
    for (i, f) in filters.iter().enumerate() {
        let support = to_support(f);
        let chain_id = *support_to_chain
            .get(&support)
            .expect("every rule's support must appear in the partition it was built from");
        buckets[chain_id].push(i);
    }
    buckets
}

fn unique_supports_and_weights(filters: &[Filter]) -> (Vec<Support>, Vec<u64>) {
    select_unique_and_weigh(&to_supports(filters))
}

/// Minimum chain partition (C5) of a single rule table. `None` for an empty
/// table.
pub fn min_chain_partition(filters: &[Filter]) -> Option<ChainPartitionResult> {
    if filters.is_empty() {
        return None;
    }
    let unique = select_unique(to_supports(filters));
    let chains = matching::min_chain_partition(&unique);
    let rule_buckets = assign_rule_buckets(filters, &chains);
    Some(ChainPartitionResult { chains, rule_buckets })
}

/// Bounded chain partition (C7): caps the total number of chains across all
/// tables at `max_num_chains`, minimizing total chain-head weight. Zero
/// tables is not an error: the result is simply empty. `Err(TcamError::EmptyInput)`
/// if any individual table is empty.
pub fn min_bounded_chain_partition(tables: &[Vec<Filter>], max_num_chains: usize) -> Result<Vec<ChainPartitionResult>> {
    if tables.iter().any(|t| t.is_empty()) {
        return Err(TcamError::EmptyInput);
    }
    let per_group: Vec<(Vec<Support>, Vec<u64>)> = tables.iter().map(|filters| unique_supports_and_weights(filters)).collect();
    let groups: Vec<Vec<Support>> = per_group.iter().map(|(s, _)| s.clone()).collect();
    let weights: Vec<Vec<u64>> = per_group.iter().map(|(_, w)| w.clone()).collect();

    let group_chains = flow::min_bounded_chain_partition(&groups, &weights, max_num_chains);

    Ok(tables
        .iter()
        .zip(group_chains)
        .map(|(filters, chains)| {
            let rule_buckets = assign_rule_buckets(filters, &chains);
            ChainPartitionResult { chains, rule_buckets }
        })
        .collect())
}

/// Expansion-augmented chain partition (C8+C5): reduces the number of unique
/// supports per table under a global memory budget (promoting care-bits to
/// don't-care where it pays off), then chain-partitions the result. `Ok(None)`
/// if `tables` is empty. `Err(TcamError::EmptyInput)` if `tables` is
/// non-empty but any individual table is empty. A negative `max_memory` is
/// treated as a budget of zero.
pub fn min_chain_partition_with_expansion(tables: &[Vec<Filter>], max_memory: i64) -> Result<Option<Vec<ExpandedPartitionResult>>> {
    if tables.is_empty() {
        return Ok(None);
    }
    if tables.iter().any(|t| t.is_empty()) {
        return Err(TcamError::EmptyInput);
    }
    let per_group: Vec<(Vec<Support>, Vec<u64>)> = tables.iter().map(|filters| unique_supports_and_weights(filters)).collect();
    let groups: Vec<Vec<Support>> = per_group.iter().map(|(s, _)| s.clone()).collect();
    let weights: Vec<Vec<u64>> = per_group.iter().map(|(_, w)| w.clone()).collect();

    let max_memory = max_memory.max(0) as u64;
    let ExpansionResult { supports, expansion_maps } = expansion::min_chain_partition_with_expansion(&groups, &weights, max_memory);

    let mut results = Vec::with_capacity(tables.len());
    for (filters, (group_supports, expansion_map)) in tables.iter().zip(supports.iter().zip(expansion_maps.iter())) {
        let chains = matching::min_chain_partition(group_supports);

        let mut support_to_chain: HashMap<Support, usize> = HashMap::new();
        for (chain_id, chain) in chains.iter().enumerate() {
            for s in chain {
                support_to_chain.insert(s.clone(), chain_id);
            }
        }

        let mut rule_buckets = vec![Vec::new(); chains.len()];
        let mut rule_expanded_support = Vec::with_capacity(filters.len());
        for (i, f) in filters.iter().enumerate() {
            let original = to_support(f);
            let expanded = expansion_map
                .get(&original)
                .expect("every original support must be present in its group's expansion map")
                .clone();
            let chain_id = *support_to_chain
                .get(&expanded)
                .expect("every expanded support must appear in the partition built from it");
            rule_buckets[chain_id].push(i);
            rule_expanded_support.push(expanded);
        }

        results.push(ExpandedPartitionResult { chains, rule_buckets, rule_expanded_support });
    }
    Ok(Some(results))
}

/// Width reduction (C3+C4): picks `l` bit columns via `algo` and returns
/// them along with the surviving rule indices.
pub fn best_subgroup(filters: &[Filter], l: u32, only_exact: bool, algo: BitSelectionAlgorithm) -> Result<(Vec<u32>, Vec<usize>)> {
    if filters.is_empty() {
        return Err(TcamError::EmptyInput);
    }
    Ok(match algo {
        BitSelectionAlgorithm::MinSimilarity => {
            let bits = heuristics::best_min_similarity_bits(filters, l);
            let indices = find_maximal_oi_subset(filters, &bits);
            (bits, indices)
        }
        BitSelectionAlgorithm::IcnpOi => heuristics::best_to_stay_minme(filters, l, MinMeMode::MaxOi, only_exact),
        BitSelectionAlgorithm::IcnpBlockers => heuristics::best_to_stay_minme(filters, l, MinMeMode::Blockers, only_exact),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn single_chain_scenario_buckets_every_rule() {
        let filters = vec![f("**00"), f("*100"), f("1100")];
        let result = min_chain_partition(&filters).unwrap();
        assert_eq!(result.chains.len(), 1);
        let mut all_indices: Vec<usize> = result.rule_buckets.into_iter().flatten().collect();
        all_indices.sort();
        assert_eq!(all_indices, vec![0, 1, 2]);
    }

    #[test]
    fn antichain_scenario_makes_two_chains() {
        let filters = vec![f("1*00"), f("*100")];
        let result = min_chain_partition(&filters).unwrap();
        assert_eq!(result.chains.len(), 2);
    }

    #[test]
    fn empty_table_returns_none() {
        assert!(min_chain_partition(&[]).is_none());
    }

    #[test]
    fn bounded_partition_forces_two_heads() {
        let filters = vec![f("1*00"), f("*100")];
        let result = min_bounded_chain_partition(&[filters], 1).unwrap();
        assert_eq!(result[0].chains.len(), 2);
    }

    #[test]
    fn bounded_partition_with_zero_tables_is_empty_not_an_error() {
        let result = min_bounded_chain_partition(&[], 1).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn bounded_partition_rejects_an_empty_inner_table() {
        let filters = vec![f("1*00"), f("*100")];
        assert!(matches!(min_bounded_chain_partition(&[filters, vec![]], 1), Err(TcamError::EmptyInput)));
    }

    #[test]
    fn expansion_merges_and_buckets_both_rules_together() {
        let filters = vec![f("1*0"), f("*10")];
        let result = min_chain_partition_with_expansion(&[filters], 4).unwrap().unwrap();
        assert_eq!(result[0].chains.len(), 1);
        assert_eq!(result[0].rule_buckets[0].len(), 2);
        assert_eq!(result[0].rule_expanded_support[0], result[0].rule_expanded_support[1]);
    }

    #[test]
    fn expansion_with_zero_tables_returns_ok_none() {
        assert!(min_chain_partition_with_expansion(&[], 4).unwrap().is_none());
    }

    #[test]
    fn expansion_rejects_an_empty_inner_table() {
        let filters = vec![f("1*0"), f("*10")];
        assert!(matches!(min_chain_partition_with_expansion(&[filters, vec![]], 4), Err(TcamError::EmptyInput)));
    }

    #[test]
    fn best_subgroup_rejects_an_empty_table() {
        assert!(matches!(best_subgroup(&[], 2, false, BitSelectionAlgorithm::MinSimilarity), Err(TcamError::EmptyInput)));
    }

    #[test]
    fn best_subgroup_min_similarity_returns_oi_survivors() {
        let filters = vec![f("1100"), f("1010"), f("0110")];
        let (bits, survivors) = best_subgroup(&filters, 2, false, BitSelectionAlgorithm::MinSimilarity).unwrap();
        assert_eq!(bits.len(), 2);
        assert!(!survivors.is_empty());
    }
}
