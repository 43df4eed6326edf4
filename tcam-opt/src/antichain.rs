//! Maximum antichain extraction via König's theorem applied to Dilworth's
//! theorem (C6): reverse the matched edges, add a super-source connected to
//! every unmatched left vertex, and BFS; a support is in the antichain iff
//! its left copy is reachable but its right copy is not.

use crate::matching::{max_bipartite_matching, subset_edges, NONE};
use std::collections::VecDeque;
use tcam_filter::Support;

/// Indices (into `ss`) of a maximum antichain of `ss` under strict subset.
/// Its size equals the number of chains `min_chain_partition(ss)` returns.
pub fn max_antichain(ss: &[Support]) -> Vec<usize> {
    if ss.is_empty() {
        return Vec::new();
    }
    let n = ss.len();
    let edges = subset_edges(ss);
    let (mate_left, _mate_right) = max_bipartite_matching(n, &edges);

    let source = 2 * n;
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); 2 * n + 1];
    for &(i, j) in &edges {
        if mate_left[i] == j {
            adj[n + j].push(i); // matched edge, reversed
        } else {
            adj[i].push(n + j);
        }
    }
    for i in 0..n {
        if mate_left[i] == NONE {
            adj[source].push(i);
        }
    }

    let mut dist = vec![usize::MAX; 2 * n + 1];
    dist[source] = 0;
    let mut queue = VecDeque::from([source]);
    while let Some(u) = queue.pop_front() {
        for &v in &adj[u] {
            if dist[v] == usize::MAX {
                dist[v] = dist[u] + 1;
                queue.push_back(v);
            }
        }
    }

    let result: Vec<usize> = (0..n).filter(|&i| dist[i] != usize::MAX && dist[i] > 0 && dist[n + i] == usize::MAX).collect();

    let matching_size = mate_left.iter().filter(|&&m| m != NONE).count();
    log::info!(
        "for a set of size {n} with a chain cover of size {} an antichain of size {} was found",
        n - matching_size,
        result.len()
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::min_chain_partition;

    #[test]
    fn antichain_size_matches_chain_count() {
        let ss = vec![vec![0, 2, 3], vec![1, 2, 3]];
        let ac = max_antichain(&ss);
        assert_eq!(ac.len(), 2);
        assert_eq!(ac.len(), min_chain_partition(&ss).len());
    }

    #[test]
    fn single_chain_has_singleton_antichain() {
        let ss = vec![vec![2, 3], vec![1, 2, 3], vec![0, 1, 2, 3]];
        let ac = max_antichain(&ss);
        assert_eq!(ac.len(), 1);
    }

    #[test]
    fn antichain_members_are_pairwise_incomparable() {
        let ss = vec![vec![0], vec![0, 1], vec![2], vec![2, 3], vec![5]];
        let ac = max_antichain(&ss);
        for &i in &ac {
            for &j in &ac {
                if i != j {
                    assert!(!tcam_filter::is_subset(&ss[i], &ss[j]));
                }
            }
        }
    }
}
