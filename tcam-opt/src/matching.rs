//! Maximum bipartite matching over the strict-subset relation (C5), and the
//! chain reconstruction shared by the unbounded and bounded partitioners.

use tcam_filter::{is_subset, Support};

/// Sentinel meaning "no mate", analogous to the null vertex descriptor the
/// original's matching/flow libraries use.
pub const NONE: usize = usize::MAX;

/// Builds the `(i, j)` pairs with `ss[i] ⊊ ss[j]` (the Dilworth subset-DAG
/// edges), in increasing `i` then `j` order.
pub fn subset_edges(ss: &[Support]) -> Vec<(usize, usize)> {
    let mut edges = Vec::new();
    for i in 0..ss.len() {
        for j in 0..ss.len() {
            if i != j && ss[i] != ss[j] && is_subset(&ss[i], &ss[j]) {
                edges.push((i, j));
            }
        }
    }
    edges
}

/// Maximum-cardinality matching on the bipartite graph with left/right
/// copies of `0..n` and edges `left i -> right j` for each `(i, j)` in
/// `edges`, via Kuhn's augmenting-path algorithm. Returns `mate_left[i]` and
/// `mate_right[j]` (both `NONE` when unmatched).
pub fn max_bipartite_matching(n: usize, edges: &[(usize, usize)]) -> (Vec<usize>, Vec<usize>) {
    let mut adj = vec![Vec::new(); n];
    for &(i, j) in edges {
        adj[i].push(j);
    }

    let mut mate_left = vec![NONE; n];
    let mut mate_right = vec![NONE; n];

    fn try_augment(u: usize, adj: &[Vec<usize>], mate_right: &mut [usize], visited: &mut [bool]) -> bool {
        for &v in &adj[u] {
            if visited[v] {
                continue;
            }
            visited[v] = true;
            if mate_right[v] == NONE || try_augment(mate_right[v], adj, mate_right, visited) {
                mate_right[v] = u;
                return true;
            }
        }
        false
    }

    for u in 0..n {
        let mut visited = vec![false; n];
        try_augment(u, &adj, &mut mate_right, &mut visited);
    }

    // mate_left is derived from the final mate_right so the two stay
    // consistent (mate_right keeps getting reassigned across augmentations).
    mate_left.fill(NONE);
    for v in 0..n {
        if mate_right[v] != NONE {
            mate_left[mate_right[v]] = v;
        }
    }

    (mate_left, mate_right)
}

/// Reconstructs chains from a matching: a left vertex `i` is a chain start
/// iff no vertex's mate is `i`; each chain then walks `i -> mate_left[i] ->
/// mate_left[mate_left[i]] -> ...` until the current vertex is unmatched.
/// Produces `ss.len() - matching_size` chains covering every support exactly
/// once.
pub fn chains_from_matching(ss: &[Support], mate_left: &[usize]) -> Vec<Vec<Support>> {
    let n = ss.len();
    let mut is_chain_start = vec![true; n];
    for &m in mate_left {
        if m != NONE {
            is_chain_start[m] = false;
        }
    }

    let mut result = Vec::new();
    for i in 0..n {
        if !is_chain_start[i] {
            continue;
        }
        let mut chain = Vec::new();
        let mut cur = i;
        loop {
            chain.push(ss[cur].clone());
            if mate_left[cur] == NONE {
                break;
            }
            cur = mate_left[cur];
        }
        result.push(chain);
    }
    result
}

/// Unbounded minimum chain partition (C5): builds the subset-DAG, runs
/// maximum bipartite matching, and reconstructs chains. Returns an empty
/// vector for an empty `ss`.
pub fn min_chain_partition(ss: &[Support]) -> Vec<Vec<Support>> {
    if ss.is_empty() {
        return Vec::new();
    }
    let edges = subset_edges(ss);
    let (mate_left, _mate_right) = max_bipartite_matching(ss.len(), &edges);
    chains_from_matching(ss, &mate_left)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_chain_of_three() {
        let ss = vec![vec![2, 3], vec![1, 2, 3], vec![0, 1, 2, 3]];
        let chains = min_chain_partition(&ss);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0], ss);
    }

    #[test]
    fn antichain_of_two_singleton_chains() {
        let ss = vec![vec![0, 2, 3], vec![1, 2, 3]];
        let chains = min_chain_partition(&ss);
        assert_eq!(chains.len(), 2);
    }

    #[test]
    fn every_support_appears_exactly_once() {
        let ss = vec![vec![0], vec![0, 1], vec![2], vec![2, 3], vec![0, 1, 4]];
        let chains = min_chain_partition(&ss);
        let mut all: Vec<Support> = chains.into_iter().flatten().collect();
        all.sort();
        let mut expected = ss.clone();
        expected.sort();
        assert_eq!(all, expected);
    }

    #[test]
    fn chain_size_matches_dilworth_bound() {
        let ss = vec![vec![0], vec![0, 1], vec![2], vec![2, 3]];
        let edges = subset_edges(&ss);
        let (mate_left, _) = max_bipartite_matching(ss.len(), &edges);
        let matching_size = mate_left.iter().filter(|&&m| m != NONE).count();
        let chains = min_chain_partition(&ss);
        assert_eq!(chains.len(), ss.len() - matching_size);
    }

    #[test]
    fn empty_input_yields_empty_partition() {
        assert!(min_chain_partition(&[]).is_empty());
    }
}
