//! Min-cost max-flow (successive shortest augmenting paths) and the bounded
//! chain partition built on top of it (C7).

use crate::matching::chains_from_matching;
use std::collections::{HashMap, VecDeque};
use tcam_filter::{is_subset, Support};

#[derive(Clone, Copy)]
struct Edge {
    to: usize,
    cap: i64,
    cost: i64,
}

/// A min-cost max-flow network with the standard array-of-edges-plus-reverse
/// representation: edge `2k` is forward, `2k+1` is its reverse (zero
/// capacity, negated cost).
struct FlowGraph {
    edges: Vec<Edge>,
    adj: Vec<Vec<usize>>,
}

impl FlowGraph {
    fn new(n: usize) -> Self {
        FlowGraph { edges: Vec::new(), adj: vec![Vec::new(); n] }
    }

    fn add_edge(&mut self, u: usize, v: usize, cap: i64, cost: i64) -> usize {
        let idx = self.edges.len();
        self.edges.push(Edge { to: v, cap, cost });
        self.edges.push(Edge { to: u, cap: 0, cost: -cost });
        self.adj[u].push(idx);
        self.adj[v].push(idx + 1);
        idx
    }

    /// Finds a shortest (by cost) augmenting path from `s` to `t` among edges
    /// with positive residual capacity, via SPFA (Bellman-Ford with a FIFO
    /// queue) -- correct with the negative reverse-edge costs this network
    /// introduces, since it contains no negative cycles.
    fn shortest_path(&self, n: usize, s: usize, t: usize) -> Option<(Vec<i64>, Vec<Option<usize>>)> {
        let mut dist = vec![i64::MAX; n];
        let mut in_queue = vec![false; n];
        let mut prev_edge: Vec<Option<usize>> = vec![None; n];
        dist[s] = 0;
        let mut queue = VecDeque::from([s]);
        in_queue[s] = true;
        while let Some(u) = queue.pop_front() {
            in_queue[u] = false;
            for &ei in &self.adj[u] {
                let e = self.edges[ei];
                if e.cap <= 0 || dist[u] == i64::MAX {
                    continue;
                }
                let nd = dist[u] + e.cost;
                if nd < dist[e.to] {
                    dist[e.to] = nd;
                    prev_edge[e.to] = Some(ei);
                    if !in_queue[e.to] {
                        in_queue[e.to] = true;
                        queue.push_back(e.to);
                    }
                }
            }
        }
        if dist[t] == i64::MAX {
            None
        } else {
            Some((dist, prev_edge))
        }
    }

    /// Pushes maximum flow from `s` to `t`, minimizing total cost. Returns
    /// `(flow, cost)`.
    fn min_cost_max_flow(&mut self, n: usize, s: usize, t: usize) -> (i64, i64) {
        let (mut total_flow, mut total_cost) = (0i64, 0i64);
        while let Some((dist, prev_edge)) = self.shortest_path(n, s, t) {
            let mut bottleneck = i64::MAX;
            let mut v = t;
            while v != s {
                let ei = prev_edge[v].expect("path recorded to t must have a predecessor edge");
                bottleneck = bottleneck.min(self.edges[ei].cap);
                v = self.edges[ei ^ 1].to;
            }
            let mut v = t;
            while v != s {
                let ei = prev_edge[v].expect("path recorded to t must have a predecessor edge");
                self.edges[ei].cap -= bottleneck;
                self.edges[ei ^ 1].cap += bottleneck;
                v = self.edges[ei ^ 1].to;
            }
            total_flow += bottleneck;
            total_cost += bottleneck * dist[t];
        }
        (total_flow, total_cost)
    }
}

/// One group's chain decomposition as produced by [`min_bounded_chain_partition`].
pub type GroupChains = Vec<Vec<Support>>;

/// Bounded chain partition (C7): partitions each of `groups` into chains such
/// that the total number of chains across all groups is at most
/// `max_num_chains`, minimizing the total weight of chain heads. Formulated
/// as a single min-cost max-flow on one graph spanning all groups. Returns
/// the best feasible assignment when `max_num_chains` cannot be met exactly
/// -- infeasibility is not an error (§7).
pub fn min_bounded_chain_partition(groups: &[Vec<Support>], weights: &[Vec<u64>], max_num_chains: usize) -> Vec<GroupChains> {
    let group_sizes: Vec<usize> = groups.iter().map(|g| g.len()).collect();
    let total: usize = group_sizes.iter().sum();
    if total == 0 {
        return groups.iter().map(|_| Vec::new()).collect();
    }

    let mut offsets = Vec::with_capacity(groups.len());
    let mut acc = 0usize;
    for &size in &group_sizes {
        offsets.push(acc);
        acc += size;
    }

    let source = 2 * total;
    let aux_source = 2 * total + 1;
    let target = 2 * total + 2;
    let mut g = FlowGraph::new(2 * total + 3);

    // subset_edge_idx[(left_global, right_global)] -> forward edge index,
    // so saturation can be checked during decoding.
    let mut subset_edge_idx: HashMap<(usize, usize), usize> = HashMap::new();

    for (gi, ss) in groups.iter().enumerate() {
        let off = offsets[gi];
        for i in 0..ss.len() {
            for j in 0..ss.len() {
                if i != j && ss[i] != ss[j] && is_subset(&ss[i], &ss[j]) {
                    let u = off + i;
                    let v = total + off + j;
                    let idx = g.add_edge(u, v, 1, 0);
                    subset_edge_idx.insert((u, v), idx);
                }
            }
            let w = weights[gi][i] as i64;
            g.add_edge(off + i, total + off + i, 1, w);
        }
    }

    for i in 0..total {
        g.add_edge(aux_source, i, 1, 0);
        g.add_edge(total + i, target, 1, 0);
    }
    g.add_edge(source, aux_source, (total as i64 - max_num_chains as i64).max(0), 0);

    g.min_cost_max_flow(2 * total + 3, source, target);

    let mut result = Vec::with_capacity(groups.len());
    for (gi, ss) in groups.iter().enumerate() {
        let off = offsets[gi];
        let n = ss.len();
        let mut mate_left = vec![crate::matching::NONE; n];
        for i in 0..n {
            for j in 0..n {
                if let Some(&idx) = subset_edge_idx.get(&(off + i, total + off + j)) {
                    if g.edges[idx].cap == 0 {
                        mate_left[i] = j;
                    }
                }
            }
        }
        result.push(chains_from_matching(ss, &mate_left));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_group_within_budget_matches_unbounded() {
        let ss = vec![vec![2, 3], vec![1, 2, 3], vec![0, 1, 2, 3]];
        let weights = vec![1, 1, 1];
        let chains = min_bounded_chain_partition(&[ss.clone()], &[weights], 5);
        assert_eq!(chains[0].len(), 1);
    }

    #[test]
    fn antichain_cannot_be_forced_below_two_chains() {
        // two incomparable supports: bounded partition can cap head count but
        // cannot synthesize comparability that isn't there.
        let ss = vec![vec![0, 2, 3], vec![1, 2, 3]];
        let chains = min_bounded_chain_partition(&[ss], &[vec![1, 1]], 1);
        assert_eq!(chains[0].len(), 2);
    }

    #[test]
    fn every_support_appears_exactly_once_across_groups() {
        let ss_a = vec![vec![0], vec![0, 1]];
        let ss_b = vec![vec![2], vec![2, 3], vec![2, 3, 4]];
        let chains = min_bounded_chain_partition(&[ss_a.clone(), ss_b.clone()], &[vec![1, 1], vec![1, 1, 1]], 3);
        let mut all_a: Vec<Support> = chains[0].clone().into_iter().flatten().collect();
        all_a.sort();
        let mut expected_a = ss_a;
        expected_a.sort();
        assert_eq!(all_a, expected_a);

        let mut all_b: Vec<Support> = chains[1].clone().into_iter().flatten().collect();
        all_b.sort();
        let mut expected_b = ss_b;
        expected_b.sort();
        assert_eq!(all_b, expected_b);
    }

    #[test]
    fn low_weight_heads_are_preferred_when_forced() {
        // with cap 1, one of the two incomparable supports must be paid as a
        // head; the cheaper one should be chosen when both being skip-edges
        // is unavoidable. Here weight 1 vs weight 100: total cost should
        // reflect picking the lighter one whenever the flow has a choice.
        let ss = vec![vec![0, 2], vec![1, 2]];
        let chains = min_bounded_chain_partition(&[ss], &[vec![1, 100]], 1);
        assert_eq!(chains[0].len(), 2);
    }
}
