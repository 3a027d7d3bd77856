// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Kahn's algorithm with a stable tie-break.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::hash::Hash;

/// The graph handed to [`topological_sort`] contains at least one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError;

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dependency graph contains a cycle")
    }
}

impl std::error::Error for CycleError {}

/// Orders `nodes` so that every `(parent, child)` edge has the parent first.
///
/// Among nodes that are ready at the same time, the one listed first in
/// `nodes` wins, so the result is deterministic for a given input order.
/// Edges naming unknown nodes are ignored.
pub fn topological_sort<T>(
    nodes: impl IntoIterator<Item = T>,
    edges: impl IntoIterator<Item = (T, T)>,
) -> Result<Vec<T>, CycleError>
where
    T: Copy + Eq + Hash,
{
    let nodes: Vec<T> = nodes.into_iter().collect();
    let position: HashMap<T, usize> = nodes.iter().enumerate().map(|(i, n)| (*n, i)).collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut in_degree = vec![0usize; nodes.len()];
    for (parent, child) in edges {
        if let (Some(&p), Some(&c)) = (position.get(&parent), position.get(&child)) {
            children[p].push(c);
            in_degree[c] += 1;
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(Reverse(index)) = ready.pop() {
        order.push(nodes[index]);
        for &child in &children[index] {
            in_degree[child] -= 1;
            if in_degree[child] == 0 {
                ready.push(Reverse(child));
            }
        }
    }

    if order.len() == nodes.len() {
        Ok(order)
    } else {
        Err(CycleError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_graph_sorts_to_nothing() {
        let order = topological_sort(Vec::<u8>::new(), Vec::new()).unwrap();
        assert!(order.is_empty());
    }

    #[test]
    fn test_parents_come_before_children() {
        let order = topological_sort([4, 3, 2, 1, 0], [(0, 1), (1, 2), (2, 3), (3, 4)]).unwrap();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_independent_nodes_keep_their_listing_order() {
        let order = topological_sort(['c', 'a', 'b'], []).unwrap();
        assert_eq!(order, vec!['c', 'a', 'b']);
    }

    #[test]
    fn test_diamond_is_resolved() {
        // 0 -> {1, 2} -> 3
        let order = topological_sort([0, 1, 2, 3], [(0, 2), (0, 1), (1, 3), (2, 3)]).unwrap();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_cycle_is_reported() {
        let result = topological_sort([0, 1, 2], [(0, 1), (1, 2), (2, 0)]);
        assert_eq!(result, Err(CycleError));
    }

    #[test]
    fn test_unknown_edges_are_ignored() {
        let order = topological_sort([1, 2], [(1, 2), (7, 1)]).unwrap();
        assert_eq!(order, vec![1, 2]);
    }
}
