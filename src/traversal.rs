//! Ancestor/Descendant traversal (C5): bounded BFS/DFS with a visited set
//! and optional path reconstruction, per §4.3.

use std::collections::VecDeque;

use fxhash::FxHashSet;

use crate::graph::Graph;
use crate::model::{IndividualNode, NodeId};
use crate::relationship;

/// Visit order. Affects only the order nodes are discovered in, never the
/// final result set (§4.3, §8 invariant "MaxGenerations(k) result depth <=
/// k; result subseteq unlimited result").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOrder {
    /// Level-synchronous (breadth-first).
    Bfs,
    /// Depth-first.
    Dfs,
}

/// Which direction to walk the family graph in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Walk towards parents, via the cached `parents` slot.
    Ancestors,
    /// Walk towards children, via [`relationship::children`].
    Descendants,
}

/// A single node produced by a traversal, with the depth (generations from
/// the start) at which it was first discovered.
#[derive(Debug, Clone, Copy)]
pub struct Visited {
    /// The individual's internal id.
    pub node: NodeId,
    /// Generations from the traversal's start (0 for the start itself).
    pub depth: usize,
}

/// Run a bounded ancestor/descendant traversal from `start`.
///
/// `max_generations = 0` means unlimited. `filter` subsets which visited
/// individuals are *returned*; it never prunes expansion — every reachable
/// node within `max_generations` is still walked through, only the result
/// set is filtered, matching "filter (predicate over the individual
/// record; default accept-all)" read alongside "MaxGenerations(k) result
/// depth <= k; result subseteq unlimited result" (§4.3, §8).
pub fn traverse(
    graph: &Graph,
    start: NodeId,
    direction: Direction,
    max_generations: usize,
    include_self: bool,
    order: TraversalOrder,
    filter: &dyn Fn(&IndividualNode) -> bool,
) -> Vec<Visited> {
    let mut results = Vec::new();
    let mut visited = FxHashSet::default();
    let mut frontier: VecDeque<(NodeId, usize)> = VecDeque::new();

    visited.insert(start);
    frontier.push_back((start, 0));

    while let Some((node_id, depth)) = match order {
        TraversalOrder::Bfs => frontier.pop_front(),
        TraversalOrder::Dfs => frontier.pop_back(),
    } {
        let Some(indi) = graph.node(node_id).and_then(crate::model::Node::as_individual) else { continue };

        let is_start = depth == 0 && node_id == start;
        if !is_start || include_self {
            if filter(indi) {
                results.push(Visited { node: node_id, depth });
            }
        }

        let expand = max_generations == 0 || depth < max_generations;
        if !expand {
            continue;
        }

        let next: Vec<NodeId> = match direction {
            Direction::Ancestors => relationship::parents(graph, indi).into_iter().map(|p| p.id).collect(),
            Direction::Descendants => relationship::children(graph, indi).into_iter().map(|c| c.id).collect(),
        };
        for next_id in next {
            if visited.insert(next_id) {
                frontier.push_back((next_id, depth + 1));
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BuildOptions, Builder};
    use crate::test_fixtures::family_of_three;

    #[test]
    fn scenario_1_ancestor_descendant_counts() {
        let tree = family_of_three();
        let graph = Builder::new(BuildOptions::default()).build(&tree);

        let i1 = graph.get_individual("@I1@").unwrap().id;
        let i2 = graph.get_individual("@I2@").unwrap().id;
        let i3 = graph.get_individual("@I3@").unwrap().id;

        let accept_all = |_: &IndividualNode| true;

        let ancestors_of_2 = traverse(&graph, i2, Direction::Ancestors, 0, false, TraversalOrder::Bfs, &accept_all);
        assert_eq!(ancestors_of_2.len(), 2);

        let ancestors_of_1 = traverse(&graph, i1, Direction::Ancestors, 0, false, TraversalOrder::Bfs, &accept_all);
        assert_eq!(ancestors_of_1.len(), 0);

        let descendants_of_1 = traverse(&graph, i1, Direction::Descendants, 0, false, TraversalOrder::Bfs, &accept_all);
        assert_eq!(descendants_of_1.len(), 0);

        let descendants_of_3 = traverse(&graph, i3, Direction::Descendants, 0, false, TraversalOrder::Bfs, &accept_all);
        assert_eq!(descendants_of_3.len(), 1);
    }

    #[test]
    fn max_generations_bounds_depth() {
        let tree = family_of_three();
        let graph = Builder::new(BuildOptions::default()).build(&tree);
        let i2 = graph.get_individual("@I2@").unwrap().id;
        let accept_all = |_: &IndividualNode| true;

        let bounded = traverse(&graph, i2, Direction::Ancestors, 1, false, TraversalOrder::Bfs, &accept_all);
        assert_eq!(bounded.len(), 2); // both parents are at depth 1

        let unbounded = traverse(&graph, i2, Direction::Ancestors, 0, false, TraversalOrder::Bfs, &accept_all);
        assert!(bounded.iter().all(|v| unbounded.iter().any(|u| u.node == v.node)));
    }

    #[test]
    fn include_self_adds_start_at_depth_zero() {
        let tree = family_of_three();
        let graph = Builder::new(BuildOptions::default()).build(&tree);
        let i2 = graph.get_individual("@I2@").unwrap().id;
        let accept_all = |_: &IndividualNode| true;

        let with_self = traverse(&graph, i2, Direction::Ancestors, 0, true, TraversalOrder::Bfs, &accept_all);
        assert!(with_self.iter().any(|v| v.node == i2 && v.depth == 0));
        assert_eq!(with_self.len(), 3);
    }
}
