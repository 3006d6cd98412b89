//! Shortest-path finder (C8): undirected BFS between two individuals over
//! the typed graph, per §4.6.

use std::collections::{HashMap, VecDeque};

use fxhash::FxHashSet;

use crate::graph::Graph;
use crate::model::{EdgeId, NodeId};

/// Find a shortest path from `start` to `goal`, walking every edge
/// undirected (incoming and outgoing alike) regardless of node variant.
///
/// Returns `None` when the two nodes are in disconnected components — not
/// an error (§4.6). The returned sequence starts at `start` with a `None`
/// inbound edge, and each subsequent entry carries the edge that was
/// crossed to reach it.
pub fn shortest_path(graph: &Graph, start: NodeId, goal: NodeId) -> Option<Vec<(NodeId, Option<EdgeId>)>> {
    if start == goal {
        return Some(vec![(start, None)]);
    }

    let mut visited = FxHashSet::default();
    let mut came_from: HashMap<NodeId, (NodeId, EdgeId)> = HashMap::new();
    let mut frontier = VecDeque::new();

    visited.insert(start);
    frontier.push_back(start);

    while let Some(current) = frontier.pop_front() {
        let Some(node) = graph.node(current) else { continue };
        let adjacency = node.adjacency();
        for &edge_id in adjacency.outgoing.iter().chain(adjacency.incoming.iter()) {
            let Some(edge) = graph.edge(edge_id) else { continue };
            let neighbor = if edge.source == current { edge.target } else { edge.source };
            if visited.insert(neighbor) {
                came_from.insert(neighbor, (current, edge_id));
                if neighbor == goal {
                    frontier.clear();
                    break;
                }
                frontier.push_back(neighbor);
            }
        }
    }

    if !visited.contains(&goal) {
        return None;
    }

    let mut path = Vec::new();
    let mut cursor = goal;
    while cursor != start {
        let (prev, edge_id) = came_from[&cursor];
        path.push((cursor, Some(edge_id)));
        cursor = prev;
    }
    path.push((start, None));
    path.reverse();
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BuildOptions, Builder};
    use crate::test_fixtures::family_of_three;

    #[test]
    fn finds_path_through_shared_family() {
        let tree = family_of_three();
        let graph = Builder::new(BuildOptions::default()).build(&tree);
        let i2 = graph.get_individual("@I2@").unwrap().id;
        let i3 = graph.get_individual("@I3@").unwrap().id;

        let path = shortest_path(&graph, i2, i3).expect("connected via F1");
        assert_eq!(path.first().unwrap().0, i2);
        assert_eq!(path.last().unwrap().0, i3);
        // I2 -(CHIL)-> F1 -(HUSB)-> I3: three nodes on the path.
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn disconnected_individuals_have_no_path() {
        let mut tree = family_of_three();
        tree.individuals.push(std::sync::Arc::new(crate::record::IndividualRecord {
            xref: "@I5@".into(),
            name: "Isolated Person".into(),
            ..Default::default()
        }));
        let graph = Builder::new(BuildOptions::default()).build(&tree);
        let i1 = graph.get_individual("@I1@").unwrap().id;
        let i5 = graph.get_individual("@I5@").unwrap().id;

        assert!(shortest_path(&graph, i1, i5).is_none());
    }

    #[test]
    fn self_path_is_single_node() {
        let tree = family_of_three();
        let graph = Builder::new(BuildOptions::default()).build(&tree);
        let i1 = graph.get_individual("@I1@").unwrap().id;
        assert_eq!(shortest_path(&graph, i1, i1), Some(vec![(i1, None)]));
    }
}
