//! The fluent query surface (§6): `QueryBuilder` → `IndividualQuery` →
//! `AncestorQuery`/`DescendantQuery`, plus `FilterQuery` entry points.
//!
//! This module wires C4 (relationship helpers), C5 (traversal), C7
//! (events), C8 (path finder) and C9 (cache) together; it holds no
//! algorithmic logic of its own.

use crate::cache::{cache_key, CacheValue};
use crate::events;
use crate::filter::FilterQuery;
use crate::graph::Graph;
use crate::model::{EdgeId, EventNode, IndividualNode, NodeId};
use crate::pathfinder;
use crate::relationship;
use crate::traversal::{self, Direction, TraversalOrder};

/// Entry point for the fluent query surface over a single [`Graph`].
pub struct QueryBuilder<'g> {
    graph: &'g Graph,
}

impl<'g> QueryBuilder<'g> {
    /// Wrap a graph for fluent querying.
    pub fn new(graph: &'g Graph) -> Self {
        Self { graph }
    }

    /// Start a query rooted at a single individual, or `None` if `xref`
    /// does not resolve.
    pub fn individual(&self, xref: &str) -> Option<IndividualQuery<'g>> {
        self.graph.get_individual(xref).map(|indi| IndividualQuery { graph: self.graph, indi })
    }

    /// A [`FilterQuery`] seeded over every Individual in the graph.
    pub fn all_individuals(&self) -> FilterQuery<'g> {
        FilterQuery::new(self.graph)
    }

    /// Equivalent to [`QueryBuilder::all_individuals`] — the `Filter()` root
    /// named in §6's operation table.
    pub fn filter(&self) -> FilterQuery<'g> {
        FilterQuery::new(self.graph)
    }
}

/// A query rooted at one resolved individual.
pub struct IndividualQuery<'g> {
    graph: &'g Graph,
    indi: &'g IndividualNode,
}

impl<'g> IndividualQuery<'g> {
    /// Direct parents (§4.2).
    pub fn parents(&self) -> Vec<&'g IndividualNode> {
        relationship::parents(self.graph, self.indi)
    }

    /// All children across every family this individual is a spouse in.
    pub fn children(&self) -> Vec<&'g IndividualNode> {
        relationship::children(self.graph, self.indi)
    }

    /// All spouses.
    pub fn spouses(&self) -> Vec<&'g IndividualNode> {
        relationship::spouses(self.graph, self.indi)
    }

    /// All siblings.
    pub fn siblings(&self) -> Vec<&'g IndividualNode> {
        relationship::siblings(self.graph, self.indi)
    }

    /// Events this individual owns, in document order, via their
    /// `EVENT_OF` incoming edges.
    pub fn get_events(&self) -> Vec<&'g EventNode> {
        self.indi
            .adjacency
            .incoming
            .iter()
            .filter_map(|&edge_id| self.graph.edge(edge_id))
            .filter_map(|edge| self.graph.node(edge.source))
            .filter_map(crate::model::Node::as_event)
            .collect()
    }

    /// Start an ancestor traversal from this individual.
    pub fn ancestors(&self) -> GenerationQuery<'g> {
        GenerationQuery::new(self.graph, self.indi.id, Direction::Ancestors)
    }

    /// Start a descendant traversal from this individual.
    pub fn descendants(&self) -> GenerationQuery<'g> {
        GenerationQuery::new(self.graph, self.indi.id, Direction::Descendants)
    }

    /// Shortest path to another individual, or `None` if `xref` doesn't
    /// resolve or the two are in disconnected components (§4.6).
    pub fn path_to(&self, xref: &str) -> Option<Vec<(NodeId, Option<EdgeId>)>> {
        let target = self.graph.get_individual(xref)?.id;
        pathfinder::shortest_path(self.graph, self.indi.id, target)
    }
}

/// A bounded ancestor or descendant traversal under construction. Used as
/// both `AncestorQuery` and `DescendantQuery` in §6's operation table — the
/// two share an identical shape, differing only in the direction fixed by
/// [`IndividualQuery::ancestors`]/[`IndividualQuery::descendants`].
pub struct GenerationQuery<'g> {
    graph: &'g Graph,
    start: NodeId,
    direction: Direction,
    max_generations: usize,
    include_self: bool,
    filter: Option<Box<dyn Fn(&IndividualNode) -> bool + 'g>>,
    order: TraversalOrder,
}

impl<'g> GenerationQuery<'g> {
    fn new(graph: &'g Graph, start: NodeId, direction: Direction) -> Self {
        Self { graph, start, direction, max_generations: 0, include_self: false, filter: None, order: TraversalOrder::Bfs }
    }

    /// Bound traversal depth. `0` (the default) means unlimited.
    pub fn max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Include the starting individual itself, at depth 0.
    pub fn include_self(mut self) -> Self {
        self.include_self = true;
        self
    }

    /// Visit order; does not affect the final result set (§4.3).
    pub fn order(mut self, order: TraversalOrder) -> Self {
        self.order = order;
        self
    }

    /// Restrict the result to individuals matching `predicate`. A query
    /// carrying a custom predicate bypasses the cache (§4.7) — closures
    /// aren't representable as a stable cache-key argument.
    pub fn filter(mut self, predicate: impl Fn(&IndividualNode) -> bool + 'g) -> Self {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn run(&self) -> Vec<traversal::Visited> {
        let accept_all = |_: &IndividualNode| true;
        let filter: &dyn Fn(&IndividualNode) -> bool = self.filter.as_deref().unwrap_or(&accept_all);
        traversal::traverse(self.graph, self.start, self.direction, self.max_generations, self.include_self, self.order, filter)
    }

    fn cache_key(&self, op: &str) -> String {
        let start_xref = self.graph.xref_of(self.start).unwrap_or("");
        cache_key(
            op,
            &[
                start_xref,
                &self.max_generations.to_string(),
                &self.include_self.to_string(),
                &format!("{:?}", self.order),
            ],
        )
    }

    /// The matched individuals, in traversal order.
    pub fn execute(&self) -> Vec<&'g IndividualNode> {
        if self.filter.is_none() {
            let key = self.cache_key(match self.direction {
                Direction::Ancestors => "ancestors",
                Direction::Descendants => "descendants",
            });
            if let Some(CacheValue::NodeIds(ids)) = self.graph.cache.lock().unwrap().get(&key) {
                return ids.into_iter().filter_map(|id| self.graph.node(id)).filter_map(crate::model::Node::as_individual).collect();
            }
            let results: Vec<&IndividualNode> = self.run().into_iter().filter_map(|v| self.graph.node(v.node)).filter_map(crate::model::Node::as_individual).collect();
            let ids = results.iter().map(|n| n.id).collect();
            self.graph.cache.lock().unwrap().put(key, CacheValue::NodeIds(ids));
            results
        } else {
            self.run().into_iter().filter_map(|v| self.graph.node(v.node)).filter_map(crate::model::Node::as_individual).collect()
        }
    }

    /// As [`GenerationQuery::execute`], additionally re-deriving a shortest
    /// path from the start to each result (§4.3). Unreconstructable paths
    /// are dropped silently.
    pub fn execute_with_paths(&self) -> Vec<(&'g IndividualNode, Vec<(NodeId, Option<EdgeId>)>)> {
        self.run()
            .into_iter()
            .filter_map(|v| {
                let indi = self.graph.node(v.node).and_then(crate::model::Node::as_individual)?;
                let path = pathfinder::shortest_path(self.graph, self.start, v.node)?;
                Some((indi, path))
            })
            .collect()
    }

    /// Result-set cardinality.
    pub fn count(&self) -> usize {
        if self.filter.is_none() {
            let key = self.cache_key(match self.direction {
                Direction::Ancestors => "ancestors_count",
                Direction::Descendants => "descendants_count",
            });
            if let Some(CacheValue::Count(n)) = self.graph.cache.lock().unwrap().get(&key) {
                return n;
            }
            let n = self.run().len();
            self.graph.cache.lock().unwrap().put(key, CacheValue::Count(n));
            n
        } else {
            self.run().len()
        }
    }

    /// `Count() > 0`.
    pub fn exists(&self) -> bool {
        self.count() > 0
    }
}

/// Re-exported for callers who want direct function access without going
/// through [`QueryBuilder`]/[`Graph`].
pub use events::{get_events_on_date, get_events_on_date_by_type, get_records_for_event};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BuildOptions, Builder};
    use crate::test_fixtures::family_of_three;

    #[test]
    fn scenario_1_via_fluent_surface() {
        let tree = family_of_three();
        let graph = Builder::new(BuildOptions::default()).build(&tree);
        let q = QueryBuilder::new(&graph);

        assert_eq!(q.individual("@I2@").unwrap().ancestors().count(), 2);
        assert_eq!(q.individual("@I1@").unwrap().ancestors().count(), 0);
        assert_eq!(q.individual("@I1@").unwrap().descendants().count(), 0);
        assert_eq!(q.individual("@I3@").unwrap().descendants().count(), 1);
    }

    #[test]
    fn unknown_xref_yields_none_root() {
        let tree = family_of_three();
        let graph = Builder::new(BuildOptions::default()).build(&tree);
        assert!(QueryBuilder::new(&graph).individual("@I999@").is_none());
    }

    #[test]
    fn path_to_via_fluent_surface() {
        let tree = family_of_three();
        let graph = Builder::new(BuildOptions::default()).build(&tree);
        let q = QueryBuilder::new(&graph);
        let path = q.individual("@I2@").unwrap().path_to("@I3@").unwrap();
        assert_eq!(path.last().unwrap().0, graph.get_individual("@I3@").unwrap().id);
    }

    #[test]
    fn ancestor_count_is_cached_and_consistent() {
        let tree = family_of_three();
        let graph = Builder::new(BuildOptions::default()).build(&tree);
        let q = QueryBuilder::new(&graph);
        let first = q.individual("@I2@").unwrap().ancestors().count();
        let second = q.individual("@I2@").unwrap().ancestors().count();
        assert_eq!(first, second);
        assert!(!graph.cache.lock().unwrap().is_empty());
    }
}
