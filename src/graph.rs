//! The graph container (C2): stable `xref`<->internal-id mapping, node/edge
//! registries, and lookup by type, per §3.

use std::collections::HashMap;
use std::sync::Mutex;

use slotmap::SlotMap;

use crate::cache::QueryCache;
use crate::model::{
    EdgeData, EdgeId, FamilyNode, IndividualNode, Node, NodeId, NodeType, NoteNode, RepositoryNode, SourceNode,
};
use crate::record::Xref;

#[cfg(feature = "hybrid")]
use std::sync::Arc;

#[cfg(feature = "hybrid")]
use crate::hybrid::HybridBinding;

/// The materialized, read-only (outside of §4.3's hybrid flag-update pass)
/// graph produced by [`crate::builder::Builder`].
///
/// A `Graph` is safe for concurrent read by multiple reader tasks once
/// built (§5); share it behind an `Arc<Graph>`.
pub struct Graph {
    pub(crate) nodes: SlotMap<NodeId, Node>,
    pub(crate) edges: SlotMap<EdgeId, EdgeData>,

    pub(crate) xref_to_id: HashMap<Xref, NodeId>,
    pub(crate) id_to_xref: HashMap<NodeId, Xref>,
    pub(crate) event_synthetic_to_id: HashMap<String, NodeId>,

    // Document-order listings per node type, populated during the
    // builder's first pass.
    pub(crate) individuals_order: Vec<NodeId>,
    pub(crate) families_order: Vec<NodeId>,
    pub(crate) notes_order: Vec<NodeId>,
    pub(crate) sources_order: Vec<NodeId>,
    pub(crate) repositories_order: Vec<NodeId>,
    pub(crate) events_order: Vec<NodeId>,

    pub(crate) cache: Mutex<QueryCache>,

    #[cfg(feature = "hybrid")]
    pub(crate) hybrid: Option<Arc<HybridBinding>>,

    // Maps the sequential row id assigned during mirror build back to the
    // in-memory `NodeId`, so candidate id sets returned by the relational
    // index can be turned back into individuals without a second xref
    // round-trip.
    #[cfg(feature = "hybrid")]
    pub(crate) hybrid_id_to_node: HashMap<u64, NodeId>,
}

impl Graph {
    pub(crate) fn empty(cache_capacity: isize) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            xref_to_id: HashMap::new(),
            id_to_xref: HashMap::new(),
            event_synthetic_to_id: HashMap::new(),
            individuals_order: Vec::new(),
            families_order: Vec::new(),
            notes_order: Vec::new(),
            sources_order: Vec::new(),
            repositories_order: Vec::new(),
            events_order: Vec::new(),
            cache: Mutex::new(QueryCache::with_capacity(cache_capacity)),
            #[cfg(feature = "hybrid")]
            hybrid: None,
            #[cfg(feature = "hybrid")]
            hybrid_id_to_node: HashMap::new(),
        }
    }

    /// Total number of nodes of all variants (§6 `NodeCount`).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of edges of all variants (§6 `EdgeCount`).
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Resolve an `xref` to its internal node id.
    pub fn id_of(&self, xref: &str) -> Option<NodeId> {
        self.xref_to_id.get(xref).copied()
    }

    /// Resolve an internal node id back to its `xref` (`None` for event
    /// nodes, which have no `xref` of their own).
    pub fn xref_of(&self, id: NodeId) -> Option<&str> {
        self.id_to_xref.get(&id).map(String::as_str)
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub(crate) fn edge(&self, id: EdgeId) -> Option<&EdgeData> {
        self.edges.get(id)
    }

    /// Look up an `Individual` node by `xref` (§6 `GetIndividual`).
    pub fn get_individual(&self, xref: &str) -> Option<&IndividualNode> {
        self.id_of(xref).and_then(|id| self.nodes.get(id)).and_then(Node::as_individual)
    }

    /// Look up a `Family` node by `xref` (§6 `GetFamily`).
    pub fn get_family(&self, xref: &str) -> Option<&FamilyNode> {
        self.id_of(xref).and_then(|id| self.nodes.get(id)).and_then(Node::as_family)
    }

    /// Look up a `Note` node by `xref` (§6 `GetNote`).
    pub fn get_note(&self, xref: &str) -> Option<&NoteNode> {
        match self.id_of(xref).and_then(|id| self.nodes.get(id)) {
            Some(Node::Note(n)) => Some(n),
            _ => None,
        }
    }

    /// Look up a `Source` node by `xref` (§6 `GetSource`).
    pub fn get_source(&self, xref: &str) -> Option<&SourceNode> {
        match self.id_of(xref).and_then(|id| self.nodes.get(id)) {
            Some(Node::Source(n)) => Some(n),
            _ => None,
        }
    }

    /// Look up a `Repository` node by `xref` (§6 `GetRepository`).
    pub fn get_repository(&self, xref: &str) -> Option<&RepositoryNode> {
        match self.id_of(xref).and_then(|id| self.nodes.get(id)) {
            Some(Node::Repository(n)) => Some(n),
            _ => None,
        }
    }

    /// All `Individual` nodes, keyed by `xref`, in document order (§6
    /// `GetAllIndividuals`).
    pub fn get_all_individuals(&self) -> impl Iterator<Item = (&str, &IndividualNode)> + '_ {
        self.individuals_order.iter().filter_map(move |id| match self.nodes.get(*id) {
            Some(Node::Individual(n)) => Some((n.xref.as_str(), n)),
            _ => None,
        })
    }

    /// All `Family` nodes, keyed by `xref`, in document order (§6
    /// `GetAllFamilies`).
    pub fn get_all_families(&self) -> impl Iterator<Item = (&str, &FamilyNode)> + '_ {
        self.families_order.iter().filter_map(move |id| match self.nodes.get(*id) {
            Some(Node::Family(n)) => Some((n.xref.as_str(), n)),
            _ => None,
        })
    }

    /// All `Note` nodes, keyed by `xref`, in document order.
    pub fn get_all_notes(&self) -> impl Iterator<Item = (&str, &NoteNode)> + '_ {
        self.notes_order.iter().filter_map(move |id| match self.nodes.get(*id) {
            Some(Node::Note(n)) => Some((n.xref.as_str(), n)),
            _ => None,
        })
    }

    /// All `Source` nodes, keyed by `xref`, in document order.
    pub fn get_all_sources(&self) -> impl Iterator<Item = (&str, &SourceNode)> + '_ {
        self.sources_order.iter().filter_map(move |id| match self.nodes.get(*id) {
            Some(Node::Source(n)) => Some((n.xref.as_str(), n)),
            _ => None,
        })
    }

    /// All `Repository` nodes, keyed by `xref`, in document order.
    pub fn get_all_repositories(&self) -> impl Iterator<Item = (&str, &RepositoryNode)> + '_ {
        self.repositories_order.iter().filter_map(move |id| match self.nodes.get(*id) {
            Some(Node::Repository(n)) => Some((n.xref.as_str(), n)),
            _ => None,
        })
    }

    /// All nodes of a given variant, in document order. Mostly useful for
    /// [`crate::filter`] and introspection.
    pub fn nodes_of_type(&self, node_type: NodeType) -> impl Iterator<Item = &Node> + '_ {
        let order: &[NodeId] = match node_type {
            NodeType::Individual => &self.individuals_order,
            NodeType::Family => &self.families_order,
            NodeType::Note => &self.notes_order,
            NodeType::Source => &self.sources_order,
            NodeType::Repository => &self.repositories_order,
            NodeType::Event => &self.events_order,
        };
        order.iter().filter_map(move |id| self.nodes.get(*id))
    }

    /// Drop all cached query results (§4.7 `Clear`).
    pub fn clear_cache(&self) {
        self.cache.lock().unwrap().clear();
    }

    /// The hybrid storage mirror bound to this graph, if built in hybrid
    /// mode.
    #[cfg(feature = "hybrid")]
    pub fn hybrid(&self) -> Option<&Arc<HybridBinding>> {
        self.hybrid.as_ref()
    }

    /// Construct a graph with a bound hybrid mirror. Used by
    /// [`crate::builder::Builder`] once the mirror build has committed.
    #[cfg(feature = "hybrid")]
    pub(crate) fn set_hybrid(&mut self, binding: Arc<HybridBinding>, hybrid_id_to_node: HashMap<u64, NodeId>) {
        self.hybrid = Some(binding);
        self.hybrid_id_to_node = hybrid_id_to_node;
    }

    /// Resolve a relational-index row id (as returned by
    /// [`HybridBinding::candidate_ids`]) back to an `Individual` node.
    #[cfg(feature = "hybrid")]
    pub(crate) fn individual_by_hybrid_id(&self, id: u64) -> Option<&IndividualNode> {
        self.hybrid_id_to_node.get(&id).and_then(|&node_id| self.nodes.get(node_id)).and_then(Node::as_individual)
    }
}
