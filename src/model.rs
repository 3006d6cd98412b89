//! The typed node/edge graph (C1): six node variants with typed edges and
//! per-node indexed edge slots, per §3.

use std::sync::Arc;

use slotmap::new_key_type;

use crate::date::GedcomDate;
use crate::record::{FamilyRecord, IndividualRecord, NoteRecord, RepositoryRecord, SourceRecord, Xref};

new_key_type! {
    /// A contiguous, 32-bit-backed internal node identifier, assigned by
    /// the graph at node creation. Not stable across rebuilds (§3).
    pub struct NodeId;
}

new_key_type! {
    /// A stable identifier for an edge, assigned at edge creation.
    pub struct EdgeId;
}

/// The six node variants a graph can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Holds an [`IndividualRecord`].
    Individual,
    /// Holds a [`FamilyRecord`].
    Family,
    /// Holds a [`NoteRecord`].
    Note,
    /// Holds a [`SourceRecord`].
    Source,
    /// Holds a [`RepositoryRecord`].
    Repository,
    /// Synthesized; no source record of its own.
    Event,
}

/// The directed, typed edge kinds in the graph (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeType {
    /// Individual -> Family: "family as child".
    Famc,
    /// Individual -> Family: "family as spouse".
    Fams,
    /// Family -> Individual: husband.
    Husb,
    /// Family -> Individual: wife.
    Wife,
    /// Family -> Individual: child.
    Chil,
    /// Owner -> Note.
    NoteRef,
    /// Owner -> Source.
    SourceRef,
    /// Source -> Repository.
    RepoRef,
    /// Event -> owning Individual/Family.
    EventOf,
}

/// A directed, typed edge. Both endpoints are owning nodes' internal ids.
#[derive(Debug, Clone, Copy)]
pub struct EdgeData {
    /// This edge's stable id.
    pub id: EdgeId,
    /// The edge's type tag.
    pub edge_type: EdgeType,
    /// The edge's source node.
    pub source: NodeId,
    /// The edge's target node.
    pub target: NodeId,
}

/// Incoming and outgoing adjacency shared by every node variant.
///
/// Every edge appears in both endpoints' adjacency lists: incoming on the
/// target, outgoing on the source (§3).
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    /// Edges for which this node is the target.
    pub incoming: Vec<EdgeId>,
    /// Edges for which this node is the source.
    pub outgoing: Vec<EdgeId>,
}

/// An `Individual` node.
#[derive(Debug, Clone)]
pub struct IndividualNode {
    /// Internal id.
    pub id: NodeId,
    /// `xref` of the underlying record.
    pub xref: Xref,
    /// The source record, shared immutably with the upstream tree.
    pub record: Arc<IndividualRecord>,
    /// Outgoing `FAMC` edges (families in which this individual is a
    /// child), in document order.
    pub famc_edges: Vec<EdgeId>,
    /// Outgoing `FAMS` edges (families in which this individual is a
    /// spouse), in document order.
    pub fams_edges: Vec<EdgeId>,
    /// Cached direct parents — the union of husband/wife across
    /// `famc_edges`, de-duplicated (§3 invariant 4).
    pub parents: Vec<NodeId>,
    /// Generic adjacency (includes `NOTE_REF`/`SOURCE_REF` outgoing edges
    /// and any incoming edges, e.g. none for individuals today, but kept
    /// uniform across variants).
    pub adjacency: Adjacency,
}

/// A `Family` node.
#[derive(Debug, Clone)]
pub struct FamilyNode {
    /// Internal id.
    pub id: NodeId,
    /// `xref` of the underlying record.
    pub xref: Xref,
    /// The source record, shared immutably with the upstream tree.
    pub record: Arc<FamilyRecord>,
    /// The `HUSB` edge, if any. Last writer wins if the record names more
    /// than one husband (§4.1).
    pub husband_edge: Option<EdgeId>,
    /// The `WIFE` edge, if any.
    pub wife_edge: Option<EdgeId>,
    /// `CHIL` edges, in document order.
    pub chil_edges: Vec<EdgeId>,
    /// Generic adjacency.
    pub adjacency: Adjacency,
}

/// A `Note` leaf node.
#[derive(Debug, Clone)]
pub struct NoteNode {
    /// Internal id.
    pub id: NodeId,
    /// `xref` of the underlying record.
    pub xref: Xref,
    /// The source record.
    pub record: Arc<NoteRecord>,
    /// Generic adjacency (incoming `NOTE_REF` edges from citing records).
    pub adjacency: Adjacency,
}

/// A `Source` leaf node.
#[derive(Debug, Clone)]
pub struct SourceNode {
    /// Internal id.
    pub id: NodeId,
    /// `xref` of the underlying record.
    pub xref: Xref,
    /// The source record.
    pub record: Arc<SourceRecord>,
    /// Generic adjacency (incoming `SOURCE_REF`, outgoing `REPO_REF`).
    pub adjacency: Adjacency,
}

/// A `Repository` leaf node.
#[derive(Debug, Clone)]
pub struct RepositoryNode {
    /// Internal id.
    pub id: NodeId,
    /// `xref` of the underlying record.
    pub xref: Xref,
    /// The source record.
    pub record: Arc<RepositoryRecord>,
    /// Generic adjacency (incoming `REPO_REF` edges).
    pub adjacency: Adjacency,
}

/// A synthesized `Event` node. Has no source record of its own; identity is
/// `⟨ownerXref⟩_⟨eventTag⟩_⟨indexAmongOwnerEvents⟩` (§3).
#[derive(Debug, Clone)]
pub struct EventNode {
    /// Internal id.
    pub id: NodeId,
    /// The synthesized identity string.
    pub synthetic_id: String,
    /// The owning individual or family's internal id.
    pub owner: NodeId,
    /// The owning individual or family's `xref`.
    pub owner_xref: Xref,
    /// The GEDCOM event tag, e.g. `"BIRT"`.
    pub tag: String,
    /// 0-based position among same-tag events of the same owner, in
    /// document order.
    pub index: usize,
    /// Raw date expression, if present.
    pub date_raw: Option<String>,
    /// Parsed date expression, if `date_raw` was parseable.
    pub date: Option<GedcomDate>,
    /// Free-text place, if present.
    pub place: Option<String>,
    /// Generic adjacency (outgoing `EVENT_OF` edge to the owner).
    pub adjacency: Adjacency,
}

/// A node in the graph: one of the six variants above.
///
/// Modeled as a sealed enum rather than a trait object — relationship
/// operations narrow to `Individual`/`Family` with a `match`, per §9's
/// "runtime tests use type discrimination when narrowing".
#[derive(Debug, Clone)]
pub enum Node {
    /// See [`IndividualNode`].
    Individual(IndividualNode),
    /// See [`FamilyNode`].
    Family(FamilyNode),
    /// See [`NoteNode`].
    Note(NoteNode),
    /// See [`SourceNode`].
    Source(SourceNode),
    /// See [`RepositoryNode`].
    Repository(RepositoryNode),
    /// See [`EventNode`].
    Event(EventNode),
}

impl Node {
    /// This node's internal id.
    pub fn id(&self) -> NodeId {
        match self {
            Node::Individual(n) => n.id,
            Node::Family(n) => n.id,
            Node::Note(n) => n.id,
            Node::Source(n) => n.id,
            Node::Repository(n) => n.id,
            Node::Event(n) => n.id,
        }
    }

    /// This node's variant tag.
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Individual(_) => NodeType::Individual,
            Node::Family(_) => NodeType::Family,
            Node::Note(_) => NodeType::Note,
            Node::Source(_) => NodeType::Source,
            Node::Repository(_) => NodeType::Repository,
            Node::Event(_) => NodeType::Event,
        }
    }

    /// This node's `xref`, for record-backed variants. `Event` nodes have
    /// no `xref` of their own; use [`EventNode::owner_xref`] instead.
    pub fn xref(&self) -> Option<&str> {
        match self {
            Node::Individual(n) => Some(&n.xref),
            Node::Family(n) => Some(&n.xref),
            Node::Note(n) => Some(&n.xref),
            Node::Source(n) => Some(&n.xref),
            Node::Repository(n) => Some(&n.xref),
            Node::Event(_) => None,
        }
    }

    /// Generic adjacency shared by all node variants.
    pub fn adjacency(&self) -> &Adjacency {
        match self {
            Node::Individual(n) => &n.adjacency,
            Node::Family(n) => &n.adjacency,
            Node::Note(n) => &n.adjacency,
            Node::Source(n) => &n.adjacency,
            Node::Repository(n) => &n.adjacency,
            Node::Event(n) => &n.adjacency,
        }
    }

    pub(crate) fn adjacency_mut(&mut self) -> &mut Adjacency {
        match self {
            Node::Individual(n) => &mut n.adjacency,
            Node::Family(n) => &mut n.adjacency,
            Node::Note(n) => &mut n.adjacency,
            Node::Source(n) => &mut n.adjacency,
            Node::Repository(n) => &mut n.adjacency,
            Node::Event(n) => &mut n.adjacency,
        }
    }

    /// Degree (total incoming + outgoing edge count), per §9's shared
    /// capability set.
    pub fn degree(&self) -> usize {
        let adj = self.adjacency();
        adj.incoming.len() + adj.outgoing.len()
    }

    /// Narrow to an [`IndividualNode`], if this is one.
    pub fn as_individual(&self) -> Option<&IndividualNode> {
        match self {
            Node::Individual(n) => Some(n),
            _ => None,
        }
    }

    /// Narrow to a [`FamilyNode`], if this is one.
    pub fn as_family(&self) -> Option<&FamilyNode> {
        match self {
            Node::Family(n) => Some(n),
            _ => None,
        }
    }

    /// Narrow to an [`EventNode`], if this is one.
    pub fn as_event(&self) -> Option<&EventNode> {
        match self {
            Node::Event(n) => Some(n),
            _ => None,
        }
    }

    pub(crate) fn as_individual_mut(&mut self) -> Option<&mut IndividualNode> {
        match self {
            Node::Individual(n) => Some(n),
            _ => None,
        }
    }

    pub(crate) fn as_family_mut(&mut self) -> Option<&mut FamilyNode> {
        match self {
            Node::Family(n) => Some(n),
            _ => None,
        }
    }
}
