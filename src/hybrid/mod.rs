//! Hybrid storage binding (C10): an optional mirror of the graph into a
//! relational index plus an embedded key-value store, for out-of-core
//! queries over very large trees, per §6 and §9.
//!
//! The in-memory core never names `rusqlite`/`sled` directly — it only
//! depends on the [`RelationalIndex`]/[`KvStore`] trait pair, the same
//! narrow-boundary posture `ankurah-core::storage::StorageEngine` takes
//! towards its own backends.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{GraphError, Result};
use crate::record::Sex;

pub mod sled_kv;
pub mod sqlite_index;

pub use sled_kv::SledKvStore;
pub use sqlite_index::SqliteRelationalIndex;

/// Dataset isolation key (§6 `file_id`). All relational/KV operations are
/// scoped to one `FileId`; two graphs built with different ids never see
/// each other's rows even over identical xref sets (§8 invariant 7).
pub type FileId = String;

/// One row of the `nodes` table (§6 bit-exact schema). Column types mirror
/// the schema directly: booleans as `i64` 0/1, dates as epoch seconds, UTC
/// (`crate::date::to_epoch_seconds`) `i64`, `NULL` (`None`) meaning
/// unknown.
#[derive(Debug, Clone)]
pub struct NodeRow {
    pub id: u64,
    pub xref: String,
    pub node_type: String,
    pub name: Option<String>,
    pub name_lower: Option<String>,
    pub birth_date: Option<i64>,
    pub birth_place: Option<String>,
    pub sex: Option<String>,
    pub has_children: bool,
    pub has_spouse: bool,
    pub living: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// The opaque payload mirrored into the KV store per Individual (§6 "KV
/// store layout" — the wire format itself is unspecified, so this crate
/// picks `serde_json` the way the rest of the retrieval pack serializes
/// small mirror records).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NodeBlob {
    pub xref: String,
    pub name: String,
}

/// The subset of [`crate::filter::FilterQuery`] predicates the relational
/// index can answer directly, per §4.4 "the first indexable predicate
/// consults the store for a candidate id set".
#[derive(Debug, Clone)]
pub enum IndexablePredicate {
    NameLower(String),
    BirthDateRange(i64, i64),
    Sex(Sex),
    HasChildren(bool),
    HasSpouse(bool),
    Living(bool),
}

/// The relational index half of a hybrid mirror (§6's `nodes`/
/// `xref_mapping` tables).
#[async_trait]
pub trait RelationalIndex: Send + Sync {
    /// Begin a transaction scoping the next batch of inserts.
    async fn begin(&self) -> Result<()>;
    /// Insert or replace one `nodes` row.
    async fn insert_node_row(&self, file_id: &FileId, row: NodeRow) -> Result<()>;
    /// Insert one `xref_mapping` row.
    async fn insert_xref_mapping(&self, file_id: &FileId, xref: &str, node_id: u64) -> Result<()>;
    /// Commit the open transaction.
    async fn commit(&self) -> Result<()>;
    /// Roll back the open transaction.
    async fn rollback(&self) -> Result<()>;
    /// Resolve an `xref` to its file-scoped internal id.
    async fn resolve_xref(&self, file_id: &FileId, xref: &str) -> Result<Option<u64>>;
    /// Candidate node ids matching an indexable predicate, per `file_id`.
    async fn candidate_ids(&self, file_id: &FileId, predicate: &IndexablePredicate) -> Result<Vec<u64>>;
}

/// The embedded key-value half of a hybrid mirror. Opaque to callers (§6
/// "KV store layout"): this crate treats values as blobs it wrote itself.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn put_node(&self, file_id: &FileId, id: u64, bytes: Vec<u8>) -> Result<()>;
    async fn get_node(&self, file_id: &FileId, id: u64) -> Result<Option<Vec<u8>>>;
    async fn put_edge(&self, file_id: &FileId, id: u64, bytes: Vec<u8>) -> Result<()>;
    async fn get_edge(&self, file_id: &FileId, id: u64) -> Result<Option<Vec<u8>>>;
}

/// Constructor options for a hybrid-mode build. No config *file* format is
/// in scope — these are code-level options, the same posture
/// [`crate::builder::BuildOptions`] takes.
#[derive(Clone)]
pub struct HybridOptions {
    /// Dataset isolation key for this graph (§6 `file_id`). Required —
    /// building in hybrid mode without one is an [`GraphError::Invalid`].
    pub file_id: FileId,
}

/// A bound hybrid mirror: a relational index and a KV store, both scoped to
/// one [`HybridOptions::file_id`]. Stored on [`crate::graph::Graph`] behind
/// `Arc<HybridBinding>`; the two backends themselves stay behind `Arc<dyn
/// RelationalIndex>`/`Arc<dyn KvStore>` so the graph's read side never names
/// either concretely.
pub struct HybridBinding {
    file_id: FileId,
    relational: Arc<dyn RelationalIndex>,
    kv: Arc<dyn KvStore>,
}

impl HybridBinding {
    pub fn new(file_id: FileId, relational: Arc<dyn RelationalIndex>, kv: Arc<dyn KvStore>) -> Self {
        Self { file_id, relational, kv }
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn relational(&self) -> &Arc<dyn RelationalIndex> {
        &self.relational
    }

    pub fn kv(&self) -> &Arc<dyn KvStore> {
        &self.kv
    }

    /// Candidate ids for an indexable predicate, resolved through the
    /// bound `file_id`.
    pub async fn candidate_ids(&self, predicate: &IndexablePredicate) -> Result<Vec<u64>> {
        self.relational.candidate_ids(&self.file_id, predicate).await
    }

    /// Resolve an `xref` within this mirror's dataset.
    pub async fn resolve_xref(&self, xref: &str) -> Result<Option<u64>> {
        self.relational.resolve_xref(&self.file_id, xref).await
    }
}

pub(crate) fn require_file_id(options: &HybridOptions) -> Result<&FileId> {
    if options.file_id.is_empty() {
        return Err(GraphError::Invalid("hybrid build requires a non-empty file_id".into()));
    }
    Ok(&options.file_id)
}
