//! `sled`-backed [`KvStore`] (§6 "KV store layout"): opaque node/edge byte
//! blobs, keyed by a `file_id`-prefixed key so two mirrors sharing one `sled`
//! database never collide.
//!
//! As with [`super::sqlite_index`], every call is synchronous `sled` work
//! wrapped in `spawn_blocking`, the same posture `ankurah-storage-sled`'s
//! collection/engine pair takes.

use std::path::Path;
use std::sync::Arc;

use sled::Db;
use tracing::debug;

use super::{FileId, KvStore};
use crate::error::{GraphError, Result};

fn to_sled_error(e: sled::Error) -> GraphError {
    GraphError::Storage(e.to_string())
}

fn node_key(file_id: &str, id: u64) -> Vec<u8> {
    let mut key = format!("{file_id}\0n\0").into_bytes();
    key.extend_from_slice(&id.to_be_bytes());
    key
}

fn edge_key(file_id: &str, id: u64) -> Vec<u8> {
    let mut key = format!("{file_id}\0e\0").into_bytes();
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// A `sled`-backed key-value store, opened against a single database
/// (file-backed or a temporary in-memory instance).
pub struct SledKvStore {
    db: Arc<Db>,
}

impl SledKvStore {
    /// Open (or create) a file-backed store.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_owned();
        let db = tokio::task::spawn_blocking(move || sled::open(path).map_err(to_sled_error))
            .await
            .map_err(|e| GraphError::Storage(e.to_string()))??;
        Ok(Self { db: Arc::new(db) })
    }

    /// Open a temporary in-memory store, for tests and small one-shot
    /// mirrors.
    pub async fn open_temporary() -> Result<Self> {
        let db = tokio::task::spawn_blocking(|| sled::Config::new().temporary(true).open().map_err(to_sled_error))
            .await
            .map_err(|e| GraphError::Storage(e.to_string()))??;
        Ok(Self { db: Arc::new(db) })
    }

    async fn put(&self, key: Vec<u8>, bytes: Vec<u8>) -> Result<()> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            db.insert(key, bytes).map_err(to_sled_error)?;
            Ok(())
        })
        .await
        .map_err(|e| GraphError::Storage(e.to_string()))?
    }

    async fn get(&self, key: Vec<u8>) -> Result<Option<Vec<u8>>> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.get(key).map(|opt| opt.map(|v| v.to_vec())).map_err(to_sled_error))
            .await
            .map_err(|e| GraphError::Storage(e.to_string()))?
    }
}

#[async_trait::async_trait]
impl KvStore for SledKvStore {
    async fn put_node(&self, file_id: &FileId, id: u64, bytes: Vec<u8>) -> Result<()> {
        debug!(file_id = %file_id, id, "sled kv: put node");
        self.put(node_key(file_id, id), bytes).await
    }

    async fn get_node(&self, file_id: &FileId, id: u64) -> Result<Option<Vec<u8>>> {
        self.get(node_key(file_id, id)).await
    }

    async fn put_edge(&self, file_id: &FileId, id: u64, bytes: Vec<u8>) -> Result<()> {
        debug!(file_id = %file_id, id, "sled kv: put edge");
        self.put(edge_key(file_id, id), bytes).await
    }

    async fn get_edge(&self, file_id: &FileId, id: u64) -> Result<Option<Vec<u8>>> {
        self.get(edge_key(file_id, id)).await
    }
}
