//! `rusqlite`-backed [`RelationalIndex`] (§6): the embeddable relational
//! engine the retrieval pack's `ankurah-storage-sqlite`/`prisma` use, a
//! better fit than a client/server engine for "very large trees... without
//! holding the full graph in memory".
//!
//! `rusqlite::Connection` is not `Send`, so every operation runs inside
//! `spawn_blocking` over a `tokio::sync::Mutex`-guarded connection, mirroring
//! `ankurah-storage-sqlite`'s `PooledConnection::with_connection`.

use std::path::Path;
use std::sync::Arc;

use rusqlite::{params, Connection};
use tokio::sync::Mutex;
use tracing::debug;

use super::{FileId, IndexablePredicate, NodeRow, RelationalIndex};
use crate::error::{GraphError, Result};
use crate::record::Sex;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS nodes(
    file_id TEXT NOT NULL,
    id INTEGER NOT NULL,
    xref TEXT NOT NULL,
    type TEXT NOT NULL,
    name TEXT,
    name_lower TEXT,
    birth_date INTEGER,
    birth_place TEXT,
    sex TEXT,
    has_children INTEGER NOT NULL,
    has_spouse INTEGER NOT NULL,
    living INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (file_id, id)
);
CREATE INDEX IF NOT EXISTS nodes_xref_idx ON nodes(file_id, xref);
CREATE INDEX IF NOT EXISTS nodes_name_lower_idx ON nodes(file_id, name_lower);
CREATE INDEX IF NOT EXISTS nodes_birth_date_idx ON nodes(file_id, birth_date);
CREATE INDEX IF NOT EXISTS nodes_sex_idx ON nodes(file_id, sex);
CREATE INDEX IF NOT EXISTS nodes_has_children_idx ON nodes(file_id, has_children);
CREATE INDEX IF NOT EXISTS nodes_has_spouse_idx ON nodes(file_id, has_spouse);
CREATE INDEX IF NOT EXISTS nodes_living_idx ON nodes(file_id, living);

CREATE TABLE IF NOT EXISTS xref_mapping(
    file_id TEXT NOT NULL,
    xref TEXT NOT NULL,
    node_id INTEGER NOT NULL,
    PRIMARY KEY (file_id, xref)
);

-- Reserved for connected-component precomputation; no reader in this
-- crate today (§9 open question).
CREATE TABLE IF NOT EXISTS components(
    file_id TEXT NOT NULL,
    node_id INTEGER NOT NULL,
    component_id INTEGER NOT NULL,
    PRIMARY KEY (file_id, node_id)
);
"#;

fn to_sqlite_error(e: rusqlite::Error) -> GraphError {
    GraphError::Storage(e.to_string())
}

/// A `rusqlite`-backed relational index, opened against a single SQLite
/// database (file-backed or in-memory).
pub struct SqliteRelationalIndex {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRelationalIndex {
    /// Open (and migrate) a file-backed index.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_owned();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection> {
            let conn = Connection::open(path).map_err(to_sqlite_error)?;
            conn.execute_batch(SCHEMA).map_err(to_sqlite_error)?;
            Ok(conn)
        })
        .await
        .map_err(|e| GraphError::Storage(e.to_string()))??;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Open an in-memory index, for tests and small one-shot mirrors.
    pub async fn open_in_memory() -> Result<Self> {
        let conn = tokio::task::spawn_blocking(|| -> Result<Connection> {
            let conn = Connection::open_in_memory().map_err(to_sqlite_error)?;
            conn.execute_batch(SCHEMA).map_err(to_sqlite_error)?;
            Ok(conn)
        })
        .await
        .map_err(|e| GraphError::Storage(e.to_string()))??;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    async fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.blocking_lock();
            f(&guard).map_err(to_sqlite_error)
        })
        .await
        .map_err(|e| GraphError::Storage(e.to_string()))?
    }
}

fn sex_column(sex: Sex) -> &'static str {
    match sex {
        Sex::Male => "M",
        Sex::Female => "F",
        Sex::Unknown => "U",
    }
}

#[async_trait::async_trait]
impl RelationalIndex for SqliteRelationalIndex {
    async fn begin(&self) -> Result<()> {
        debug!("sqlite relational index: begin transaction");
        self.with_connection(|c| c.execute_batch("BEGIN")).await
    }

    async fn insert_node_row(&self, file_id: &FileId, row: NodeRow) -> Result<()> {
        let file_id = file_id.clone();
        self.with_connection(move |c| {
            c.execute(
                "INSERT INTO nodes(file_id, id, xref, type, name, name_lower, birth_date, birth_place, sex, has_children, has_spouse, living, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                 ON CONFLICT(file_id, id) DO UPDATE SET
                    xref = excluded.xref, type = excluded.type, name = excluded.name, name_lower = excluded.name_lower,
                    birth_date = excluded.birth_date, birth_place = excluded.birth_place, sex = excluded.sex,
                    has_children = excluded.has_children, has_spouse = excluded.has_spouse, living = excluded.living,
                    updated_at = excluded.updated_at",
                params![
                    file_id,
                    row.id as i64,
                    row.xref,
                    row.node_type,
                    row.name,
                    row.name_lower,
                    row.birth_date,
                    row.birth_place,
                    row.sex,
                    row.has_children as i64,
                    row.has_spouse as i64,
                    row.living as i64,
                    row.created_at,
                    row.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn insert_xref_mapping(&self, file_id: &FileId, xref: &str, node_id: u64) -> Result<()> {
        let file_id = file_id.clone();
        let xref = xref.to_string();
        self.with_connection(move |c| {
            c.execute(
                "INSERT INTO xref_mapping(file_id, xref, node_id) VALUES (?1, ?2, ?3)
                 ON CONFLICT(file_id, xref) DO UPDATE SET node_id = excluded.node_id",
                params![file_id, xref, node_id as i64],
            )?;
            Ok(())
        })
        .await
    }

    async fn commit(&self) -> Result<()> {
        debug!("sqlite relational index: commit");
        self.with_connection(|c| c.execute_batch("COMMIT")).await
    }

    async fn rollback(&self) -> Result<()> {
        debug!("sqlite relational index: rollback");
        self.with_connection(|c| c.execute_batch("ROLLBACK")).await
    }

    async fn resolve_xref(&self, file_id: &FileId, xref: &str) -> Result<Option<u64>> {
        let file_id = file_id.clone();
        let xref = xref.to_string();
        self.with_connection(move |c| {
            c.query_row("SELECT node_id FROM xref_mapping WHERE file_id = ?1 AND xref = ?2", params![file_id, xref], |row| {
                row.get::<_, i64>(0)
            })
            .map(|id| Some(id as u64))
            .or_else(|e| if matches!(e, rusqlite::Error::QueryReturnedNoRows) { Ok(None) } else { Err(e) })
        })
        .await
    }

    async fn candidate_ids(&self, file_id: &FileId, predicate: &IndexablePredicate) -> Result<Vec<u64>> {
        let file_id = file_id.clone();
        let predicate = predicate.clone();
        self.with_connection(move |c| {
            let (clause, binds): (&str, Vec<Box<dyn rusqlite::ToSql>>) = match predicate {
                IndexablePredicate::NameLower(needle) => ("name_lower LIKE ?2", vec![Box::new(format!("%{needle}%"))]),
                IndexablePredicate::BirthDateRange(start, end) => {
                    ("birth_date BETWEEN ?2 AND ?3", vec![Box::new(start), Box::new(end)])
                }
                IndexablePredicate::Sex(sex) => ("sex = ?2", vec![Box::new(sex_column(sex).to_string())]),
                IndexablePredicate::HasChildren(v) => ("has_children = ?2", vec![Box::new(v as i64)]),
                IndexablePredicate::HasSpouse(v) => ("has_spouse = ?2", vec![Box::new(v as i64)]),
                IndexablePredicate::Living(v) => ("living = ?2", vec![Box::new(v as i64)]),
            };
            let query = format!("SELECT id FROM nodes WHERE file_id = ?1 AND {clause}");
            let mut stmt = c.prepare(&query)?;
            let mut params: Vec<&dyn rusqlite::ToSql> = vec![&file_id];
            params.extend(binds.iter().map(|b| b.as_ref()));
            let rows = stmt.query_map(params.as_slice(), |row| row.get::<_, i64>(0))?;
            rows.map(|r| r.map(|id| id as u64)).collect()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(id: u64, xref: &str, name: &str) -> NodeRow {
        NodeRow {
            id,
            xref: xref.into(),
            node_type: "Individual".into(),
            name: Some(name.into()),
            name_lower: Some(name.to_lowercase()),
            birth_date: None,
            birth_place: None,
            sex: Some("M".into()),
            has_children: false,
            has_spouse: false,
            living: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[tokio::test]
    async fn insert_and_resolve_xref_roundtrip() {
        let index = SqliteRelationalIndex::open_in_memory().await.unwrap();
        index.begin().await.unwrap();
        index.insert_node_row(&"fileA".to_string(), sample_row(1, "@I1@", "Ada Lovelace")).await.unwrap();
        index.insert_xref_mapping(&"fileA".to_string(), "@I1@", 1).await.unwrap();
        index.commit().await.unwrap();

        assert_eq!(index.resolve_xref(&"fileA".to_string(), "@I1@").await.unwrap(), Some(1));
        assert_eq!(index.resolve_xref(&"fileA".to_string(), "@I9@").await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_id_isolates_identical_ids() {
        let index = SqliteRelationalIndex::open_in_memory().await.unwrap();
        index.begin().await.unwrap();
        index.insert_node_row(&"fileA".to_string(), sample_row(1, "@I1@", "Ada Lovelace")).await.unwrap();
        index.insert_xref_mapping(&"fileA".to_string(), "@I1@", 1).await.unwrap();
        index.insert_node_row(&"fileB".to_string(), sample_row(1, "@I1@", "Bea Lovelace")).await.unwrap();
        index.insert_xref_mapping(&"fileB".to_string(), "@I1@", 1).await.unwrap();
        index.commit().await.unwrap();

        let candidates_a = index.candidate_ids(&"fileA".to_string(), &IndexablePredicate::NameLower("ada".into())).await.unwrap();
        let candidates_b = index.candidate_ids(&"fileB".to_string(), &IndexablePredicate::NameLower("ada".into())).await.unwrap();
        assert_eq!(candidates_a, vec![1]);
        assert!(candidates_b.is_empty());
    }

    #[tokio::test]
    async fn rollback_discards_uncommitted_rows() {
        let index = SqliteRelationalIndex::open_in_memory().await.unwrap();
        index.begin().await.unwrap();
        index.insert_node_row(&"fileA".to_string(), sample_row(1, "@I1@", "Ada Lovelace")).await.unwrap();
        index.rollback().await.unwrap();

        assert_eq!(index.resolve_xref(&"fileA".to_string(), "@I1@").await.unwrap(), None);
    }
}
