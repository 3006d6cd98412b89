#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod builder;
pub mod cache;
pub mod date;
pub mod error;
pub mod events;
pub mod filter;
pub mod graph;
#[cfg(feature = "hybrid")]
pub mod hybrid;
pub mod model;
pub mod pathfinder;
pub mod query;
pub mod record;
pub mod relationship;
pub mod traversal;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use builder::{BuildOptions, Builder};
pub use error::{GraphError, Result};
pub use graph::Graph;
pub use model::{EdgeId, EdgeType, Node, NodeId, NodeType};
pub use query::QueryBuilder;
pub use record::RecordTree;
pub use traversal::{Direction, TraversalOrder};

#[cfg(feature = "hybrid")]
pub use hybrid::{HybridBinding, HybridOptions, KvStore, RelationalIndex};
