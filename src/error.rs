//! Public error types.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors surfaced to callers of the graph and query APIs.
///
/// Per the propagation policy: graph-construction errors abort the build;
/// query errors propagate only to a fluent chain's terminal method
/// (`Execute`, `Count`, `Exists`, ...) — intermediate chain calls never
/// fail, and invalid filter arguments are silently ignored rather than
/// raised as errors (see [`crate::filter::FilterQuery`]).
#[derive(Debug, Error)]
pub enum GraphError {
    /// A referenced xref or synthetic event id does not exist, in a
    /// position where the operation's contract promises an error (most
    /// reads instead return `None`/empty results).
    #[error("not found: {0}")]
    NotFound(String),

    /// The underlying relational or KV mirror failed. The originating
    /// operation's effect has been rolled back.
    #[error("storage error: {0}")]
    Storage(String),

    /// A caller-supplied argument violates a contract that cannot be
    /// silently ignored (e.g. a missing `file_id` when building in hybrid
    /// mode).
    #[error("invalid argument: {0}")]
    Invalid(String),
}

/// Failure to parse a GEDCOM date expression.
///
/// This is an internal error type: callers of [`crate::filter`] and
/// [`crate::events`] never see a parse failure directly, since an
/// unparseable date is defined by the spec to simply not match (see
/// §4.4.1 "For empty/unparseable: no match").
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DateParseError {
    /// The date expression was empty.
    #[error("empty date expression")]
    Empty,
    /// The date expression did not match any recognized GEDCOM date form.
    #[error("unrecognized date expression: {0}")]
    Unrecognized(String),
}
