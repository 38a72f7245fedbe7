//! Engine-level error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::format::ShardError;

/// Errors surfaced by table loading and query execution.
///
/// An absent query key is *not* an error; see
/// [`QueryOutcome::NotFound`](crate::model::QueryOutcome).
#[derive(Error, Debug)]
pub enum EngineError {
    /// A shard could not be read: missing, corrupt, truncated, or with a
    /// column count disagreeing with the fixed layout.
    #[error("feature table unavailable ({path}): {source}")]
    DataUnavailable {
        path: PathBuf,
        #[source]
        source: ShardError,
    },

    /// The concatenated table violated the (map_id, mod_mask) uniqueness
    /// invariant.
    #[error("duplicate feature row for map {map_id} with mods {mods:#x}")]
    DuplicateRow { map_id: i64, mods: u32 },

    /// A comparison column had near-zero variance under the strict
    /// degenerate-column policy.
    #[error("comparison column {column} has near-zero variance")]
    DegenerateColumn { column: usize },

    /// A request parameter was rejected before any computation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
