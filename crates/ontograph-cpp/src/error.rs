//! Error types for building an ontology from translation units.

use ontograph::{GraphError, NodeKind};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors raised while merging and linking translation units.
///
/// Parse failures are not listed here: a unit that fails to parse is
/// skipped and reported in the [`BuildSummary`](crate::BuildSummary).
#[derive(Error, Debug)]
pub enum BuildError {
    /// A unit redeclares a name incompatibly; the whole unit is rejected
    #[error("Merge conflict in {unit}: {name} is declared as {incoming} but already known as {existing}", unit = .unit.display())]
    MergeConflict {
        /// Unit whose delta was rejected
        unit: PathBuf,
        /// Qualified name both declarations share
        name: String,
        /// Kind already present in the graph (or earlier in the unit)
        existing: NodeKind,
        /// Kind the rejected unit declares
        incoming: NodeKind,
    },

    /// The worker pool could not be created
    #[error("Failed to create thread pool: {0}")]
    ThreadPool(String),

    /// Graph operation failed or a structural invariant broke
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl BuildError {
    /// True for the per-unit rejection that lets the build continue.
    pub fn is_merge_conflict(&self) -> bool {
        matches!(self, BuildError::MergeConflict { .. })
    }
}
