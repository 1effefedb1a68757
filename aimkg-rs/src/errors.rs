//! Error types for aimkg-rs.
//!
//! Resolution misses and incomplete source records are deliberately absent:
//! they are counted in [`crate::pipeline::IngestReport`], never raised.

use crate::nodes::EntityKind;

/// Alias for Results returning [`AimkgError`].
pub type Result<T> = std::result::Result<T, AimkgError>;

/// Top-level error type for aimkg-rs.
#[derive(Debug, thiserror::Error)]
pub enum AimkgError {
    /// The graph store is unreachable or rejected a query.
    #[error("Graph store error: {0}")]
    Store(String),

    /// No embedding index has been built for the requested entity type.
    #[error("Embedding index not built for {0}")]
    IndexNotBuilt(EntityKind),

    /// An index file exists but cannot be decoded or is inconsistent.
    #[error("Embedding index error: {0}")]
    Index(String),

    #[error("Embedder error: {0}")]
    Embedder(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A source dump or taxonomy file could not be read as a whole.
    #[error("Source error: {0}")]
    Source(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AimkgError {
    /// True for failures of the external graph store (as opposed to local or
    /// request-level problems).
    pub fn is_store_failure(&self) -> bool {
        matches!(self, AimkgError::Store(_))
    }

    /// True when the system is not ready to answer for the entity type, which
    /// callers must distinguish from an empty result.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, AimkgError::IndexNotBuilt(_))
    }
}

impl From<neo4rs::Error> for AimkgError {
    fn from(err: neo4rs::Error) -> Self {
        AimkgError::Store(err.to_string())
    }
}

impl From<neo4rs::DeError> for AimkgError {
    fn from(err: neo4rs::DeError) -> Self {
        AimkgError::Store(format!("unexpected result shape: {err}"))
    }
}
