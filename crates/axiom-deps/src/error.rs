//! Error types for dependency resolution

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DependencyError {
    /// A call with no axiom behind it (expected for primitives and externals)
    #[error("unresolved call: {name} (from {referrer})")]
    UnresolvedCall { name: String, referrer: String },

    /// Axioms that depend on each other in a loop
    #[error("dependency cycle: {cycle}")]
    Cycle {
        /// Full cycle path, e.g., "a -> b -> a"
        cycle: String,
    },

    #[error("failed to access function index {path}: {source}")]
    IndexIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed function index: {0}")]
    IndexFormat(#[from] serde_json::Error),
}

impl DependencyError {
    /// Whether this error should stop the caller
    pub fn is_hard_error(&self) -> bool {
        match self {
            DependencyError::UnresolvedCall { .. } => false,
            DependencyError::Cycle { .. } => false,
            DependencyError::IndexIo { .. } => true,
            DependencyError::IndexFormat(_) => true,
        }
    }

    /// Error code for machine-readable output
    pub fn code(&self) -> &'static str {
        match self {
            DependencyError::UnresolvedCall { .. } => "E-DEP-001",
            DependencyError::Cycle { .. } => "E-DEP-002",
            DependencyError::IndexIo { .. } => "E-DEP-003",
            DependencyError::IndexFormat(_) => "E-DEP-004",
        }
    }
}
