//! Error types for pairing manifests

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PairingError {
    #[error("failed to read pairing manifest {path}: {source}")]
    ManifestIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed pairing manifest: {0}")]
    ManifestFormat(#[from] toml::de::Error),

    /// A manifest entry that pairs a function with itself
    #[error("pairing manifest entry pairs {function} with itself")]
    SelfPairing { function: String },

    #[error("idiom {name} has no participants")]
    EmptyIdiom { name: String },
}
