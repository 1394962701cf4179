//! Axiom Storage - Graph and vector storage for axioms
//!
//! Supports multiple graph backends:
//! - In-memory (for testing)
//! - redb (embedded database file)
//!
//! ## Architecture
//!
//! - Core KV operations (get, put, delete, list) over [`AxiomRecord`]s
//! - Indexed queries (by function, header, module, layer, dependents)
//! - Pairing and idiom edges stored beside the axioms
//! - Graph queries (proof chains, ungrounded axioms, integrity checks)
//!   provided by [`GraphStore`] on top of the above
//!
//! [`VectorIndex`] answers similarity search over axiom text.

mod error;
mod memory;
mod provider;
mod record;
mod redb_storage;
mod vector;

pub use error::{Result, StorageError};
pub use memory::InMemoryStorage;
pub use provider::{GraphStore, InvariantViolation, LoadReport, StorageStats, FOUNDATION_LAYERS, MAX_PROOF_DEPTH};
pub use record::{pairing_key, AxiomRecord, IndexKind, PairingRecord};
pub use redb_storage::RedbStorage;
pub use vector::{
    cosine_similarity, embedding_text, Embedder, HashingEmbedder, SearchHit, VectorEntry, VectorFilter,
    VectorIndex, VectorMetadata,
};
