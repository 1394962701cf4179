//! Axiom - Knowledge extraction from K semantics rule files
//!
//! This is the root workspace crate that provides integration tests.
//! The actual implementation is in the workspace member crates.

// Re-export main crates for convenience
pub use axiom_deps as deps;
pub use axiom_extract as extract;
pub use axiom_lexer as lexer;
pub use axiom_model as model;
pub use axiom_pairing as pairing;
pub use axiom_parser as parser;
