//! Axiom Extract - Rule files to axiom records
//!
//! Pass 1 of the pipeline:
//! 1. Tokenize and parse every rule file (`axiom-lexer`, `axiom-parser`)
//! 2. Describe requires clauses in English ([`ContentSynthesizer`])
//! 3. Classify each rule into at most one axiom ([`AxiomBuilder`])
//!
//! Also home to the comment-annotation scanner, which reads pairings and
//! idioms from `@axiom:` markers in C/C++ sources.

mod annotations;
mod builder;
mod config;
mod content;
mod error;
mod extractor;

pub use annotations::*;
pub use builder::*;
pub use config::*;
pub use content::*;
pub use error::{ExtractError, Result};
pub use extractor::*;

use std::path::Path;

/// Extract every rule file under `root` with the default configuration
pub fn extract_dir(root: &Path) -> Result<Extraction> {
    Extractor::default().extract_dir(root)
}
