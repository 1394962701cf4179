//! Types exchanged with the model

use serde::Deserialize;

/// One `[[axioms]]` table in a model response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseAxiom {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub formal_spec: String,
    /// Upper-case type name; POSTCONDITION when absent
    #[serde(default)]
    pub axiom_type: Option<String>,
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub on_violation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrichmentResponse {
    #[serde(default)]
    pub axioms: Vec<ResponseAxiom>,
}

/// What an enrichment run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub batches: usize,
    /// Batches kept unchanged after a model or parse failure
    pub failed_batches: usize,
    /// Existing axioms that gained an `on_violation`
    pub enriched: usize,
    /// New axioms proposed by the model
    pub inferred: usize,
}
