//! Axiom records and collections

use crate::{ErrorMarker, ErrorType, SourceLocation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Layer label for axioms extracted from the core C semantics
pub const DEFAULT_LAYER: &str = "c11_core";

/// What kind of statement an axiom makes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxiomType {
    Precondition,
    Postcondition,
    Effect,
    Constraint,
    Invariant,
    Exception,
    Complexity,
}

impl AxiomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AxiomType::Precondition => "precondition",
            AxiomType::Postcondition => "postcondition",
            AxiomType::Effect => "effect",
            AxiomType::Constraint => "constraint",
            AxiomType::Invariant => "invariant",
            AxiomType::Exception => "exception",
            AxiomType::Complexity => "complexity",
        }
    }

    /// Parse a type name, ignoring case
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "precondition" => Some(AxiomType::Precondition),
            "postcondition" => Some(AxiomType::Postcondition),
            "effect" => Some(AxiomType::Effect),
            "constraint" => Some(AxiomType::Constraint),
            "invariant" => Some(AxiomType::Invariant),
            "exception" => Some(AxiomType::Exception),
            "complexity" => Some(AxiomType::Complexity),
            _ => None,
        }
    }
}

impl fmt::Display for AxiomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A violation an axiom guards against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationRef {
    pub code: String,
    pub error_type: ErrorType,
    pub message: String,
}

impl From<&ErrorMarker> for ViolationRef {
    fn from(marker: &ErrorMarker) -> Self {
        Self {
            code: marker.code.clone(),
            error_type: marker.error_type,
            message: marker.message.clone(),
        }
    }
}

/// A discrete, machine-readable rule about program behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axiom {
    /// Content-addressed identifier
    pub id: String,

    /// Human-readable sentence
    pub content: String,

    /// Original condition text (may be empty)
    #[serde(default)]
    pub formal_spec: String,

    pub axiom_type: AxiomType,

    #[serde(flatten)]
    pub source: SourceLocation,

    #[serde(default = "default_layer")]
    pub layer: String,

    #[serde(default = "default_confidence")]
    pub confidence: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub c_standard_refs: Vec<String>,

    /// Axioms this axiom's rule calls into (never includes `id`)
    #[serde(default)]
    pub depends_on: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_violation: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violated_by: Vec<ViolationRef>,
}

fn default_layer() -> String {
    DEFAULT_LAYER.to_string()
}

fn default_confidence() -> f64 {
    1.0
}

impl Axiom {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        axiom_type: AxiomType,
        source: SourceLocation,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            formal_spec: String::new(),
            axiom_type,
            source,
            layer: default_layer(),
            confidence: default_confidence(),
            function: None,
            header: None,
            tags: Vec::new(),
            c_standard_refs: Vec::new(),
            depends_on: Vec::new(),
            on_violation: None,
            violated_by: Vec::new(),
        }
    }

    pub fn module(&self) -> &str {
        &self.source.module
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Add a dependency, skipping duplicates and self references
    pub fn add_dependency(&mut self, id: &str) -> bool {
        if id == self.id || self.depends_on.iter().any(|d| d == id) {
            return false;
        }
        self.depends_on.push(id.to_string());
        true
    }
}

/// The JSON document exchanged between extraction, enrichment and loading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxiomCollection {
    pub version: String,
    pub source: String,
    pub extracted_at: DateTime<Utc>,
    pub axioms: Vec<Axiom>,
}

impl AxiomCollection {
    pub fn new(source: impl Into<String>, axioms: Vec<Axiom>) -> Self {
        Self {
            version: "1.0".to_string(),
            source: source.into(),
            extracted_at: Utc::now(),
            axioms,
        }
    }

    pub fn len(&self) -> usize {
        self.axioms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axioms.is_empty()
    }
}
