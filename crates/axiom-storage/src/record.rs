//! Storage schema for axioms and pairing edges

use axiom_model::{Axiom, AxiomType, Pairing, PairingSource, SourceLocation, ViolationRef};
use serde::{Deserialize, Serialize};

/// A stored axiom
///
/// Flat and free of skipped fields so it survives bincode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxiomRecord {
    pub id: String,

    /// Bumped on every upsert
    pub version: u64,

    pub content: String,
    pub formal_spec: String,
    pub axiom_type: AxiomType,
    pub layer: String,
    pub confidence: f64,

    pub source_file: String,
    pub module: String,
    pub line_start: usize,
    pub line_end: usize,

    pub function: Option<String>,
    pub header: Option<String>,
    pub tags: Vec<String>,
    pub c_standard_refs: Vec<String>,

    /// Outgoing dependency edges
    pub depends_on: Vec<String>,

    pub on_violation: Option<String>,
    pub violated_by: Vec<ViolationRef>,
}

impl From<&Axiom> for AxiomRecord {
    fn from(axiom: &Axiom) -> Self {
        Self {
            id: axiom.id.clone(),
            version: 1,
            content: axiom.content.clone(),
            formal_spec: axiom.formal_spec.clone(),
            axiom_type: axiom.axiom_type,
            layer: axiom.layer.clone(),
            confidence: axiom.confidence,
            source_file: axiom.source.file.clone(),
            module: axiom.source.module.clone(),
            line_start: axiom.source.line_start,
            line_end: axiom.source.line_end,
            function: axiom.function.clone(),
            header: axiom.header.clone(),
            tags: axiom.tags.clone(),
            c_standard_refs: axiom.c_standard_refs.clone(),
            depends_on: axiom.depends_on.clone(),
            on_violation: axiom.on_violation.clone(),
            violated_by: axiom.violated_by.clone(),
        }
    }
}

impl AxiomRecord {
    pub fn to_axiom(&self) -> Axiom {
        let source = SourceLocation {
            file: self.source_file.clone(),
            module: self.module.clone(),
            line_start: self.line_start,
            line_end: self.line_end,
        };
        let mut axiom = Axiom::new(&self.id, &self.content, self.axiom_type, source);
        axiom.formal_spec = self.formal_spec.clone();
        axiom.layer = self.layer.clone();
        axiom.confidence = self.confidence;
        axiom.function = self.function.clone();
        axiom.header = self.header.clone();
        axiom.tags = self.tags.clone();
        axiom.c_standard_refs = self.c_standard_refs.clone();
        axiom.depends_on = self.depends_on.clone();
        axiom.on_violation = self.on_violation.clone();
        axiom.violated_by = self.violated_by.clone();
        axiom
    }

    /// Secondary index entries this record appears under
    pub fn index_keys(&self) -> Vec<(IndexKind, &str)> {
        let mut keys = vec![
            (IndexKind::Module, self.module.as_str()),
            (IndexKind::Layer, self.layer.as_str()),
        ];
        if let Some(function) = &self.function {
            keys.push((IndexKind::Function, function.as_str()));
        }
        if let Some(header) = &self.header {
            keys.push((IndexKind::Header, header.as_str()));
        }
        for target in &self.depends_on {
            keys.push((IndexKind::Dependents, target.as_str()));
        }
        keys
    }
}

/// Secondary indexes kept by every backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexKind {
    Function,
    Header,
    Module,
    Layer,
    /// Dependency target -> axioms depending on it
    Dependents,
}

impl IndexKind {
    pub const ALL: [IndexKind; 5] = [
        IndexKind::Function,
        IndexKind::Header,
        IndexKind::Module,
        IndexKind::Layer,
        IndexKind::Dependents,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            IndexKind::Function => "function_index",
            IndexKind::Header => "header_index",
            IndexKind::Module => "module_index",
            IndexKind::Layer => "layer_index",
            IndexKind::Dependents => "dependents_index",
        }
    }
}

/// A stored `PAIRS_WITH` edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairingRecord {
    pub opener_id: String,
    pub closer_id: String,
    pub required: bool,
    pub source: PairingSource,
    pub confidence: f64,
    pub cell: Option<String>,
    pub evidence: String,
}

impl From<&Pairing> for PairingRecord {
    fn from(p: &Pairing) -> Self {
        Self {
            opener_id: p.opener_id.clone(),
            closer_id: p.closer_id.clone(),
            required: p.required,
            source: p.source,
            confidence: p.confidence,
            cell: p.cell.clone(),
            evidence: p.evidence.clone(),
        }
    }
}

impl From<PairingRecord> for Pairing {
    fn from(r: PairingRecord) -> Self {
        Pairing {
            opener_id: r.opener_id,
            closer_id: r.closer_id,
            required: r.required,
            source: r.source,
            confidence: r.confidence,
            cell: r.cell,
            evidence: r.evidence,
        }
    }
}

/// One edge per ordered pair; a later load overwrites the edge's properties
pub fn pairing_key(opener_id: &str, closer_id: &str) -> String {
    format!("{opener_id}->{closer_id}")
}
