//! Embedding text and a small in-process vector index

use crate::{Result, StorageError};
use axiom_model::{Axiom, AxiomType};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// The text an axiom is embedded from
pub fn embedding_text(axiom: &Axiom) -> String {
    let mut parts = vec![axiom.content.clone()];
    if let Some(function) = &axiom.function {
        parts.push(format!("Function: {function}"));
    }
    if let Some(header) = &axiom.header {
        parts.push(format!("Header: {header}"));
    }
    parts.push(format!("Type: {}", axiom.axiom_type));
    if let Some(on_violation) = &axiom.on_violation {
        parts.push(format!("On violation: {on_violation}"));
    }
    parts.push(format!("Module: {}", axiom.module()));
    if !axiom.tags.is_empty() {
        parts.push(format!("Tags: {}", axiom.tags.join(", ")));
    }
    if !axiom.violated_by.is_empty() {
        let violations: Vec<String> = axiom
            .violated_by
            .iter()
            .map(|v| format!("{}: {}", v.error_type, v.message))
            .collect();
        parts.push(format!("Violations: {}", violations.join("; ")));
    }
    parts.join(". ")
}

/// Turns text into fixed-length vectors
pub trait Embedder: Send + Sync {
    fn dimension(&self) -> usize;

    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Feature hashing over lowercase word tokens
///
/// Deterministic and offline; similar wording lands on similar vectors.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Embedder for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let words = text
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase);
        for word in words {
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            let hash = hasher.finish();
            let slot = (hash % self.dimension as u64) as usize;
            let sign = if hash & (1 << 63) == 0 { 1.0 } else { -1.0 };
            vector[slot] += sign;
        }
        normalize(&mut vector);
        vector
    }
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Filterable columns stored beside each vector
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMetadata {
    pub content: String,
    pub axiom_type: AxiomType,
    pub function: Option<String>,
    pub header: Option<String>,
    pub module: String,
    pub layer: String,
    pub tags: Vec<String>,
}

impl From<&Axiom> for VectorMetadata {
    fn from(axiom: &Axiom) -> Self {
        Self {
            content: axiom.content.clone(),
            axiom_type: axiom.axiom_type,
            function: axiom.function.clone(),
            header: axiom.header.clone(),
            module: axiom.module().to_string(),
            layer: axiom.layer.clone(),
            tags: axiom.tags.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VectorEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: VectorMetadata,
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub metadata: VectorMetadata,
}

/// Exact-match filter applied before ranking
#[derive(Debug, Clone, Default)]
pub struct VectorFilter {
    pub tag: Option<String>,
    pub function: Option<String>,
    pub header: Option<String>,
    pub axiom_type: Option<AxiomType>,
}

impl VectorFilter {
    pub fn matches(&self, metadata: &VectorMetadata) -> bool {
        if let Some(tag) = &self.tag {
            if !metadata.tags.contains(tag) {
                return false;
            }
        }
        if self.function.is_some() && metadata.function != self.function {
            return false;
        }
        if self.header.is_some() && metadata.header != self.header {
            return false;
        }
        if let Some(axiom_type) = self.axiom_type {
            if metadata.axiom_type != axiom_type {
                return false;
            }
        }
        true
    }
}

/// Vectors for axioms, searched by cosine similarity
pub struct VectorIndex {
    embedder: Box<dyn Embedder>,
    entries: Vec<VectorEntry>,
}

impl VectorIndex {
    pub fn new(embedder: Box<dyn Embedder>) -> Self {
        Self {
            embedder,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embed and store an axiom, replacing an entry with the same id
    pub fn add(&mut self, axiom: &Axiom) {
        let vector = self.embedder.embed(&embedding_text(axiom));
        let entry = VectorEntry {
            id: axiom.id.clone(),
            vector,
            metadata: VectorMetadata::from(axiom),
        };
        self.upsert(entry);
    }

    pub fn add_all(&mut self, axioms: &[Axiom]) {
        for axiom in axioms {
            self.add(axiom);
        }
    }

    /// Store a precomputed vector
    pub fn insert(&mut self, id: &str, vector: Vec<f32>, metadata: VectorMetadata) -> Result<()> {
        let expected = self.embedder.dimension();
        if vector.len() != expected {
            return Err(StorageError::Dimension {
                expected,
                actual: vector.len(),
            });
        }
        self.upsert(VectorEntry {
            id: id.to_string(),
            vector,
            metadata,
        });
        Ok(())
    }

    fn upsert(&mut self, entry: VectorEntry) {
        match self.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Nearest neighbours of `query` among entries passing `filter`
    pub fn search(&self, query: &str, limit: usize, filter: &VectorFilter) -> Vec<SearchHit> {
        let query = self.embedder.embed(query);
        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .filter(|e| filter.matches(&e.metadata))
            .map(|e| SearchHit {
                id: e.id.clone(),
                score: cosine_similarity(&query, &e.vector),
                metadata: e.metadata.clone(),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(limit);
        hits
    }

    /// Entries passing `filter`, in insertion order
    pub fn filter(&self, filter: &VectorFilter) -> Vec<&VectorEntry> {
        self.entries.iter().filter(|e| filter.matches(&e.metadata)).collect()
    }
}
