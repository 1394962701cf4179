//! Pairings and idioms

use serde::{Deserialize, Serialize};
use std::fmt;

const PLACEHOLDER_PREFIX: &str = "axiom_for_";

/// Placeholder id for a function whose axiom is not known yet
pub fn placeholder_id(function: &str) -> String {
    format!("{PLACEHOLDER_PREFIX}{function}")
}

/// The function named by a placeholder id, if `id` is one
pub fn placeholder_function(id: &str) -> Option<&str> {
    id.strip_prefix(PLACEHOLDER_PREFIX).filter(|f| !f.is_empty())
}

/// Where a pairing was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingSource {
    KSemantics,
    CommentAnnotation,
    NamingHeuristic,
    CppStdlibSemantic,
    TomlManifest,
}

impl PairingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PairingSource::KSemantics => "k_semantics",
            PairingSource::CommentAnnotation => "comment_annotation",
            PairingSource::NamingHeuristic => "naming_heuristic",
            PairingSource::CppStdlibSemantic => "cpp_stdlib_semantic",
            PairingSource::TomlManifest => "toml_manifest",
        }
    }
}

impl fmt::Display for PairingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directed opener -> closer relationship between two axioms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pairing {
    pub opener_id: String,
    pub closer_id: String,
    pub required: bool,
    pub source: PairingSource,
    pub confidence: f64,
    /// Shared resource name, for cell-derived pairings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell: Option<String>,
    #[serde(default)]
    pub evidence: String,
}

impl Pairing {
    pub fn key(&self) -> (&str, &str) {
        (&self.opener_id, &self.closer_id)
    }
}

/// A named usage template over paired axioms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idiom {
    pub id: String,
    pub name: String,
    /// Ordered participant axiom ids
    pub participants: Vec<String>,
    /// Template text with `${placeholder}` slots
    pub template: String,
    pub source: PairingSource,
}

impl Idiom {
    pub fn id_for(name: &str) -> String {
        format!("idiom_{name}")
    }

    /// Placeholder names used in the template, in order of first use
    pub fn placeholders(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut rest = self.template.as_str();
        while let Some(start) = rest.find("${") {
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else { break };
            let name = after[..end].to_string();
            if !names.contains(&name) {
                names.push(name);
            }
            rest = &after[end + 1..];
        }
        names
    }
}

/// The JSON document carrying pairings and idioms between stages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PairingCollection {
    #[serde(default)]
    pub pairings: Vec<Pairing>,
    #[serde(default)]
    pub idioms: Vec<Idiom>,
}

impl PairingCollection {
    pub fn extend(&mut self, other: PairingCollection) {
        self.pairings.extend(other.pairings);
        self.idioms.extend(other.idioms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idiom_placeholders() {
        let idiom = Idiom {
            id: Idiom::id_for("lock_guard"),
            name: "lock_guard".into(),
            participants: vec![],
            template: "mutex_lock(${m});\n${body}\nmutex_unlock(${m});".into(),
            source: PairingSource::CommentAnnotation,
        };
        assert_eq!(idiom.id, "idiom_lock_guard");
        assert_eq!(idiom.placeholders(), vec!["m".to_string(), "body".to_string()]);
    }

    #[test]
    fn test_placeholder_round_trip() {
        let id = placeholder_id("malloc");
        assert_eq!(id, "axiom_for_malloc");
        assert_eq!(placeholder_function(&id), Some("malloc"));
        assert_eq!(placeholder_function("c11_libc_stdlib_malloc_1a2b3c4d"), None);
        assert_eq!(placeholder_function("axiom_for_"), None);
    }

    #[test]
    fn test_source_tags() {
        let json = serde_json::to_string(&PairingSource::CppStdlibSemantic).unwrap();
        assert_eq!(json, "\"cpp_stdlib_semantic\"");
        assert_eq!(PairingSource::KSemantics.to_string(), "k_semantics");
    }
}
