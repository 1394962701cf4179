//! Function name -> axiom id index

use crate::error::DependencyError;
use axiom_model::Axiom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Maps a function name to the ids of its axioms, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionIndex {
    entries: BTreeMap<String, Vec<String>>,
}

impl FunctionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every axiom that names a function
    pub fn from_axioms<'a>(axioms: impl IntoIterator<Item = &'a Axiom>) -> Self {
        let mut index = Self::new();
        for axiom in axioms {
            if let Some(function) = &axiom.function {
                index.insert(function, &axiom.id);
            }
        }
        index
    }

    pub fn insert(&mut self, function: &str, id: &str) {
        let ids = self.entries.entry(function.to_string()).or_default();
        if !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
    }

    /// Merge a lower layer's index; its ids come first on shared names
    pub fn merge_base(&mut self, base: &FunctionIndex) {
        for (function, base_ids) in &base.entries {
            let local = self.entries.remove(function).unwrap_or_default();
            let mut merged = base_ids.clone();
            for id in local {
                if !merged.contains(&id) {
                    merged.push(id);
                }
            }
            self.entries.insert(function.clone(), merged);
        }
    }

    pub fn get(&self, function: &str) -> &[String] {
        self.entries.get(function).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first_id(&self, function: &str) -> Option<&str> {
        self.get(function).first().map(String::as_str)
    }

    pub fn contains(&self, function: &str) -> bool {
        self.entries.contains_key(function)
    }

    pub fn functions(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<String, DependencyError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, DependencyError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, DependencyError> {
        let json = std::fs::read_to_string(path).map_err(|source| DependencyError::IndexIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: &Path) -> Result<(), DependencyError> {
        std::fs::write(path, self.to_json()?).map_err(|source| DependencyError::IndexIo {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axiom_model::{AxiomType, SourceLocation};

    fn axiom(id: &str, function: Option<&str>) -> Axiom {
        let mut a = Axiom::new(id, "c", AxiomType::Effect, SourceLocation::default());
        a.function = function.map(str::to_string);
        a
    }

    #[test]
    fn test_from_axioms() {
        let axioms = vec![axiom("a1", Some("malloc")), axiom("a2", Some("malloc")), axiom("a3", None)];
        let index = FunctionIndex::from_axioms(&axioms);
        assert_eq!(index.get("malloc"), ["a1".to_string(), "a2".to_string()]);
        assert_eq!(index.len(), 1);
        assert!(index.get("free").is_empty());
    }

    #[test]
    fn test_merge_base_prepends() {
        let mut local = FunctionIndex::new();
        local.insert("malloc", "local_1");
        local.insert("vector_push", "local_2");

        let mut base = FunctionIndex::new();
        base.insert("malloc", "base_1");
        base.insert("free", "base_2");

        local.merge_base(&base);
        assert_eq!(local.get("malloc"), ["base_1".to_string(), "local_1".to_string()]);
        assert_eq!(local.first_id("free"), Some("base_2"));
        assert_eq!(local.first_id("vector_push"), Some("local_2"));
    }

    #[test]
    fn test_json_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        let mut index = FunctionIndex::new();
        index.insert("malloc", "a1");
        index.save(&path).unwrap();
        assert_eq!(FunctionIndex::load(&path).unwrap(), index);
    }

    #[test]
    fn test_malformed_json() {
        let err = FunctionIndex::from_json("[1, 2]").unwrap_err();
        assert!(err.is_hard_error());
    }
}
