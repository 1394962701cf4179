//! Hand-written pairing manifests
//!
//! ```toml
//! [[pairing]]
//! opener = "pthread_mutex_lock"
//! closer = "pthread_mutex_unlock"
//! evidence = "POSIX mutex"
//!
//! [[idiom]]
//! name = "scoped_lock"
//! participants = ["pthread_mutex_lock", "pthread_mutex_unlock"]
//! template = "pthread_mutex_lock(${m});\n${body}\npthread_mutex_unlock(${m});"
//! ```

use crate::error::PairingError;
use axiom_model::{placeholder_id, Idiom, Pairing, PairingCollection, PairingSource};
use serde::Deserialize;
use std::path::Path;

pub const MANIFEST_CONFIDENCE: f64 = 1.0;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PairingManifest {
    #[serde(default, rename = "pairing")]
    pub pairings: Vec<ManifestPairing>,
    #[serde(default, rename = "idiom")]
    pub idioms: Vec<ManifestIdiom>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestPairing {
    pub opener: String,
    pub closer: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub evidence: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestIdiom {
    pub name: String,
    pub participants: Vec<String>,
    #[serde(default)]
    pub template: String,
}

fn default_required() -> bool {
    true
}

impl PairingManifest {
    pub fn from_toml_str(source: &str) -> Result<Self, PairingError> {
        let manifest: Self = toml::from_str(source)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self, PairingError> {
        let source = std::fs::read_to_string(path).map_err(|source| PairingError::ManifestIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    fn validate(&self) -> Result<(), PairingError> {
        if let Some(entry) = self.pairings.iter().find(|p| p.opener == p.closer) {
            return Err(PairingError::SelfPairing {
                function: entry.opener.clone(),
            });
        }
        if let Some(idiom) = self.idioms.iter().find(|i| i.participants.is_empty()) {
            return Err(PairingError::EmptyIdiom {
                name: idiom.name.clone(),
            });
        }
        Ok(())
    }

    /// Records with placeholder ids, one per manifest entry
    pub fn to_collection(&self) -> PairingCollection {
        let pairings = self
            .pairings
            .iter()
            .map(|entry| Pairing {
                opener_id: placeholder_id(&entry.opener),
                closer_id: placeholder_id(&entry.closer),
                required: entry.required,
                source: PairingSource::TomlManifest,
                confidence: MANIFEST_CONFIDENCE,
                cell: None,
                evidence: entry
                    .evidence
                    .clone()
                    .unwrap_or_else(|| format!("Manifest: {} -> {}", entry.opener, entry.closer)),
            })
            .collect();
        let idioms = self
            .idioms
            .iter()
            .map(|entry| Idiom {
                id: Idiom::id_for(&entry.name),
                name: entry.name.clone(),
                participants: entry.participants.iter().map(|f| placeholder_id(f)).collect(),
                template: entry.template.clone(),
                source: PairingSource::TomlManifest,
            })
            .collect();
        PairingCollection { pairings, idioms }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
[[pairing]]
opener = "fopen"
closer = "fclose"
evidence = "stdio stream"
note = "ignored"

[[pairing]]
opener = "setjmp"
closer = "longjmp"
required = false

[[idiom]]
name = "file_scope"
participants = ["fopen", "fclose"]
template = "FILE *f = fopen(${path}, ${mode});\n${body}\nfclose(f);"
"#;

    #[test]
    fn test_parse_manifest() {
        let collection = PairingManifest::from_toml_str(MANIFEST).unwrap().to_collection();
        assert_eq!(collection.pairings.len(), 2);

        let first = &collection.pairings[0];
        assert_eq!(first.key(), ("axiom_for_fopen", "axiom_for_fclose"));
        assert!(first.required);
        assert_eq!(first.confidence, 1.0);
        assert_eq!(first.source, PairingSource::TomlManifest);
        assert_eq!(first.evidence, "stdio stream");

        let second = &collection.pairings[1];
        assert!(!second.required);
        assert_eq!(second.evidence, "Manifest: setjmp -> longjmp");

        let idiom = &collection.idioms[0];
        assert_eq!(idiom.id, "idiom_file_scope");
        assert_eq!(idiom.participants, vec!["axiom_for_fopen", "axiom_for_fclose"]);
        assert_eq!(idiom.placeholders(), vec!["path", "mode", "body"]);
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = PairingManifest::from_toml_str("").unwrap();
        assert!(manifest.pairings.is_empty());
        assert!(manifest.idioms.is_empty());
    }

    #[test]
    fn test_rejects_self_pairing() {
        let err = PairingManifest::from_toml_str("[[pairing]]\nopener = \"f\"\ncloser = \"f\"\n").unwrap_err();
        assert!(matches!(err, PairingError::SelfPairing { ref function } if function == "f"));
    }

    #[test]
    fn test_rejects_malformed() {
        let err = PairingManifest::from_toml_str("[[pairing]]\nopener = 3\n").unwrap_err();
        assert!(matches!(err, PairingError::ManifestFormat(_)));
    }
}
