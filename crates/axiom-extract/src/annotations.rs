//! `@axiom:` comment annotations in C and C++ sources
//!
//! Library authors can declare pairings and idioms next to a declaration:
//!
//! ```text
//! // @axiom:pairs_with resource_release
//! // @axiom:role opener
//! // @axiom:required true
//! void resource_acquire(Resource* r);
//! ```
//!
//! An annotation block only attaches to a declaration when nothing but
//! comments and blank lines sit between them.

use crate::error::{read_utf8, Result};
use axiom_model::{placeholder_id, Idiom, Pairing, PairingCollection, PairingSource};
use axiom_parser::regex;
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

/// Source extensions scanned by [`AnnotationScanner::scan_dir`]
pub const SOURCE_EXTENSIONS: &[&str] = &["h", "hpp", "hxx", "c", "cc", "cpp", "cxx"];

#[derive(Debug, Default, Clone)]
pub struct AnnotationScanner;

impl AnnotationScanner {
    pub fn new() -> Self {
        Self
    }

    /// Scan source text; `file_name` is quoted in evidence
    pub fn scan_source(&self, source: &str, file_name: &str) -> PairingCollection {
        let mut out = PairingCollection::default();
        let mut tags: BTreeMap<String, String> = BTreeMap::new();
        let mut in_block = false;

        for line in source.lines() {
            let t = line.trim();

            if in_block {
                collect_tags(t, &mut tags);
                if t.contains("*/") {
                    in_block = false;
                }
                continue;
            }

            if t.is_empty() {
                continue;
            }
            if t.starts_with("//") {
                collect_tags(t, &mut tags);
                continue;
            }
            if t.starts_with("/*") {
                collect_tags(t, &mut tags);
                in_block = !t.contains("*/");
                continue;
            }

            if !tags.is_empty() {
                if let Some(function) = declared_function(t) {
                    emit(&tags, &function, file_name, &mut out);
                }
                tags.clear();
            }
        }

        out
    }

    pub fn scan_file(&self, path: &Path) -> Result<PairingCollection> {
        let source = read_utf8(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(self.scan_source(&source, &name))
    }

    /// Scan every C/C++ source under `root`, skipping unreadable files
    pub fn scan_dir(&self, root: &Path) -> PairingCollection {
        let mut out = PairingCollection::default();
        for entry in WalkDir::new(root).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            let is_source = path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext));
            if !entry.file_type().is_file() || !is_source {
                continue;
            }
            match self.scan_file(path) {
                Ok(found) => out.extend(found),
                Err(err) => tracing::warn!(path = %path.display(), error = %err, "skipping source file"),
            }
        }
        out
    }
}

/// Collect `@axiom:key value` pairs; a value runs to the next tag or `*/`
fn collect_tags(line: &str, tags: &mut BTreeMap<String, String>) {
    for segment in line.split("@axiom:").skip(1) {
        let segment = segment.split("*/").next().unwrap_or_default();
        let Some((key, value)) = segment.trim().split_once(char::is_whitespace) else {
            continue;
        };
        let value = value.trim();
        if !key.is_empty() && !value.is_empty() {
            tags.insert(key.to_lowercase(), value.to_string());
        }
    }
}

/// Function name of a declaration line such as `void *xmalloc(size_t n);`
fn declared_function(line: &str) -> Option<String> {
    if line.starts_with('#') {
        return None;
    }
    let caps = regex!(r"^([\w\s\*&:<>,]*?)\b([A-Za-z_]\w*)\s*\(").captures(line)?;
    let return_type = caps[1].trim();
    if return_type.is_empty() || matches!(return_type, "return" | "if" | "while" | "for" | "switch") {
        return None;
    }
    Some(caps[2].to_string())
}

fn emit(tags: &BTreeMap<String, String>, function: &str, file_name: &str, out: &mut PairingCollection) {
    if let Some(partner) = tags.get("pairs_with") {
        let required = tags
            .get("required")
            .map_or(true, |v| v.eq_ignore_ascii_case("true"));
        let (opener, closer) = match tags.get("role").map(String::as_str) {
            Some("closer") => (partner.as_str(), function),
            _ => (function, partner.as_str()),
        };
        out.pairings.push(Pairing {
            opener_id: placeholder_id(opener),
            closer_id: placeholder_id(closer),
            required,
            source: PairingSource::CommentAnnotation,
            confidence: 1.0,
            cell: None,
            evidence: format!("@axiom:pairs_with in {file_name}"),
        });
    }

    if let (Some(name), Some(template)) = (tags.get("idiom"), tags.get("template")) {
        out.idioms.push(Idiom {
            id: Idiom::id_for(name),
            name: name.clone(),
            participants: vec![placeholder_id(function)],
            template: template.clone(),
            source: PairingSource::CommentAnnotation,
        });
    }
}
