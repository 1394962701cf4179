//! Runs every detector and maps function names to axiom ids

use crate::cell::CellDetector;
use crate::naming::NamingTable;
use crate::semantic::SemanticTable;
use axiom_deps::FunctionIndex;
use axiom_model::{placeholder_function, PairingCollection, ParsedRule};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct PairingResolver {
    cells: CellDetector,
    naming: NamingTable,
    semantic: SemanticTable,
}

impl PairingResolver {
    pub fn new(cells: CellDetector, naming: NamingTable, semantic: SemanticTable) -> Self {
        Self { cells, naming, semantic }
    }

    /// Cell, naming and semantic pairings, in that order
    ///
    /// Outputs are concatenated as-is; the same pair may appear once per
    /// detector that found it.
    pub fn resolve(&self, rules: &[ParsedRule], index: &FunctionIndex) -> PairingCollection {
        let functions = function_names(rules, index);

        let cell = self.cells.detect(rules);
        let naming = self.naming.detect(&functions);
        let semantic = self.semantic.detect(&functions);
        debug!(
            cell = cell.len(),
            naming = naming.len(),
            semantic = semantic.len(),
            "pairing detectors finished"
        );

        let mut collection = PairingCollection::default();
        collection.pairings.extend(cell);
        collection.pairings.extend(naming);
        collection.pairings.extend(semantic);
        resolve_placeholders(&mut collection, index);
        collection
    }
}

/// Functions named by rules (in rule order), then any indexed only
pub fn function_names(rules: &[ParsedRule], index: &FunctionIndex) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let rule_functions = rules.iter().filter_map(|r| r.function.as_deref());
    for name in rule_functions.chain(index.functions()) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Swap `axiom_for_{fn}` placeholders for the function's first indexed id
///
/// Returns the number of ids rewritten; placeholders for functions the
/// index does not know are left in place.
pub fn resolve_placeholders(collection: &mut PairingCollection, index: &FunctionIndex) -> usize {
    let mut rewritten = 0;
    let mut resolve = |id: &mut String| {
        let resolved = placeholder_function(id).and_then(|f| index.first_id(f));
        if let Some(resolved) = resolved {
            *id = resolved.to_string();
            rewritten += 1;
        }
    };
    for pairing in &mut collection.pairings {
        resolve(&mut pairing.opener_id);
        resolve(&mut pairing.closer_id);
    }
    for idiom in &mut collection.idioms {
        for participant in &mut idiom.participants {
            resolve(participant);
        }
    }
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;
    use axiom_model::{Idiom, Pairing, PairingSource};

    fn index() -> FunctionIndex {
        let mut index = FunctionIndex::new();
        index.insert("malloc", "c11_libc_stdlib_malloc_00000001");
        index.insert("malloc", "c11_libc_stdlib_malloc_00000002");
        index
    }

    #[test]
    fn test_resolve_placeholders() {
        let mut collection = PairingCollection {
            pairings: vec![Pairing {
                opener_id: "axiom_for_malloc".into(),
                closer_id: "axiom_for_free".into(),
                required: true,
                source: PairingSource::KSemantics,
                confidence: 1.0,
                cell: Some("malloced".into()),
                evidence: String::new(),
            }],
            idioms: vec![Idiom {
                id: Idiom::id_for("heap"),
                name: "heap".into(),
                participants: vec!["axiom_for_malloc".into()],
                template: String::new(),
                source: PairingSource::TomlManifest,
            }],
        };
        assert_eq!(resolve_placeholders(&mut collection, &index()), 2);
        assert_eq!(collection.pairings[0].opener_id, "c11_libc_stdlib_malloc_00000001");
        assert_eq!(collection.pairings[0].closer_id, "axiom_for_free");
        assert_eq!(collection.idioms[0].participants[0], "c11_libc_stdlib_malloc_00000001");
    }

    #[test]
    fn test_function_names_dedup() {
        let mut rule = ParsedRule::new("", "", "M");
        rule.function = Some("free".into());
        let names = function_names(&[rule.clone(), rule], &index());
        assert_eq!(names, vec!["free", "malloc"]);
    }

    #[test]
    fn test_resolve_concatenates_sources() {
        let mut lock = ParsedRule::new("", "<locks>... .Map => L |-> T ...</locks>", "M");
        lock.function = Some("mutex_lock".into());
        let mut unlock = ParsedRule::new("", "<locks>... L |-> _ => .Map ...</locks>", "M");
        unlock.function = Some("mutex_unlock".into());

        let collection = PairingResolver::default().resolve(&[lock, unlock], &FunctionIndex::new());
        let sources: Vec<_> = collection.pairings.iter().map(|p| p.source).collect();
        assert_eq!(sources, vec![PairingSource::KSemantics, PairingSource::NamingHeuristic]);
        assert!(collection.pairings.iter().all(|p| p.key() == ("axiom_for_mutex_lock", "axiom_for_mutex_unlock")));
    }
}
