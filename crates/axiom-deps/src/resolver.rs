//! Pass 2: `depends_on` resolution
//!
//! Scans the right-hand side of each axiom's rule for calls and links the
//! axiom to every axiom of each called function. Requires the function
//! index to be complete, so it runs strictly after extraction.

use crate::calls::CallScanner;
use crate::index::FunctionIndex;
use axiom_model::Axiom;
use std::collections::BTreeMap;

/// What pass 2 found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    /// Edges added across all axioms
    pub resolved_edges: usize,
    /// Called names with no axiom, and how often they were called
    pub unresolved_calls: BTreeMap<String, usize>,
    /// Axioms with no recorded right-hand side
    pub missing_rhs: usize,
}

impl ResolutionReport {
    pub fn unresolved_total(&self) -> usize {
        self.unresolved_calls.values().sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DependencyResolver {
    scanner: CallScanner,
}

impl DependencyResolver {
    pub fn new(scanner: CallScanner) -> Self {
        Self { scanner }
    }

    /// Fill `depends_on` for every axiom
    pub fn resolve(
        &self,
        axioms: &mut [Axiom],
        rhs_by_id: &BTreeMap<String, String>,
        index: &FunctionIndex,
    ) -> ResolutionReport {
        let mut report = ResolutionReport::default();

        for axiom in axioms.iter_mut() {
            let Some(rhs) = rhs_by_id.get(&axiom.id) else {
                report.missing_rhs += 1;
                continue;
            };

            for call in self.scanner.extract_function_calls(rhs) {
                let targets = index.get(&call);
                if targets.is_empty() {
                    *report.unresolved_calls.entry(call).or_default() += 1;
                    continue;
                }
                for target in targets {
                    if axiom.add_dependency(target) {
                        report.resolved_edges += 1;
                    }
                }
            }
        }

        tracing::debug!(
            edges = report.resolved_edges,
            unresolved = report.unresolved_total(),
            "dependency resolution finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axiom_model::{AxiomType, SourceLocation};

    fn axiom(id: &str, function: &str) -> Axiom {
        let mut a = Axiom::new(id, "c", AxiomType::Effect, SourceLocation::default());
        a.function = Some(function.to_string());
        a
    }

    #[test]
    fn test_resolves_calls_and_drops_self() {
        let mut axioms = vec![axiom("malloc_1", "malloc"), axiom("aligned_1", "alignedAlloc")];
        let rhs: BTreeMap<String, String> = [
            ("malloc_1".to_string(), "alignedAlloc(cfg:alignofMalloc, Len) ~> malloc(Len)".to_string()),
            ("aligned_1".to_string(), "tv(addProv(X), T) ~> unknownHelper(X)".to_string()),
        ]
        .into_iter()
        .collect();
        let index = FunctionIndex::from_axioms(&axioms);

        let report = DependencyResolver::default().resolve(&mut axioms, &rhs, &index);

        assert_eq!(axioms[0].depends_on, vec!["aligned_1".to_string()]);
        assert!(axioms[1].depends_on.is_empty());
        assert_eq!(report.resolved_edges, 1);
        assert_eq!(report.unresolved_calls.get("unknownHelper"), Some(&1));
    }

    #[test]
    fn test_base_layer_ids_come_first() {
        let mut axioms = vec![axiom("vec_1", "push_back")];
        let rhs: BTreeMap<String, String> =
            [("vec_1".to_string(), "malloc(N)".to_string())].into_iter().collect();
        let mut index = FunctionIndex::from_axioms(&axioms);
        let mut base = FunctionIndex::new();
        base.insert("malloc", "c11_malloc_a");
        base.insert("malloc", "c11_malloc_b");
        index.merge_base(&base);

        DependencyResolver::default().resolve(&mut axioms, &rhs, &index);
        assert_eq!(axioms[0].depends_on, vec!["c11_malloc_a".to_string(), "c11_malloc_b".to_string()]);
    }

    #[test]
    fn test_missing_rhs_counted() {
        let mut axioms = vec![axiom("x", "f")];
        let report = DependencyResolver::default().resolve(&mut axioms, &BTreeMap::new(), &FunctionIndex::new());
        assert_eq!(report.missing_rhs, 1);
    }
}
