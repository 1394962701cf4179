//! Shared helpers for the pipeline tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use axiom_deps::{resolve_dependencies, FunctionIndex, ResolutionReport};
use axiom_extract::{Extraction, Extractor};
use axiom_model::{Axiom, AxiomType};

/// Root of the fixture rule tree
pub fn semantics_dir() -> PathBuf {
    fixture_path("semantics")
}

/// Path to a file or directory under tests/fixtures/
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Both passes over a rule tree
pub struct PipelineRun {
    pub extraction: Extraction,
    pub index: FunctionIndex,
    pub resolution: ResolutionReport,
}

impl PipelineRun {
    pub fn axioms(&self) -> &[Axiom] {
        &self.extraction.axioms
    }
}

pub fn run_pipeline(root: &Path) -> PipelineRun {
    let mut extraction = Extractor::default()
        .extract_dir(root)
        .unwrap_or_else(|e| panic!("extraction of {} failed: {e}", root.display()));
    let (index, resolution) = resolve_dependencies(&mut extraction.axioms, &extraction.rhs_by_id, None);
    PipelineRun {
        extraction,
        index,
        resolution,
    }
}

/// The single axiom of a type for a function
pub fn axiom_for<'a>(axioms: &'a [Axiom], function: &str, axiom_type: AxiomType) -> &'a Axiom {
    let found: Vec<_> = axioms
        .iter()
        .filter(|a| a.function.as_deref() == Some(function) && a.axiom_type == axiom_type)
        .collect();
    assert_eq!(found.len(), 1, "expected one {axiom_type} axiom for {function}, got {found:?}");
    found[0]
}

pub fn in_module<'a>(axioms: &'a [Axiom], module: &str) -> Vec<&'a Axiom> {
    axioms.iter().filter(|a| a.module() == module).collect()
}

pub fn sorted(ids: &[String]) -> Vec<String> {
    let mut ids = ids.to_vec();
    ids.sort();
    ids
}
