//! End-to-end tests over the fixture rule tree
//!
//! Extraction, dependency resolution, pairing detection and storage,
//! driven the way the CLI drives them.

mod common;

use axiom_deps::find_cycles;
use axiom_model::{AxiomCollection, AxiomType, PairingSource};
use axiom_pairing::{resolve_placeholders, PairingManifest, PairingResolver};
use axiom_storage::{GraphStore, InMemoryStorage, RedbStorage};
use common::*;

const MULTIPLICATIVE: &str = "C-COMMON-EXPR-MULTIPLICATIVE";

#[test]
fn test_fixture_counts() {
    let run = run_pipeline(&semantics_dir());
    let report = run.extraction.report;
    assert_eq!(report.files_seen, 3);
    assert_eq!(report.files_failed, 0);
    assert_eq!(report.rules_parsed, 8);
    assert_eq!(run.axioms().len(), 7);
}

#[test]
fn test_extraction_is_idempotent() {
    let first = run_pipeline(&semantics_dir());
    let second = run_pipeline(&semantics_dir());
    let summary = |run: &PipelineRun| -> Vec<(String, Vec<String>)> {
        run.axioms()
            .iter()
            .map(|a| (a.id.clone(), a.depends_on.clone()))
            .collect()
    };
    assert_eq!(summary(&first), summary(&second));
}

#[test]
fn test_division_precondition_content() {
    let run = run_pipeline(&semantics_dir());
    let division: Vec<_> = in_module(run.axioms(), MULTIPLICATIVE)
        .into_iter()
        .filter(|a| a.formal_spec.contains("isZero"))
        .collect();
    assert_eq!(division.len(), 1);
    assert_eq!(division[0].axiom_type, AxiomType::Precondition);
    assert_eq!(division[0].formal_spec, "isPromoted(T) andBool notBool isZero(I2)");
    assert_eq!(
        division[0].content,
        "Integer division requires: operand must be integer-promoted, and divisor must be non-zero."
    );
    assert!(division[0].tags.contains(&"zero_check".to_string()));
}

#[test]
fn test_citation_supplies_content_and_requires_the_type() {
    let run = run_pipeline(&semantics_dir());
    let multiplication: Vec<_> = in_module(run.axioms(), MULTIPLICATIVE)
        .into_iter()
        .filter(|a| a.formal_spec == "isPromoted(T)")
        .collect();
    assert_eq!(multiplication.len(), 1);
    let axiom = multiplication[0];
    assert_eq!(axiom.axiom_type, AxiomType::Precondition);
    assert_eq!(axiom.content, "The result of the binary * operator is the product of the operands.");
    assert_eq!(axiom.c_standard_refs, vec!["n1570 6.5.5p4".to_string()]);
    assert!(axiom.tags.contains(&"multiplication".to_string()));
}

#[test]
fn test_error_marker_rules_are_never_preconditions() {
    let run = run_pipeline(&semantics_dir());

    // The division-by-zero rule has no function, so it yields nothing at all
    let multiplicative = in_module(run.axioms(), MULTIPLICATIVE);
    assert_eq!(multiplicative.len(), 2);
    assert!(multiplicative.iter().all(|a| a.content != "Division by 0."));

    let constraint = axiom_for(run.axioms(), "free", AxiomType::Constraint);
    assert_eq!(constraint.formal_spec, "notBool isMalloced(Loc)");
    assert!(run
        .axioms()
        .iter()
        .all(|a| !(a.axiom_type == AxiomType::Precondition && a.formal_spec == constraint.formal_spec)));
}

#[test]
fn test_constraints_describe_their_violation() {
    let run = run_pipeline(&semantics_dir());
    let constraints: Vec<_> = run
        .axioms()
        .iter()
        .filter(|a| a.axiom_type == AxiomType::Constraint)
        .collect();
    assert!(!constraints.is_empty());
    for axiom in &constraints {
        assert!(axiom.on_violation.as_deref().is_some_and(|v| !v.is_empty()), "{}", axiom.id);
    }

    let free = axiom_for(run.axioms(), "free", AxiomType::Constraint);
    assert_eq!(free.on_violation.as_deref(), Some("UNDEF: STDLIB2"));
    assert_eq!(free.header.as_deref(), Some("stdlib.h"));
    assert!(free.tags.contains(&"undef".to_string()));
}

#[test]
fn test_postcondition_from_standard_text() {
    let run = run_pipeline(&semantics_dir());
    let free = axiom_for(run.axioms(), "free", AxiomType::Postcondition);
    assert_eq!(free.content, "The free function causes the space pointed to by ptr to be deallocated.");
    assert_eq!(free.c_standard_refs, vec!["n1570 7.22.3.3p2".to_string()]);
    assert!(free.formal_spec.is_empty());
}

#[test]
fn test_dependencies_follow_calls() {
    let run = run_pipeline(&semantics_dir());
    let realloc = axiom_for(run.axioms(), "realloc", AxiomType::Effect);

    let mut expected: Vec<String> = run.index.get("malloc").to_vec();
    expected.extend(run.index.get("free").iter().cloned());
    assert_eq!(expected.len(), 3);
    assert_eq!(sorted(&realloc.depends_on), sorted(&expected));
}

#[test]
fn test_depends_on_never_contains_self() {
    let run = run_pipeline(&semantics_dir());
    for axiom in run.axioms() {
        assert!(!axiom.depends_on.contains(&axiom.id), "{} depends on itself", axiom.id);
    }
    // strlen's rule calls strlen
    let strlen = axiom_for(run.axioms(), "strlen", AxiomType::Effect);
    assert!(strlen.depends_on.is_empty());
    assert!(find_cycles(run.axioms()).is_empty());
}

#[test]
fn test_unresolved_calls_are_counted_not_failed() {
    let run = run_pipeline(&semantics_dir());
    assert!(run.resolution.unresolved_calls.contains_key("UNDEF"));
    assert!(run.resolution.resolved_edges >= 3);
}

#[test]
fn test_malloc_free_pairing_from_shared_cell() {
    let run = run_pipeline(&semantics_dir());
    let collection = PairingResolver::default().resolve(&run.extraction.rules, &run.index);

    assert_eq!(collection.pairings.len(), 1);
    let pairing = &collection.pairings[0];
    assert_eq!(pairing.source, PairingSource::KSemantics);
    assert_eq!(Some(pairing.opener_id.as_str()), run.index.first_id("malloc"));
    assert_eq!(Some(pairing.closer_id.as_str()), run.index.first_id("free"));
    assert_eq!(pairing.cell.as_deref(), Some("malloced"));
    assert_eq!(pairing.confidence, 1.0);
    assert!(pairing.required);
    assert_ne!(pairing.opener_id, pairing.closer_id);
}

#[test]
fn test_storage_round_trip() {
    let run = run_pipeline(&semantics_dir());
    let dir = tempfile::tempdir().unwrap();
    let stores: Vec<Box<dyn GraphStore>> = vec![
        Box::new(InMemoryStorage::new()),
        Box::new(RedbStorage::new(dir.path().join("axioms.redb")).unwrap()),
    ];

    for mut store in stores {
        assert_eq!(store.load_axioms(run.axioms()).unwrap(), 7);
        for original in run.axioms() {
            let loaded = store.get_axiom(&original.id).unwrap().unwrap();
            assert_eq!(loaded.id, original.id);
            assert_eq!(loaded.content, original.content);
            assert_eq!(loaded.formal_spec, original.formal_spec);
            assert_eq!(loaded.axiom_type, original.axiom_type);
            assert_eq!(loaded.depends_on, original.depends_on);
            assert_eq!(loaded.tags, original.tags);
            assert_eq!(&loaded, original);
        }
        assert!(store.verify().unwrap().is_empty());
    }
}

#[test]
fn test_manifest_pairings_load_into_graph() {
    let run = run_pipeline(&semantics_dir());
    let mut collection = PairingResolver::default().resolve(&run.extraction.rules, &run.index);
    let mut declared = PairingManifest::load(&fixture_path("pairs.toml")).unwrap().to_collection();
    assert_eq!(resolve_placeholders(&mut declared, &run.index), 4);
    collection.extend(declared);

    let mut store = InMemoryStorage::new();
    store.load_axioms(run.axioms()).unwrap();
    let report = store.load_pairings(&collection).unwrap();
    assert_eq!(report.pairings_loaded, 2);
    assert_eq!(report.pairings_skipped, 0);
    assert_eq!(report.idioms_loaded, 1);

    // Both sources name the same edge
    assert_eq!(store.pairings().unwrap().len(), 1);
    let malloc = run.index.first_id("malloc").unwrap();
    assert_eq!(store.idioms_for(malloc).unwrap()[0].id, "idiom_heap_block");

    let realloc = axiom_for(run.axioms(), "realloc", AxiomType::Effect);
    let chain = store.proof_chain(&realloc.id).unwrap();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0].id, realloc.id);
}

#[test]
fn test_collection_json_shape() {
    let run = run_pipeline(&semantics_dir());
    let collection = AxiomCollection::new("fixtures", run.extraction.axioms.clone());
    let json = serde_json::to_string(&collection).unwrap();
    assert!(json.contains("\"axiom_type\":\"precondition\""));

    let back: AxiomCollection = serde_json::from_str(&json).unwrap();
    assert_eq!(back.axioms, run.extraction.axioms);
}
