//! Pairing detection over parsed rule text

use axiom_deps::FunctionIndex;
use axiom_model::PairingSource;
use axiom_pairing::{resolve_placeholders, PairingManifest, PairingResolver};
use axiom_parser::parse_rules;

const STDLIB: &str = r#"
module LIBC-STDLIB
  imports C-CONFIGURATION

  rule <k> builtin("malloc", tv(Sz:Int, _)) => loc(Base, 0) ...</k>
       <malloced>... .Map => Base |-> Sz ...</malloced>
       requires Sz >Int 0

  rule <k> builtin("free", tv(Loc:SymLoc, _)) => voidVal ...</k>
       <malloced>... base(Loc) |-> _ => .Map ...</malloced>

  rule <k> builtin("calloc", tv(N:Int, _), tv(Sz:Int, _)) => loc(Base, 0) ...</k>
       <malloced>... Base |-> Total ...</malloced>
endmodule
"#;

#[test]
fn test_malloc_free_share_malloced_cell() {
    let rules = parse_rules(STDLIB, "library/stdlib.k");
    assert_eq!(rules.len(), 3);

    let collection = PairingResolver::default().resolve(&rules, &FunctionIndex::new());
    let cell: Vec<_> = collection
        .pairings
        .iter()
        .filter(|p| p.source == PairingSource::KSemantics)
        .collect();
    assert_eq!(cell.len(), 1);
    assert_eq!(cell[0].opener_id, "axiom_for_malloc");
    assert_eq!(cell[0].closer_id, "axiom_for_free");
    assert_eq!(cell[0].cell.as_deref(), Some("malloced"));
    assert_eq!(cell[0].confidence, 1.0);
    assert!(cell[0].required);
}

#[test]
fn test_ids_resolved_through_index() {
    let rules = parse_rules(STDLIB, "library/stdlib.k");
    let mut index = FunctionIndex::new();
    index.insert("malloc", "c11_libc_stdlib_malloc_aaaaaaaa");
    index.insert("free", "c11_libc_stdlib_free_bbbbbbbb");

    let collection = PairingResolver::default().resolve(&rules, &index);
    assert_eq!(
        collection.pairings[0].key(),
        ("c11_libc_stdlib_malloc_aaaaaaaa", "c11_libc_stdlib_free_bbbbbbbb")
    );
}

#[test]
fn test_no_detector_emits_self_pairs() {
    let rules = parse_rules(STDLIB, "library/stdlib.k");
    let collection = PairingResolver::default().resolve(&rules, &FunctionIndex::new());
    assert!(collection.pairings.iter().all(|p| p.opener_id != p.closer_id));
}

#[test]
fn test_manifest_file_round() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pairs.toml");
    std::fs::write(
        &path,
        "[[pairing]]\nopener = \"malloc\"\ncloser = \"free\"\n\n[[idiom]]\nname = \"heap\"\nparticipants = [\"malloc\", \"free\"]\n",
    )
    .unwrap();

    let mut collection = PairingManifest::load(&path).unwrap().to_collection();
    let mut index = FunctionIndex::new();
    index.insert("free", "c11_libc_stdlib_free_bbbbbbbb");
    assert_eq!(resolve_placeholders(&mut collection, &index), 2);
    assert_eq!(collection.pairings[0].opener_id, "axiom_for_malloc");
    assert_eq!(collection.pairings[0].closer_id, "c11_libc_stdlib_free_bbbbbbbb");
    assert_eq!(collection.idioms[0].participants[1], "c11_libc_stdlib_free_bbbbbbbb");
}

#[test]
fn test_missing_manifest_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = PairingManifest::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, axiom_pairing::PairingError::ManifestIo { .. }));
}
