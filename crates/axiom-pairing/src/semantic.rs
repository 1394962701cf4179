//! Curated library lifecycle relations that naming alone cannot find

use axiom_model::{placeholder_id, Pairing, PairingSource};
use std::collections::HashSet;

pub const SEMANTIC_CONFIDENCE: f64 = 0.9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticEntry {
    pub opener: String,
    pub closer: String,
    pub evidence: String,
}

impl SemanticEntry {
    pub fn new(opener: &str, closer: &str, evidence: &str) -> Self {
        Self {
            opener: opener.to_string(),
            closer: closer.to_string(),
            evidence: evidence.to_string(),
        }
    }
}

const RAII: &str = "RAII: constructor/destructor";
const BACK: &str = "container: add/remove from back";
const FRONT: &str = "container: add/remove from front";
const ALLOC: &str = "memory: allocation/deallocation";

const CPP_STDLIB: &[(&str, &str, &str)] = &[
    ("std::any::any", "std::any::~any", RAII),
    ("std::variant::variant", "std::variant::~variant", RAII),
    ("std::shared_ptr::shared_ptr", "std::shared_ptr::~shared_ptr", RAII),
    ("std::weak_ptr::weak_ptr", "std::weak_ptr::~weak_ptr", RAII),
    ("std::condition_variable", "std::condition_variable::~condition_variable", RAII),
    (
        "std::condition_variable_any",
        "std::condition_variable_any::~condition_variable_any",
        RAII,
    ),
    (
        "std::weak_ptr::lock",
        "std::weak_ptr::reset",
        "acquire/release: lock creates shared_ptr, reset releases",
    ),
    ("push_back", "pop_back", BACK),
    ("push_front", "pop_front", FRONT),
    ("emplace_back", "pop_back", BACK),
    ("emplace_front", "pop_front", FRONT),
    ("ranges::begin", "ranges::end", "range: begin/end iterators"),
    ("ranges::rbegin", "ranges::rend", "range: reverse begin/end iterators"),
    ("ranges::cbegin", "ranges::cend", "range: const begin/end iterators"),
    ("ranges::crbegin", "ranges::crend", "range: const reverse begin/end iterators"),
    ("std::make_shared", "std::shared_ptr::~shared_ptr", ALLOC),
    ("std::allocate_shared", "std::shared_ptr::~shared_ptr", ALLOC),
];

#[derive(Debug, Clone)]
pub struct SemanticTable {
    entries: Vec<SemanticEntry>,
}

impl Default for SemanticTable {
    /// The C++ standard library relations
    fn default() -> Self {
        Self::new(
            CPP_STDLIB
                .iter()
                .map(|(opener, closer, evidence)| SemanticEntry::new(opener, closer, evidence))
                .collect(),
        )
    }
}

impl SemanticTable {
    pub fn new(entries: Vec<SemanticEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[SemanticEntry] {
        &self.entries
    }

    pub fn detect<S: AsRef<str>>(&self, functions: &[S]) -> Vec<Pairing> {
        let known: HashSet<&str> = functions.iter().map(AsRef::as_ref).collect();
        self.entries
            .iter()
            .filter(|e| known.contains(e.opener.as_str()) && known.contains(e.closer.as_str()))
            .map(|e| Pairing {
                opener_id: placeholder_id(&e.opener),
                closer_id: placeholder_id(&e.closer),
                required: true,
                source: PairingSource::CppStdlibSemantic,
                confidence: SEMANTIC_CONFIDENCE,
                cell: None,
                evidence: e.evidence.clone(),
            })
            .collect()
    }
}
