//! Graph store trait and the queries built on it

use crate::{AxiomRecord, Result};
use axiom_model::{Axiom, Idiom, Pairing, PairingCollection};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Layers whose axioms ground a proof chain
pub const FOUNDATION_LAYERS: &[&str] = &[
    "c11_core",
    "c11_stdlib",
    "cpp_core",
    "cpp_stdlib",
    "cpp20_language",
    "cpp20_stdlib",
];

/// Longest dependency path followed by [`GraphStore::proof_chain`]
pub const MAX_PROOF_DEPTH: usize = 10;

/// Pluggable graph storage for axioms, pairings and idioms
///
/// Backends implement the primitive operations; merge-by-id loading and
/// the graph queries are provided on top of them.
pub trait GraphStore: Send + Sync {
    // ========== Core KV Operations ==========

    fn get(&self, id: &str) -> Result<Option<AxiomRecord>>;

    /// Store a record, replacing any previous one with the same id
    fn put(&mut self, record: &AxiomRecord) -> Result<()>;

    fn delete(&mut self, id: &str) -> Result<()>;

    /// Sorted ids starting with `prefix`
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    // ========== Indexed Queries ==========

    fn query_by_function(&self, function: &str) -> Result<Vec<AxiomRecord>>;

    fn query_by_header(&self, header: &str) -> Result<Vec<AxiomRecord>>;

    fn query_by_module(&self, module: &str) -> Result<Vec<AxiomRecord>>;

    fn query_by_layer(&self, layer: &str) -> Result<Vec<AxiomRecord>>;

    /// Axioms whose `depends_on` names `id`
    fn dependents(&self, id: &str) -> Result<Vec<AxiomRecord>>;

    // ========== Edges ==========

    /// Store a pairing edge keyed by (opener, closer)
    fn put_pairing(&mut self, pairing: &Pairing) -> Result<()>;

    fn pairings(&self) -> Result<Vec<Pairing>>;

    /// Pairings with `id` at either end
    fn pairings_of(&self, id: &str) -> Result<Vec<Pairing>>;

    fn put_idiom(&mut self, idiom: &Idiom) -> Result<()>;

    fn get_idiom(&self, id: &str) -> Result<Option<Idiom>>;

    fn idioms(&self) -> Result<Vec<Idiom>>;

    /// Idioms `axiom_id` participates in
    fn idioms_for(&self, axiom_id: &str) -> Result<Vec<Idiom>>;

    // ========== Maintenance Operations ==========

    /// Rebuild all secondary indexes from primary storage
    fn rebuild_indexes(&mut self) -> Result<()>;

    fn compact(&mut self) -> Result<()>;

    // ========== Provided ==========

    fn get_axiom(&self, id: &str) -> Result<Option<Axiom>> {
        Ok(self.get(id)?.map(|record| record.to_axiom()))
    }

    /// Merge an axiom by id; returns the stored version
    ///
    /// Pairing and idiom edges live apart from the record and survive.
    fn upsert_axiom(&mut self, axiom: &Axiom) -> Result<u64> {
        let mut record = AxiomRecord::from(axiom);
        if let Some(existing) = self.get(&axiom.id)? {
            record.version = existing.version + 1;
        }
        self.put(&record)?;
        Ok(record.version)
    }

    fn load_axioms(&mut self, axioms: &[Axiom]) -> Result<usize> {
        for axiom in axioms {
            self.upsert_axiom(axiom)?;
        }
        Ok(axioms.len())
    }

    /// Link opener to closer; `false` when either axiom is unknown
    fn load_pairing(&mut self, pairing: &Pairing) -> Result<bool> {
        if self.get(&pairing.opener_id)?.is_none() || self.get(&pairing.closer_id)?.is_none() {
            debug!(
                opener = %pairing.opener_id,
                closer = %pairing.closer_id,
                "skipping pairing with unknown endpoint"
            );
            return Ok(false);
        }
        self.put_pairing(pairing)?;
        Ok(true)
    }

    /// Store an idiom; returns how many participants are known axioms
    fn load_idiom(&mut self, idiom: &Idiom) -> Result<usize> {
        self.put_idiom(idiom)?;
        let mut linked = 0;
        for participant in &idiom.participants {
            if self.get(participant)?.is_some() {
                linked += 1;
            }
        }
        Ok(linked)
    }

    fn load_pairings(&mut self, collection: &PairingCollection) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        for pairing in &collection.pairings {
            if self.load_pairing(pairing)? {
                report.pairings_loaded += 1;
            } else {
                report.pairings_skipped += 1;
            }
        }
        for idiom in &collection.idioms {
            self.load_idiom(idiom)?;
            report.idioms_loaded += 1;
        }
        Ok(report)
    }

    /// Direct dependencies that exist in the store
    fn dependencies(&self, id: &str) -> Result<Vec<AxiomRecord>> {
        let Some(record) = self.get(id)? else {
            return Ok(Vec::new());
        };
        let mut found = Vec::new();
        for target in &record.depends_on {
            if let Some(dep) = self.get(target)? {
                found.push(dep);
            }
        }
        Ok(found)
    }

    /// Axioms on the other end of `id`'s pairings
    fn paired_with(&self, id: &str) -> Result<Vec<AxiomRecord>> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for pairing in self.pairings_of(id)? {
            let other = if pairing.opener_id == id {
                pairing.closer_id
            } else {
                pairing.opener_id
            };
            if seen.insert(other.clone()) {
                if let Some(record) = self.get(&other)? {
                    found.push(record);
                }
            }
        }
        Ok(found)
    }

    /// Deepest acyclic dependency path from `id` to a foundation axiom
    ///
    /// Starts with `id` itself; empty when no path reaches a foundation
    /// layer within [`MAX_PROOF_DEPTH`] edges.
    fn proof_chain(&self, id: &str) -> Result<Vec<AxiomRecord>> {
        let Some(start) = self.get(id)? else {
            return Ok(Vec::new());
        };
        let mut path = vec![start];
        let mut best = Vec::new();
        deepest_path(self, &mut path, &mut best)?;
        Ok(best)
    }

    /// Axioms of `layer` with no dependency that resolves in the store
    fn ungrounded(&self, layer: &str) -> Result<Vec<AxiomRecord>> {
        let mut found = Vec::new();
        for record in self.query_by_layer(layer)? {
            let mut grounded = false;
            for target in &record.depends_on {
                if self.get(target)?.is_some() {
                    grounded = true;
                    break;
                }
            }
            if !grounded {
                found.push(record);
            }
        }
        Ok(found)
    }

    /// Check graph integrity
    fn verify(&self) -> Result<Vec<InvariantViolation>> {
        let mut violations = Vec::new();

        for id in self.list("")? {
            let Some(record) = self.get(&id)? else { continue };
            for target in &record.depends_on {
                if *target == id {
                    violations.push(InvariantViolation::new("self_dependency", &id, "depends on itself"));
                } else if self.get(target)?.is_none() {
                    violations.push(InvariantViolation::new(
                        "dangling_dependency",
                        &id,
                        format!("depends on non-existent axiom {target}"),
                    ));
                }
            }
        }

        for pairing in self.pairings()? {
            if pairing.opener_id == pairing.closer_id {
                violations.push(InvariantViolation::new("self_pairing", &pairing.opener_id, "pairs with itself"));
            }
            for end in [&pairing.opener_id, &pairing.closer_id] {
                if self.get(end)?.is_none() {
                    violations.push(InvariantViolation::new(
                        "dangling_pairing",
                        end,
                        format!("pairing {} -> {} has no axiom {end}", pairing.opener_id, pairing.closer_id),
                    ));
                }
            }
        }

        for idiom in self.idioms()? {
            for participant in &idiom.participants {
                if self.get(participant)?.is_none() {
                    violations.push(InvariantViolation::new(
                        "dangling_participant",
                        &idiom.id,
                        format!("participant {participant} does not exist"),
                    ));
                }
            }
        }

        Ok(violations)
    }

    fn stats(&self) -> Result<StorageStats> {
        let mut stats = StorageStats::default();
        for id in self.list("")? {
            let Some(record) = self.get(&id)? else { continue };
            stats.axioms += 1;
            *stats.by_layer.entry(record.layer.clone()).or_default() += 1;
            for target in &record.depends_on {
                if self.get(target)?.is_some() {
                    stats.dependency_edges += 1;
                }
            }
        }
        stats.pairings = self.pairings()?.len();
        stats.idioms = self.idioms()?.len();
        Ok(stats)
    }
}

fn deepest_path<S: GraphStore + ?Sized>(
    store: &S,
    path: &mut Vec<AxiomRecord>,
    best: &mut Vec<AxiomRecord>,
) -> Result<()> {
    let Some(current) = path.last() else {
        return Ok(());
    };
    if path.len() > 1
        && path.len() > best.len()
        && FOUNDATION_LAYERS.contains(&current.layer.as_str())
    {
        *best = path.clone();
    }
    if path.len() > MAX_PROOF_DEPTH {
        return Ok(());
    }
    let targets = current.depends_on.clone();
    for target in targets {
        if path.iter().any(|r| r.id == target) {
            continue;
        }
        if let Some(next) = store.get(&target)? {
            path.push(next);
            deepest_path(store, path, best)?;
            path.pop();
        }
    }
    Ok(())
}

/// Counts from [`GraphStore::load_pairings`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub pairings_loaded: usize,
    pub pairings_skipped: usize,
    pub idioms_loaded: usize,
}

/// A broken graph edge found by [`GraphStore::verify`]
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    pub invariant: String,
    pub node_id: String,
    pub description: String,
}

impl InvariantViolation {
    fn new(invariant: &str, node_id: &str, description: impl Into<String>) -> Self {
        Self {
            invariant: invariant.to_string(),
            node_id: node_id.to_string(),
            description: description.into(),
        }
    }
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.invariant, self.node_id, self.description)
    }
}

/// Storage statistics
#[derive(Debug, Clone, Default)]
pub struct StorageStats {
    pub axioms: usize,
    pub dependency_edges: usize,
    pub pairings: usize,
    pub idioms: usize,
    pub by_layer: BTreeMap<String, usize>,
}

impl std::fmt::Display for StorageStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Storage Statistics:")?;
        writeln!(f, "  Axioms: {}", self.axioms)?;
        for (layer, count) in &self.by_layer {
            writeln!(f, "    {layer}: {count}")?;
        }
        writeln!(f, "  Dependency edges: {}", self.dependency_edges)?;
        writeln!(f, "  Pairings: {}", self.pairings)?;
        writeln!(f, "  Idioms: {}", self.idioms)?;
        Ok(())
    }
}
