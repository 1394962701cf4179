//! In-memory storage implementation for testing

use crate::record::pairing_key;
use crate::{AxiomRecord, GraphStore, IndexKind, Result, StorageError};
use axiom_model::{Idiom, Pairing};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

type SecondaryIndex = HashMap<(IndexKind, String), BTreeSet<String>>;

/// In-memory storage implementation
///
/// Fast, non-persistent storage primarily for testing.
/// All data is lost when the storage is dropped.
#[derive(Default)]
pub struct InMemoryStorage {
    axioms: Arc<RwLock<HashMap<String, AxiomRecord>>>,
    index: Arc<RwLock<SecondaryIndex>>,
    pairings: Arc<RwLock<BTreeMap<String, Pairing>>>,
    idioms: Arc<RwLock<BTreeMap<String, Idiom>>>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| StorageError::LockPoisoned)
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| StorageError::LockPoisoned)
}

impl InMemoryStorage {
    /// Create a new empty in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    fn update_indexes(&self, record: &AxiomRecord) -> Result<()> {
        let mut index = write(&self.index)?;
        for (kind, key) in record.index_keys() {
            index
                .entry((kind, key.to_string()))
                .or_default()
                .insert(record.id.clone());
        }
        Ok(())
    }

    fn remove_from_indexes(&self, record: &AxiomRecord) -> Result<()> {
        let mut index = write(&self.index)?;
        for (kind, key) in record.index_keys() {
            let entry = (kind, key.to_string());
            if let Some(ids) = index.get_mut(&entry) {
                ids.remove(&record.id);
                if ids.is_empty() {
                    index.remove(&entry);
                }
            }
        }
        Ok(())
    }

    fn query(&self, kind: IndexKind, key: &str) -> Result<Vec<AxiomRecord>> {
        let index = read(&self.index)?;
        let Some(ids) = index.get(&(kind, key.to_string())) else {
            return Ok(Vec::new());
        };
        let axioms = read(&self.axioms)?;
        Ok(ids.iter().filter_map(|id| axioms.get(id).cloned()).collect())
    }
}

impl GraphStore for InMemoryStorage {
    fn get(&self, id: &str) -> Result<Option<AxiomRecord>> {
        Ok(read(&self.axioms)?.get(id).cloned())
    }

    fn put(&mut self, record: &AxiomRecord) -> Result<()> {
        // Remove old version from indexes if it exists
        let old = read(&self.axioms)?.get(&record.id).cloned();
        if let Some(old) = old {
            self.remove_from_indexes(&old)?;
        }
        write(&self.axioms)?.insert(record.id.clone(), record.clone());
        self.update_indexes(record)
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        let removed = write(&self.axioms)?.remove(id);
        if let Some(record) = removed {
            self.remove_from_indexes(&record)?;
        }
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let axioms = read(&self.axioms)?;
        let mut ids: Vec<String> = axioms
            .keys()
            .filter(|id| id.starts_with(prefix))
            .cloned()
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn query_by_function(&self, function: &str) -> Result<Vec<AxiomRecord>> {
        self.query(IndexKind::Function, function)
    }

    fn query_by_header(&self, header: &str) -> Result<Vec<AxiomRecord>> {
        self.query(IndexKind::Header, header)
    }

    fn query_by_module(&self, module: &str) -> Result<Vec<AxiomRecord>> {
        self.query(IndexKind::Module, module)
    }

    fn query_by_layer(&self, layer: &str) -> Result<Vec<AxiomRecord>> {
        self.query(IndexKind::Layer, layer)
    }

    fn dependents(&self, id: &str) -> Result<Vec<AxiomRecord>> {
        self.query(IndexKind::Dependents, id)
    }

    fn put_pairing(&mut self, pairing: &Pairing) -> Result<()> {
        write(&self.pairings)?.insert(pairing_key(&pairing.opener_id, &pairing.closer_id), pairing.clone());
        Ok(())
    }

    fn pairings(&self) -> Result<Vec<Pairing>> {
        Ok(read(&self.pairings)?.values().cloned().collect())
    }

    fn pairings_of(&self, id: &str) -> Result<Vec<Pairing>> {
        Ok(read(&self.pairings)?
            .values()
            .filter(|p| p.opener_id == id || p.closer_id == id)
            .cloned()
            .collect())
    }

    fn put_idiom(&mut self, idiom: &Idiom) -> Result<()> {
        write(&self.idioms)?.insert(idiom.id.clone(), idiom.clone());
        Ok(())
    }

    fn get_idiom(&self, id: &str) -> Result<Option<Idiom>> {
        Ok(read(&self.idioms)?.get(id).cloned())
    }

    fn idioms(&self) -> Result<Vec<Idiom>> {
        Ok(read(&self.idioms)?.values().cloned().collect())
    }

    fn idioms_for(&self, axiom_id: &str) -> Result<Vec<Idiom>> {
        Ok(read(&self.idioms)?
            .values()
            .filter(|i| i.participants.iter().any(|p| p == axiom_id))
            .cloned()
            .collect())
    }

    fn rebuild_indexes(&mut self) -> Result<()> {
        write(&self.index)?.clear();
        let records: Vec<AxiomRecord> = read(&self.axioms)?.values().cloned().collect();
        for record in &records {
            self.update_indexes(record)?;
        }
        Ok(())
    }

    fn compact(&mut self) -> Result<()> {
        // No-op for in-memory storage (no fragmentation)
        Ok(())
    }
}
