//! redb-based persistent storage implementation

use crate::record::{pairing_key, PairingRecord};
use crate::{AxiomRecord, GraphStore, IndexKind, Result};
use axiom_model::{Idiom, Pairing};
use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

type Bytes = TableDefinition<'static, &'static str, &'static [u8]>;

// Table definitions
const AXIOMS_TABLE: Bytes = TableDefinition::new("axioms");
const PAIRINGS_TABLE: Bytes = TableDefinition::new("pairings");
const IDIOMS_TABLE: Bytes = TableDefinition::new("idioms");
/// Axiom id -> keys of pairings touching it
const PAIRED_INDEX: Bytes = TableDefinition::new("paired_index");
/// Axiom id -> ids of idioms it participates in
const PARTICIPANT_INDEX: Bytes = TableDefinition::new("participant_index");

fn index_table(kind: IndexKind) -> Bytes {
    TableDefinition::new(kind.table_name())
}

/// redb-based persistent storage
///
/// Provides ACID-compliant persistent storage using redb embedded database.
/// All data is stored in a single `.redb` file with automatic crash recovery.
/// Values are bincode; secondary index values are bincode id sets.
pub struct RedbStorage {
    db: Database,
    path: PathBuf,
}

impl RedbStorage {
    /// Create or open a redb storage at the given path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(&path)?;

        // Initialize tables
        let write_txn = db.begin_write()?;
        {
            for table in [AXIOMS_TABLE, PAIRINGS_TABLE, IDIOMS_TABLE, PAIRED_INDEX, PARTICIPANT_INDEX] {
                write_txn.open_table(table)?;
            }
            for kind in IndexKind::ALL {
                write_txn.open_table(index_table(kind))?;
            }
        }
        write_txn.commit()?;

        Ok(Self { db, path })
    }

    /// Get the file path of this storage
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_set(&self, table: Bytes, key: &str) -> Result<BTreeSet<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        let ids = match table.get(key)? {
            Some(bytes) => bincode::deserialize(bytes.value())?,
            None => BTreeSet::new(),
        };
        Ok(ids)
    }

    fn records_for(&self, ids: BTreeSet<String>) -> Result<Vec<AxiomRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AXIOMS_TABLE)?;
        let mut results = Vec::new();
        for id in ids {
            if let Some(bytes) = table.get(id.as_str())? {
                results.push(bincode::deserialize(bytes.value())?);
            }
        }
        Ok(results)
    }

    fn query(&self, kind: IndexKind, key: &str) -> Result<Vec<AxiomRecord>> {
        let ids = self.read_set(index_table(kind), key)?;
        self.records_for(ids)
    }
}

/// Add `id` to the set stored under `key`
fn set_insert(txn: &WriteTransaction, table: Bytes, key: &str, id: &str) -> Result<()> {
    let mut table = txn.open_table(table)?;
    let mut ids: BTreeSet<String> = match table.get(key)? {
        Some(bytes) => bincode::deserialize(bytes.value())?,
        None => BTreeSet::new(),
    };
    if ids.insert(id.to_string()) {
        let bytes = bincode::serialize(&ids)?;
        table.insert(key, bytes.as_slice())?;
    }
    Ok(())
}

/// Remove `id` from the set stored under `key`, dropping empty sets
fn set_remove(txn: &WriteTransaction, table: Bytes, key: &str, id: &str) -> Result<()> {
    let mut table = txn.open_table(table)?;
    let data = table.get(key)?.map(|bytes| bytes.value().to_vec());
    if let Some(data) = data {
        let mut ids: BTreeSet<String> = bincode::deserialize(&data)?;
        ids.remove(id);
        if ids.is_empty() {
            table.remove(key)?;
        } else {
            let bytes = bincode::serialize(&ids)?;
            table.insert(key, bytes.as_slice())?;
        }
    }
    Ok(())
}

fn clear_table(txn: &WriteTransaction, table: Bytes) -> Result<()> {
    let mut table = txn.open_table(table)?;
    let keys: Vec<String> = table
        .iter()?
        .map(|r| r.map(|(k, _)| k.value().to_string()))
        .collect::<std::result::Result<_, _>>()?;
    for key in keys {
        table.remove(key.as_str())?;
    }
    Ok(())
}

fn index_record(txn: &WriteTransaction, record: &AxiomRecord) -> Result<()> {
    for (kind, key) in record.index_keys() {
        set_insert(txn, index_table(kind), key, &record.id)?;
    }
    Ok(())
}

fn unindex_record(txn: &WriteTransaction, record: &AxiomRecord) -> Result<()> {
    for (kind, key) in record.index_keys() {
        set_remove(txn, index_table(kind), key, &record.id)?;
    }
    Ok(())
}

fn take_record(txn: &WriteTransaction, id: &str) -> Result<Option<AxiomRecord>> {
    let table = txn.open_table(AXIOMS_TABLE)?;
    let data = table.get(id)?.map(|bytes| bytes.value().to_vec());
    drop(table);
    match data {
        Some(data) => Ok(Some(bincode::deserialize(&data)?)),
        None => Ok(None),
    }
}

impl GraphStore for RedbStorage {
    fn get(&self, id: &str) -> Result<Option<AxiomRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AXIOMS_TABLE)?;

        match table.get(id)? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes.value())?)),
            None => Ok(None),
        }
    }

    fn put(&mut self, record: &AxiomRecord) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            if let Some(old) = take_record(&write_txn, &record.id)? {
                unindex_record(&write_txn, &old)?;
            }

            let bytes = bincode::serialize(record)?;
            let mut table = write_txn.open_table(AXIOMS_TABLE)?;
            table.insert(record.id.as_str(), bytes.as_slice())?;
            drop(table);

            index_record(&write_txn, record)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            if let Some(old) = take_record(&write_txn, id)? {
                unindex_record(&write_txn, &old)?;
                let mut table = write_txn.open_table(AXIOMS_TABLE)?;
                table.remove(id)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AXIOMS_TABLE)?;

        let mut ids = Vec::new();
        for entry in table.iter()? {
            let (key, _) = entry?;
            let key_str = key.value();
            if key_str.starts_with(prefix) {
                ids.push(key_str.to_string());
            }
        }

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
        let key = pairing_key(&pairing.opener_id, &pairing.closer_id);
        let write_txn = self.db.begin_write()?;
        {
            let bytes = bincode::serialize(&PairingRecord::from(pairing))?;
            let mut table = write_txn.open_table(PAIRINGS_TABLE)?;
            table.insert(key.as_str(), bytes.as_slice())?;
            drop(table);

            set_insert(&write_txn, PAIRED_INDEX, &pairing.opener_id, &key)?;
            set_insert(&write_txn, PAIRED_INDEX, &pairing.closer_id, &key)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn pairings(&self) -> Result<Vec<Pairing>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PAIRINGS_TABLE)?;
        let mut pairings = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let record: PairingRecord = bincode::deserialize(value.value())?;
            pairings.push(record.into());
        }
        Ok(pairings)
    }

    fn pairings_of(&self, id: &str) -> Result<Vec<Pairing>> {
        let keys = self.read_set(PAIRED_INDEX, id)?;
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PAIRINGS_TABLE)?;
        let mut pairings = Vec::new();
        for key in keys {
            if let Some(bytes) = table.get(key.as_str())? {
                let record: PairingRecord = bincode::deserialize(bytes.value())?;
                pairings.push(record.into());
            }
        }
        Ok(pairings)
    }

    fn put_idiom(&mut self, idiom: &Idiom) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let table = write_txn.open_table(IDIOMS_TABLE)?;
            let previous = table.get(idiom.id.as_str())?.map(|bytes| bytes.value().to_vec());
            drop(table);
            if let Some(data) = previous {
                let old: Idiom = bincode::deserialize(&data)?;
                for participant in &old.participants {
                    set_remove(&write_txn, PARTICIPANT_INDEX, participant, &old.id)?;
                }
            }

            let bytes = bincode::serialize(idiom)?;
            let mut table = write_txn.open_table(IDIOMS_TABLE)?;
            table.insert(idiom.id.as_str(), bytes.as_slice())?;
            drop(table);

            for participant in &idiom.participants {
                set_insert(&write_txn, PARTICIPANT_INDEX, participant, &idiom.id)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get_idiom(&self, id: &str) -> Result<Option<Idiom>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(IDIOMS_TABLE)?;
        match table.get(id)? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes.value())?)),
            None => Ok(None),
        }
    }

    fn idioms(&self) -> Result<Vec<Idiom>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(IDIOMS_TABLE)?;
        let mut idioms = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            idioms.push(bincode::deserialize(value.value())?);
        }
        Ok(idioms)
    }

    fn idioms_for(&self, axiom_id: &str) -> Result<Vec<Idiom>> {
        let mut idioms = Vec::new();
        for id in self.read_set(PARTICIPANT_INDEX, axiom_id)? {
            if let Some(idiom) = self.get_idiom(&id)? {
                idioms.push(idiom);
            }
        }
        Ok(idioms)
    }

    fn rebuild_indexes(&mut self) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            for kind in IndexKind::ALL {
                clear_table(&write_txn, index_table(kind))?;
            }
            clear_table(&write_txn, PAIRED_INDEX)?;
            clear_table(&write_txn, PARTICIPANT_INDEX)?;

            // Rebuild from primary tables
            let axioms = write_txn.open_table(AXIOMS_TABLE)?;
            let records: Vec<Vec<u8>> = axioms
                .iter()?
                .map(|r| r.map(|(_, v)| v.value().to_vec()))
                .collect::<std::result::Result<_, _>>()?;
            drop(axioms);
            for bytes in records {
                let record: AxiomRecord = bincode::deserialize(&bytes)?;
                index_record(&write_txn, &record)?;
            }

            let pairings = write_txn.open_table(PAIRINGS_TABLE)?;
            let edges: Vec<(String, Vec<u8>)> = pairings
                .iter()?
                .map(|r| r.map(|(k, v)| (k.value().to_string(), v.value().to_vec())))
                .collect::<std::result::Result<_, _>>()?;
            drop(pairings);
            for (key, bytes) in edges {
                let record: PairingRecord = bincode::deserialize(&bytes)?;
                set_insert(&write_txn, PAIRED_INDEX, &record.opener_id, &key)?;
                set_insert(&write_txn, PAIRED_INDEX, &record.closer_id, &key)?;
            }

            let idioms = write_txn.open_table(IDIOMS_TABLE)?;
            let stored: Vec<Vec<u8>> = idioms
                .iter()?
                .map(|r| r.map(|(_, v)| v.value().to_vec()))
                .collect::<std::result::Result<_, _>>()?;
            drop(idioms);
            for bytes in stored {
                let idiom: Idiom = bincode::deserialize(&bytes)?;
                for participant in &idiom.participants {
                    set_insert(&write_txn, PARTICIPANT_INDEX, participant, &idiom.id)?;
                }
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    fn compact(&mut self) -> Result<()> {
        self.db.compact()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axiom_model::{Axiom, AxiomType, LineRange, SourceLocation};
    use tempfile::tempdir;

    fn axiom(id: &str) -> Axiom {
        let source = SourceLocation::new("library/stdlib.k", "LIBC-STDLIB", LineRange::single(1));
        let mut axiom = Axiom::new(id, "content", AxiomType::Effect, source);
        axiom.header = Some("stdlib.h".into());
        axiom
    }

    #[test]
    fn test_basic_crud() {
        let dir = tempdir().unwrap();
        let mut storage = RedbStorage::new(dir.path().join("test.redb")).unwrap();

        storage.upsert_axiom(&axiom("a1")).unwrap();
        assert_eq!(storage.get("a1").unwrap().unwrap().id, "a1");
        assert_eq!(storage.query_by_header("stdlib.h").unwrap().len(), 1);

        storage.delete("a1").unwrap();
        assert!(storage.get("a1").unwrap().is_none());
        assert!(storage.query_by_header("stdlib.h").unwrap().is_empty());
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("test.redb");

        {
            let mut storage = RedbStorage::new(&db_path).unwrap();
            storage.upsert_axiom(&axiom("a1")).unwrap();
        }

        {
            let storage = RedbStorage::new(&db_path).unwrap();
            assert_eq!(storage.get_axiom("a1").unwrap(), Some(axiom("a1")));
            assert_eq!(storage.path(), db_path.as_path());
        }
    }

    #[test]
    fn test_rebuild_and_compact() {
        let dir = tempdir().unwrap();
        let mut storage = RedbStorage::new(dir.path().join("test.redb")).unwrap();
        storage.upsert_axiom(&axiom("a1")).unwrap();
        storage.upsert_axiom(&axiom("a2")).unwrap();

        storage.rebuild_indexes().unwrap();
        assert_eq!(storage.query_by_module("LIBC-STDLIB").unwrap().len(), 2);
        storage.compact().unwrap();
        assert_eq!(storage.list("a").unwrap(), vec!["a1", "a2"]);
    }
}
