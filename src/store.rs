//! Document store adapter for CABINET.
//!
//! Records live in named collections, one pretty-printed JSON file per
//! collection, keyed by record id. Every successful `put`/`delete` is
//! durable before it returns: the collection file is rewritten through a
//! temp file, fsynced, and atomically renamed into place. The adapter
//! offers no cross-record transactions; multi-record atomicity is the
//! namespace engine's job.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::{CabinetError, Result};

type Table = BTreeMap<String, Value>;

/// A lightweight document store over a directory of JSON collection files.
///
/// Collections are loaded on first access and cached; the cache is the
/// read view, the files are the ground truth rewritten on every mutation.
#[derive(Debug)]
pub struct DocumentStore {
    dir: PathBuf,
    collections: Mutex<HashMap<String, Table>>,
}

impl DocumentStore {
    /// Open a store rooted at the given directory, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| CabinetError::Store(format!("create {}: {e}", dir.display())))?;

        Ok(Self {
            dir,
            collections: Mutex::new(HashMap::new()),
        })
    }

    /// The directory holding the collection files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Insert or replace a record.
    pub fn put<T: Serialize>(&self, collection: &str, id: &str, record: &T) -> Result<()> {
        let value = serde_json::to_value(record)
            .map_err(|e| CabinetError::Store(format!("serialize {collection}/{id}: {e}")))?;

        let mut cache = self.cache()?;
        let table = Self::table(&self.dir, &mut cache, collection)?;
        table.insert(id.to_string(), value);
        self.persist(collection, table)
    }

    /// Get a record by id, decoded into its typed shape.
    pub fn get<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>> {
        let mut cache = self.cache()?;
        let table = Self::table(&self.dir, &mut cache, collection)?;

        match table.get(id) {
            None => Ok(None),
            Some(value) => decode(collection, id, value).map(Some),
        }
    }

    /// Delete a record by id. Returns `true` if a record was removed.
    pub fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let mut cache = self.cache()?;
        let table = Self::table(&self.dir, &mut cache, collection)?;

        if table.remove(id).is_none() {
            return Ok(false);
        }
        self.persist(collection, table)?;
        Ok(true)
    }

    /// Query a collection, returning every record matching the predicate.
    pub fn query<T, F>(&self, collection: &str, predicate: F) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        let mut cache = self.cache()?;
        let table = Self::table(&self.dir, &mut cache, collection)?;

        let mut records = Vec::new();
        for (id, value) in table.iter() {
            let record: T = decode(collection, id, value)?;
            if predicate(&record) {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn cache(&self) -> Result<MutexGuard<'_, HashMap<String, Table>>> {
        self.collections
            .lock()
            .map_err(|_| CabinetError::Store("store lock poisoned".to_string()))
    }

    /// Get the cached table for a collection, loading its file on first use.
    fn table<'a>(
        dir: &Path,
        cache: &'a mut HashMap<String, Table>,
        collection: &str,
    ) -> Result<&'a mut Table> {
        match cache.entry(collection.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(Self::load(dir, collection)?)),
        }
    }

    fn load(dir: &Path, collection: &str) -> Result<Table> {
        let path = Self::collection_path(dir, collection);
        if !path.exists() {
            return Ok(Table::new());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| CabinetError::Store(format!("read {}: {e}", path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| CabinetError::Corrupt(format!("collection {collection}: {e}")))
    }

    /// Rewrite a collection file durably: temp file, fsync, atomic rename.
    fn persist(&self, collection: &str, table: &Table) -> Result<()> {
        let path = Self::collection_path(&self.dir, collection);
        let tmp = self.dir.join(format!("{collection}.json.tmp"));

        let write = |tmp: &Path| -> std::io::Result<()> {
            let mut file = File::create(tmp)?;
            serde_json::to_writer_pretty(&mut file, table)
                .map_err(|e| std::io::Error::other(e.to_string()))?;
            file.write_all(b"\n")?;
            file.sync_all()?;
            Ok(())
        };

        write(&tmp).map_err(|e| CabinetError::Store(format!("write {collection}: {e}")))?;
        fs::rename(&tmp, &path)
            .map_err(|e| CabinetError::Store(format!("commit {collection}: {e}")))?;
        Ok(())
    }

    fn collection_path(dir: &Path, collection: &str) -> PathBuf {
        dir.join(format!("{collection}.json"))
    }
}

fn decode<T: DeserializeOwned>(collection: &str, id: &str, value: &Value) -> Result<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| CabinetError::Corrupt(format!("{collection}/{id}: {e}")))
}
