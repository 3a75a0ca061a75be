//! Document storage capability.
//!
//! Persistence is keyed JSON documents grouped in named collections. The
//! server only needs get/put/delete/list, so that is the whole trait.
//!
//! # Table design (redb)
//!
//! A single `DOCUMENTS` table keyed by `"<collection>\0<key>"`. Because `\0`
//! sorts before every other byte, a range scan from `"<collection>\0"` to
//! `"<collection>\x01"` returns exactly one collection.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use redb::{Database, ReadableTable, TableDefinition};
use serde_json::Value;

use crate::error::{LaunchpadError, Result};

pub trait DocumentStore: Send + Sync {
    fn get(&self, collection: &str, key: &str) -> Result<Option<Value>>;

    fn put(&self, collection: &str, key: &str, doc: &Value) -> Result<()>;

    /// Returns `true` if a document was removed.
    fn delete(&self, collection: &str, key: &str) -> Result<bool>;

    /// All `(key, document)` pairs of a collection, in key order.
    fn list(&self, collection: &str) -> Result<Vec<(String, Value)>>;
}

fn composite_key(collection: &str, key: &str) -> String {
    format!("{collection}\u{0}{key}")
}

fn collection_bounds(collection: &str) -> (String, String) {
    (format!("{collection}\u{0}"), format!("{collection}\u{1}"))
}

fn strip_collection<'a>(collection: &str, composite: &'a str) -> &'a str {
    &composite[collection.len() + 1..]
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process store. Used by tests and by `serve` without `--db`.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Value>>> {
        self.docs
            .lock()
            .map_err(|_| LaunchpadError::Store("memory store lock poisoned".into()))
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        Ok(self.lock()?.get(&composite_key(collection, key)).cloned())
    }

    fn put(&self, collection: &str, key: &str, doc: &Value) -> Result<()> {
        self.lock()?
            .insert(composite_key(collection, key), doc.clone());
        Ok(())
    }

    fn delete(&self, collection: &str, key: &str) -> Result<bool> {
        Ok(self
            .lock()?
            .remove(&composite_key(collection, key))
            .is_some())
    }

    fn list(&self, collection: &str) -> Result<Vec<(String, Value)>> {
        let (start, end) = collection_bounds(collection);
        Ok(self
            .lock()?
            .range(start..end)
            .map(|(k, v)| (strip_collection(collection, k).to_string(), v.clone()))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// RedbStore
// ---------------------------------------------------------------------------

/// Key: `collection\0key`
/// Value: JSON-encoded document
const DOCUMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("documents");

fn store_err(e: impl std::fmt::Display) -> LaunchpadError {
    LaunchpadError::Store(e.to_string())
}

/// Persistent store backed by a single redb file.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create the database at `path`, creating the table if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Database::create(path).map_err(store_err)?;
        let wt = db.begin_write().map_err(store_err)?;
        wt.open_table(DOCUMENTS).map_err(store_err)?;
        wt.commit().map_err(store_err)?;
        Ok(Self { db })
    }
}

impl DocumentStore for RedbStore {
    fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(DOCUMENTS).map_err(store_err)?;
        let composite = composite_key(collection, key);
        match table.get(composite.as_str()).map_err(store_err)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    fn put(&self, collection: &str, key: &str, doc: &Value) -> Result<()> {
        let bytes = serde_json::to_vec(doc)?;
        let composite = composite_key(collection, key);
        let wt = self.db.begin_write().map_err(store_err)?;
        {
            let mut table = wt.open_table(DOCUMENTS).map_err(store_err)?;
            table
                .insert(composite.as_str(), bytes.as_slice())
                .map_err(store_err)?;
        }
        wt.commit().map_err(store_err)?;
        Ok(())
    }

    fn delete(&self, collection: &str, key: &str) -> Result<bool> {
        let composite = composite_key(collection, key);
        let wt = self.db.begin_write().map_err(store_err)?;
        let removed = {
            let mut table = wt.open_table(DOCUMENTS).map_err(store_err)?;
            let removed = table.remove(composite.as_str()).map_err(store_err)?;
            removed.is_some()
        };
        wt.commit().map_err(store_err)?;
        Ok(removed)
    }

    fn list(&self, collection: &str) -> Result<Vec<(String, Value)>> {
        let (start, end) = collection_bounds(collection);
        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(DOCUMENTS).map_err(store_err)?;
        let mut out = Vec::new();
        for item in table
            .range(start.as_str()..end.as_str())
            .map_err(store_err)?
        {
            let (k, v) = item.map_err(store_err)?;
            let key = strip_collection(collection, k.value()).to_string();
            out.push((key, serde_json::from_slice(v.value())?));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn exercise(store: &dyn DocumentStore) {
        assert_eq!(store.get("forms", "a@x.io").unwrap(), None);

        store.put("forms", "a@x.io", &json!({"n": 1})).unwrap();
        store.put("forms", "b@x.io", &json!({"n": 2})).unwrap();
        store.put("chats", "c-1", &json!({"n": 3})).unwrap();
        // Collection names sharing a prefix must not bleed into each other.
        store.put("forms_v2", "z", &json!({"n": 4})).unwrap();

        assert_eq!(store.get("forms", "a@x.io").unwrap(), Some(json!({"n": 1})));

        let forms = store.list("forms").unwrap();
        let keys: Vec<&str> = forms.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a@x.io", "b@x.io"]);

        store.put("forms", "a@x.io", &json!({"n": 10})).unwrap();
        assert_eq!(store.get("forms", "a@x.io").unwrap(), Some(json!({"n": 10})));

        assert!(store.delete("forms", "a@x.io").unwrap());
        assert!(!store.delete("forms", "a@x.io").unwrap());
        assert_eq!(store.list("forms").unwrap().len(), 1);
        assert_eq!(store.list("chats").unwrap().len(), 1);
    }

    #[test]
    fn memory_store_contract() {
        exercise(&MemoryStore::new());
    }

    #[test]
    fn redb_store_contract() {
        let dir = TempDir::new().unwrap();
        let store = RedbStore::open(&dir.path().join("launchpad.redb")).unwrap();
        exercise(&store);
    }

    #[test]
    fn redb_store_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("launchpad.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            store.put("forms", "k", &json!({"saved": true})).unwrap();
        }
        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.get("forms", "k").unwrap(), Some(json!({"saved": true})));
    }
}
