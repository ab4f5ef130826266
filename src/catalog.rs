use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use itertools::Itertools;
use log::info;

use crate::error::{DbError, DbResult};
use crate::field::TupleDesc;
use crate::heap_file::HeapFile;

struct TableEntry {
    file: Arc<HeapFile>,
    name: String,
    primary_key: Option<String>,
}

/// Maps table ids to their file and schema, and table names to ids. Built up
/// once at startup from already-parsed `(name, schema, file)` triples; there
/// is no catalog file parser here, since turning a schema text file into
/// `TupleDesc`s is a trivial, spec-external concern.
pub struct Catalog {
    by_id: RwLock<HashMap<i64, TableEntry>>,
    name_to_id: RwLock<HashMap<String, i64>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            by_id: RwLock::new(HashMap::new()),
            name_to_id: RwLock::new(HashMap::new()),
        }
    }

    pub fn add_table(&self, file: Arc<HeapFile>, name: &str, primary_key: Option<&str>) {
        let id = file.id();
        info!("catalog: registered table '{name}' (id {id})");
        self.by_id.write().unwrap().insert(
            id,
            TableEntry {
                file,
                name: name.to_string(),
                primary_key: primary_key.map(|s| s.to_string()),
            },
        );
        self.name_to_id.write().unwrap().insert(name.to_string(), id);
    }

    pub fn table_id(&self, name: &str) -> DbResult<i64> {
        self.name_to_id
            .read()
            .unwrap()
            .get(name)
            .copied()
            .ok_or_else(|| DbError::NoSuchTable(name.to_string()))
    }

    pub fn file(&self, table_id: i64) -> DbResult<Arc<HeapFile>> {
        self.by_id
            .read()
            .unwrap()
            .get(&table_id)
            .map(|e| Arc::clone(&e.file))
            .ok_or_else(|| DbError::NoSuchTable(table_id.to_string()))
    }

    pub fn tuple_desc(&self, table_id: i64) -> DbResult<Arc<TupleDesc>> {
        Ok(self.file(table_id)?.tuple_desc())
    }

    pub fn primary_key(&self, table_id: i64) -> DbResult<Option<String>> {
        self.by_id
            .read()
            .unwrap()
            .get(&table_id)
            .map(|e| e.primary_key.clone())
            .ok_or_else(|| DbError::NoSuchTable(table_id.to_string()))
    }

    pub fn table_name(&self, table_id: i64) -> DbResult<String> {
        self.by_id
            .read()
            .unwrap()
            .get(&table_id)
            .map(|e| e.name.clone())
            .ok_or_else(|| DbError::NoSuchTable(table_id.to_string()))
    }

    /// Sorted so callers iterating every table (e.g. a future `flush_all`)
    /// see a stable, reproducible order rather than `HashMap` iteration
    /// order.
    pub fn table_ids(&self) -> Vec<i64> {
        self.by_id.read().unwrap().keys().copied().sorted().collect()
    }

    pub fn clear(&self) {
        self.by_id.write().unwrap().clear();
        self.name_to_id.write().unwrap().clear();
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
