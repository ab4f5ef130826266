//! Shared fixture builders used by the integration tests in this directory.
//! Mirrors the shape of the corpus's own `tests/test_utils` tree: a log
//! initializer, a schema builder, and a populated-table builder that goes
//! through real `HeapPage`/`HeapFile` serialization rather than a shortcut.

use std::sync::Arc;

use small_reldb::catalog::Catalog;
use small_reldb::field::{Field, Type, TupleDesc, TupleDescItem};
use small_reldb::heap_file::HeapFile;
use small_reldb::transaction::Transaction;
use small_reldb::tuple::Tuple;
use small_reldb::BufferPool;

#[allow(dead_code)]
pub fn init_log() {
    small_reldb::logging::init_logging();
}

/// An all-`INT` tuple descriptor with generated field names `{prefix}0`,
/// `{prefix}1`, ...
#[allow(dead_code)]
pub fn simple_int_tuple_desc(columns: usize, prefix: &str) -> Arc<TupleDesc> {
    let items = (0..columns)
        .map(|i| TupleDescItem::new(Type::Int, Some(format!("{prefix}{i}"))))
        .collect();
    Arc::new(TupleDesc::new(items).unwrap())
}

/// Creates a scratch heap file under a fresh temporary directory (so
/// parallel tests never collide on a shared path) and registers it with
/// `catalog`. The `TempDir` must be kept alive for as long as the table is
/// used; callers bind it to `_dir` rather than dropping it.
#[allow(dead_code)]
pub fn new_empty_table(catalog: &Catalog, desc: Arc<TupleDesc>, name: &str) -> (i64, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let file = Arc::new(HeapFile::new(dir.path().join(format!("{name}.dat")), desc).unwrap());
    let id = file.id();
    catalog.add_table(file, name, None);
    (id, dir)
}

/// Inserts `rows` (each an all-int row) into `table_id` through
/// `BufferPool::insert_tuple` under one committed transaction, exercising
/// the same byte-exact path production code uses rather than poking bytes
/// directly.
#[allow(dead_code)]
pub fn populate_int_table(pool: &BufferPool, desc: &Arc<TupleDesc>, table_id: i64, rows: &[Vec<i32>]) {
    let tx = Transaction::new();
    for row in rows {
        let fields = row.iter().map(|&v| Field::Int(v)).collect();
        let t = Tuple::from_fields(Arc::clone(desc), fields).unwrap();
        pool.insert_tuple(tx.id(), table_id, t).unwrap();
    }
    tx.commit(pool).unwrap();
}
