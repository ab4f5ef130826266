use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

use crate::error::{DbError, DbResult};

/// Deterministic table id derived from a file's canonical path: equal paths
/// produce equal ids across separate opens within (and across) process
/// runs, because `DefaultHasher::new()` always starts from the same fixed
/// seed rather than the per-process random seed `RandomState` uses.
pub fn table_id_from_path<P: AsRef<Path>>(path: P) -> DbResult<i64> {
    let canonical = std::fs::canonicalize(path.as_ref())
        .map_err(|e| DbError::PageReadError(format!("cannot canonicalize path: {e}")))?;
    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);
    Ok(hasher.finish() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_path_hashes_equal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.dat");
        std::fs::write(&path, b"").unwrap();
        let a = table_id_from_path(&path).unwrap();
        let b = table_id_from_path(&path).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_paths_hash_differently() {
        let dir = tempfile::tempdir().unwrap();
        let a_path = dir.path().join("a.dat");
        let b_path = dir.path().join("b.dat");
        std::fs::write(&a_path, b"").unwrap();
        std::fs::write(&b_path, b"").unwrap();
        let a = table_id_from_path(&a_path).unwrap();
        let b = table_id_from_path(&b_path).unwrap();
        assert_ne!(a, b);
    }
}
