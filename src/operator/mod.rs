pub mod aggregate;
pub mod delete;
pub mod filter;
pub mod insert;
pub mod join;
pub mod order_by;
pub mod predicate;
pub mod seq_scan;
pub mod tuple_iterator;

use std::sync::Arc;

use crate::error::{DbError, DbResult};
use crate::field::TupleDesc;
use crate::tuple::Tuple;

/// The pull-based query operator interface every node of a plan tree
/// implements. `open` must run before `has_next`/`next`; `close` releases
/// whatever resources `open` acquired and makes the operator safe to
/// `open` again from scratch. `rewind` restarts the same open operator at
/// its first tuple without giving up its resources.
pub trait Operator {
    fn open(&mut self) -> DbResult<()>;
    fn close(&mut self) -> DbResult<()>;
    fn rewind(&mut self) -> DbResult<()>;
    fn has_next(&mut self) -> DbResult<bool>;
    fn next(&mut self) -> DbResult<Tuple>;
    fn tuple_desc(&self) -> Arc<TupleDesc>;
}

/// Materializes every tuple `op` produces into a `Vec`, failing if `op`
/// wasn't already open. Used by `OrderBy`, which must see every input tuple
/// before it can emit the first output one.
pub(crate) fn drain(op: &mut dyn Operator) -> DbResult<Vec<Tuple>> {
    let mut out = Vec::new();
    while op.has_next()? {
        out.push(op.next()?);
    }
    Ok(out)
}

pub(crate) fn require_open(is_open: bool) -> DbResult<()> {
    if is_open {
        Ok(())
    } else {
        Err(DbError::NotOpen)
    }
}

pub(crate) fn require_not_open(is_open: bool) -> DbResult<()> {
    if is_open {
        Err(DbError::AlreadyOpen)
    } else {
        Ok(())
    }
}
