use std::sync::Arc;

use crate::buffer_pool::BufferPool;
use crate::error::{DbError, DbResult};
use crate::field::{Field, Type, TupleDesc, TupleDescItem};
use crate::transaction::TransactionId;
use crate::tuple::Tuple;

use super::{require_not_open, require_open, Operator};

/// Pulls every tuple from `child` (typically a `Filter` over a `SeqScan`)
/// and deletes it from its source table through the buffer pool. Produces
/// one output tuple carrying the count of rows deleted, then is exhausted
/// until `rewind` (which restores the cached count tuple rather than
/// re-running the delete work).
pub struct Delete {
    pool: Arc<BufferPool>,
    tid: TransactionId,
    table_id: i64,
    child: Box<dyn Operator>,
    desc: Arc<TupleDesc>,
    count_tuple: Option<Tuple>,
    result: Option<Tuple>,
    is_open: bool,
}

impl Delete {
    pub fn new(pool: Arc<BufferPool>, tid: TransactionId, table_id: i64, child: Box<dyn Operator>) -> Self {
        let desc = Arc::new(
            TupleDesc::new(vec![TupleDescItem::new(Type::Int, Some("count".into()))])
                .expect("count column is non-empty"),
        );
        Self {
            pool,
            tid,
            table_id,
            child,
            desc,
            count_tuple: None,
            result: None,
            is_open: false,
        }
    }
}

impl Operator for Delete {
    fn open(&mut self) -> DbResult<()> {
        require_not_open(self.is_open)?;
        self.child.open()?;
        self.is_open = true;

        let mut count: i32 = 0;
        while self.child.has_next()? {
            let t = self.child.next()?;
            self.pool.delete_tuple(self.tid, self.table_id, &t)?;
            count += 1;
        }
        let count_tuple = Tuple::from_fields(Arc::clone(&self.desc), vec![Field::Int(count)])?;
        self.count_tuple = Some(count_tuple.clone());
        self.result = Some(count_tuple);
        Ok(())
    }

    fn close(&mut self) -> DbResult<()> {
        self.child.close()?;
        self.is_open = false;
        self.count_tuple = None;
        self.result = None;
        Ok(())
    }

    fn rewind(&mut self) -> DbResult<()> {
        require_open(self.is_open)?;
        self.result = self.count_tuple.clone();
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        require_open(self.is_open)?;
        Ok(self.result.is_some())
    }

    fn next(&mut self) -> DbResult<Tuple> {
        require_open(self.is_open)?;
        self.result.take().ok_or(DbError::NoMoreTuples)
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        Arc::clone(&self.desc)
    }
}
