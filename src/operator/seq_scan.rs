use std::sync::Arc;

use crate::buffer_pool::BufferPool;
use crate::error::{DbError, DbResult};
use crate::field::TupleDesc;
use crate::page_id::PageId;
use crate::permissions::Permission;
use crate::transaction::TransactionId;
use crate::tuple::Tuple;

use super::{require_not_open, require_open, Operator};

/// Reads every tuple of one table through the buffer pool, page by page, in
/// read-only mode. The alias controls the field names exposed through
/// `tuple_desc` (`alias.fieldName`), so the same table scanned twice under
/// different aliases produces distinguishable column names for a `Join`.
pub struct SeqScan {
    pool: Arc<BufferPool>,
    tid: TransactionId,
    table_id: i64,
    desc: Arc<TupleDesc>,
    num_pages: usize,
    page_no: usize,
    buffered: std::vec::IntoIter<Tuple>,
    page_loaded: bool,
    is_open: bool,
}

impl SeqScan {
    pub fn new(pool: Arc<BufferPool>, tid: TransactionId, table_id: i64, alias: &str) -> DbResult<Self> {
        let base_desc = pool.catalog().tuple_desc(table_id)?;
        let desc = Arc::new(base_desc.with_alias(alias));
        Ok(Self {
            pool,
            tid,
            table_id,
            desc,
            num_pages: 0,
            page_no: 0,
            buffered: Vec::new().into_iter(),
            page_loaded: false,
            is_open: false,
        })
    }

    fn load_page(&mut self) -> DbResult<()> {
        let pid = PageId::new(self.table_id, self.page_no);
        let page = self.pool.get_page(self.tid, pid, Permission::ReadOnly)?;
        let page = page.lock().unwrap();
        let tuples: Vec<Tuple> = page.iter().cloned().collect();
        self.buffered = tuples.into_iter();
        self.page_loaded = true;
        Ok(())
    }
}

impl Operator for SeqScan {
    fn open(&mut self) -> DbResult<()> {
        require_not_open(self.is_open)?;
        self.num_pages = self.pool.catalog().file(self.table_id)?.num_pages()?;
        self.page_no = 0;
        self.buffered = Vec::new().into_iter();
        self.page_loaded = false;
        self.is_open = true;
        Ok(())
    }

    fn close(&mut self) -> DbResult<()> {
        self.is_open = false;
        Ok(())
    }

    fn rewind(&mut self) -> DbResult<()> {
        require_open(self.is_open)?;
        self.page_no = 0;
        self.buffered = Vec::new().into_iter();
        self.page_loaded = false;
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        require_open(self.is_open)?;
        loop {
            if !self.page_loaded {
                if self.page_no >= self.num_pages {
                    return Ok(false);
                }
                self.load_page()?;
            }
            if self.buffered.as_slice().is_empty() {
                self.page_no += 1;
                self.page_loaded = false;
                if self.page_no >= self.num_pages {
                    return Ok(false);
                }
                continue;
            }
            return Ok(true);
        }
    }

    fn next(&mut self) -> DbResult<Tuple> {
        require_open(self.is_open)?;
        if !self.has_next()? {
            return Err(DbError::NoMoreTuples);
        }
        Ok(self.buffered.next().unwrap())
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        Arc::clone(&self.desc)
    }
}
