use std::sync::Arc;

use crate::error::DbResult;
use crate::field::TupleDesc;
use crate::tuple::Tuple;

use super::{require_not_open, require_open, Operator};

/// A leaf operator over an in-memory `Vec<Tuple>`. Used to feed literal
/// data into a plan tree (tests, and materialized intermediate results like
/// an aggregate's output) without a backing heap file.
pub struct TupleIterator {
    desc: Arc<TupleDesc>,
    tuples: Vec<Tuple>,
    index: usize,
    is_open: bool,
}

impl TupleIterator {
    pub fn new(desc: Arc<TupleDesc>, tuples: Vec<Tuple>) -> Self {
        Self {
            desc,
            tuples,
            index: 0,
            is_open: false,
        }
    }
}

impl Operator for TupleIterator {
    fn open(&mut self) -> DbResult<()> {
        require_not_open(self.is_open)?;
        self.is_open = true;
        self.index = 0;
        Ok(())
    }

    fn close(&mut self) -> DbResult<()> {
        self.is_open = false;
        Ok(())
    }

    fn rewind(&mut self) -> DbResult<()> {
        require_open(self.is_open)?;
        self.index = 0;
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        require_open(self.is_open)?;
        Ok(self.index < self.tuples.len())
    }

    fn next(&mut self) -> DbResult<Tuple> {
        require_open(self.is_open)?;
        let t = self
            .tuples
            .get(self.index)
            .cloned()
            .ok_or(crate::error::DbError::NoMoreTuples)?;
        self.index += 1;
        Ok(t)
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        Arc::clone(&self.desc)
    }
}
