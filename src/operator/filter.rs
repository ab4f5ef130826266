use std::sync::Arc;

use crate::error::{DbError, DbResult};
use crate::field::TupleDesc;
use crate::tuple::Tuple;

use super::predicate::Predicate;
use super::{require_not_open, require_open, Operator};

/// Passes through only the child tuples matching `predicate`.
pub struct Filter {
    predicate: Predicate,
    child: Box<dyn Operator>,
    buffered: Option<Tuple>,
    is_open: bool,
}

impl Filter {
    pub fn new(predicate: Predicate, child: Box<dyn Operator>) -> Self {
        Self {
            predicate,
            child,
            buffered: None,
            is_open: false,
        }
    }

    fn fetch_next(&mut self) -> DbResult<Option<Tuple>> {
        while self.child.has_next()? {
            let t = self.child.next()?;
            if self.predicate.filter(&t)? {
                return Ok(Some(t));
            }
        }
        Ok(None)
    }
}

impl Operator for Filter {
    fn open(&mut self) -> DbResult<()> {
        require_not_open(self.is_open)?;
        self.child.open()?;
        self.is_open = true;
        self.buffered = self.fetch_next()?;
        Ok(())
    }

    fn close(&mut self) -> DbResult<()> {
        self.child.close()?;
        self.is_open = false;
        self.buffered = None;
        Ok(())
    }

    fn rewind(&mut self) -> DbResult<()> {
        require_open(self.is_open)?;
        self.child.rewind()?;
        self.buffered = self.fetch_next()?;
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        require_open(self.is_open)?;
        Ok(self.buffered.is_some())
    }

    fn next(&mut self) -> DbResult<Tuple> {
        require_open(self.is_open)?;
        let t = self.buffered.take().ok_or(DbError::NoMoreTuples)?;
        self.buffered = self.fetch_next()?;
        Ok(t)
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.child.tuple_desc()
    }
}
