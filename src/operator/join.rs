use std::sync::Arc;

use crate::error::{DbError, DbResult};
use crate::field::TupleDesc;
use crate::tuple::Tuple;

use super::predicate::JoinPredicate;
use super::{require_not_open, require_open, Operator};

/// A simple nested-loop join: for each outer tuple, rewinds the inner child
/// and scans it fully looking for matches. Quadratic in input size, like
/// the teaching engine this generalizes; no hash- or merge-join here.
pub struct Join {
    predicate: JoinPredicate,
    outer: Box<dyn Operator>,
    inner: Box<dyn Operator>,
    desc: Arc<TupleDesc>,
    current_outer: Option<Tuple>,
    buffered: Option<Tuple>,
    is_open: bool,
}

impl Join {
    pub fn new(predicate: JoinPredicate, outer: Box<dyn Operator>, inner: Box<dyn Operator>) -> Self {
        let desc = Arc::new(TupleDesc::merge(&outer.tuple_desc(), &inner.tuple_desc()));
        Self {
            predicate,
            outer,
            inner,
            desc,
            current_outer: None,
            buffered: None,
            is_open: false,
        }
    }

    fn fetch_next(&mut self) -> DbResult<Option<Tuple>> {
        loop {
            if self.current_outer.is_none() {
                if !self.outer.has_next()? {
                    return Ok(None);
                }
                self.current_outer = Some(self.outer.next()?);
                self.inner.rewind()?;
            }

            let outer = self.current_outer.as_ref().unwrap();
            while self.inner.has_next()? {
                let inner = self.inner.next()?;
                if self.predicate.filter(outer, &inner)? {
                    return Ok(Some(outer.concat(&inner, Arc::clone(&self.desc))));
                }
            }
            self.current_outer = None;
        }
    }
}

impl Operator for Join {
    fn open(&mut self) -> DbResult<()> {
        require_not_open(self.is_open)?;
        self.outer.open()?;
        self.inner.open()?;
        self.is_open = true;
        self.current_outer = None;
        self.buffered = self.fetch_next()?;
        Ok(())
    }

    fn close(&mut self) -> DbResult<()> {
        self.outer.close()?;
        self.inner.close()?;
        self.is_open = false;
        self.current_outer = None;
        self.buffered = None;
        Ok(())
    }

    fn rewind(&mut self) -> DbResult<()> {
        require_open(self.is_open)?;
        self.outer.rewind()?;
        self.current_outer = None;
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
        Arc::clone(&self.desc)
    }
}
