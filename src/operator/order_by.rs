use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::{DbError, DbResult};
use crate::field::TupleDesc;
use crate::tuple::Tuple;

use super::{drain, require_not_open, require_open, Operator};

/// Sorts the child's entire output by one field before producing anything,
/// since a general sort has no incremental pull-based form. Ties are
/// resolved by input order (a stable sort).
pub struct OrderBy {
    field_index: usize,
    ascending: bool,
    child: Box<dyn Operator>,
    sorted: Vec<Tuple>,
    index: usize,
    is_open: bool,
}

impl OrderBy {
    pub fn new(field_index: usize, ascending: bool, child: Box<dyn Operator>) -> Self {
        Self {
            field_index,
            ascending,
            child,
            sorted: Vec::new(),
            index: 0,
            is_open: false,
        }
    }
}

impl Operator for OrderBy {
    fn open(&mut self) -> DbResult<()> {
        require_not_open(self.is_open)?;
        self.child.open()?;
        self.is_open = true;

        let mut tuples = drain(self.child.as_mut())?;
        let field_index = self.field_index;
        let mut err = None;
        tuples.sort_by(|a, b| {
            let (a_field, b_field) = match (a.field(field_index), b.field(field_index)) {
                (Ok(a), Ok(b)) => (a, b),
                _ => {
                    err = Some(DbError::NoSuchElement(format!("field {field_index}")));
                    return Ordering::Equal;
                }
            };
            match a_field.partial_cmp_checked(b_field) {
                Ok(ord) => ord,
                Err(e) => {
                    err = Some(e);
                    Ordering::Equal
                }
            }
        });
        if let Some(e) = err {
            return Err(e);
        }
        if !self.ascending {
            tuples.reverse();
        }
        self.sorted = tuples;
        self.index = 0;
        Ok(())
    }

    fn close(&mut self) -> DbResult<()> {
        self.child.close()?;
        self.is_open = false;
        self.sorted.clear();
        self.index = 0;
        Ok(())
    }

    fn rewind(&mut self) -> DbResult<()> {
        require_open(self.is_open)?;
        self.index = 0;
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        require_open(self.is_open)?;
        Ok(self.index < self.sorted.len())
    }

    fn next(&mut self) -> DbResult<Tuple> {
        require_open(self.is_open)?;
        let t = self.sorted.get(self.index).cloned().ok_or(DbError::NoMoreTuples)?;
        self.index += 1;
        Ok(t)
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.child.tuple_desc()
    }
}
