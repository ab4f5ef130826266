use std::sync::Arc;

use crate::aggregator::{AggOp, IntegerAggregator, StringAggregator};
use crate::error::{DbError, DbResult};
use crate::field::{Type, TupleDesc};
use crate::tuple::Tuple;

use super::{require_not_open, require_open, Operator};

enum Inner {
    Integer(IntegerAggregator),
    String(StringAggregator),
}

/// Groups and aggregates the child's output over one field, optionally
/// grouped by another. Like `OrderBy`, this must see every input tuple
/// before it can emit the first output one, so `open` drains the child
/// eagerly and materializes the per-group results.
pub struct Aggregate {
    child: Box<dyn Operator>,
    agg_field: usize,
    group_field: Option<usize>,
    op: AggOp,
    results: Vec<Tuple>,
    desc: Arc<TupleDesc>,
    index: usize,
    is_open: bool,
}

impl Aggregate {
    /// `agg_type`/`group_type` come straight from `child.tuple_desc()`,
    /// which is stable whether or not `child` has been opened, so the
    /// output schema is known up front, same as `SeqScan::new`/`Join::new`.
    pub fn new(child: Box<dyn Operator>, agg_field: usize, group_field: Option<usize>, op: AggOp) -> DbResult<Self> {
        let group_type = match group_field {
            Some(idx) => Some(child.tuple_desc().field_type(idx)?),
            None => None,
        };
        let agg_name = format!("{:?}", op).to_lowercase();
        let items = match group_type {
            Some(gt) => vec![
                crate::field::TupleDescItem::new(gt, Some("groupVal".into())),
                crate::field::TupleDescItem::new(Type::Int, Some(agg_name)),
            ],
            None => vec![crate::field::TupleDescItem::new(Type::Int, Some(agg_name))],
        };
        let desc = Arc::new(TupleDesc::new(items)?);

        Ok(Self {
            child,
            agg_field,
            group_field,
            op,
            results: Vec::new(),
            desc,
            index: 0,
            is_open: false,
        })
    }
}

impl Operator for Aggregate {
    fn open(&mut self) -> DbResult<()> {
        require_not_open(self.is_open)?;
        self.child.open()?;
        self.is_open = true;

        let agg_type = self.child.tuple_desc().field_type(self.agg_field)?;
        let group_type = match self.group_field {
            Some(idx) => Some(self.child.tuple_desc().field_type(idx)?),
            None => None,
        };

        let mut inner = match agg_type {
            Type::Int => Inner::Integer(IntegerAggregator::new(self.group_field, group_type, self.agg_field, self.op)),
            Type::Str => Inner::String(StringAggregator::new(self.group_field, group_type, self.agg_field, self.op)?),
        };

        while self.child.has_next()? {
            let t = self.child.next()?;
            match &mut inner {
                Inner::Integer(a) => a.merge_tuple_into_group(&t)?,
                Inner::String(a) => a.merge_tuple_into_group(&t)?,
            }
        }

        self.results = match &inner {
            Inner::Integer(a) => a.iterate()?,
            Inner::String(a) => a.iterate()?,
        };
        self.index = 0;
        Ok(())
    }

    fn close(&mut self) -> DbResult<()> {
        self.child.close()?;
        self.is_open = false;
        self.results.clear();
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
        Ok(self.index < self.results.len())
    }

    fn next(&mut self) -> DbResult<Tuple> {
        require_open(self.is_open)?;
        let t = self.results.get(self.index).cloned().ok_or(DbError::NoMoreTuples)?;
        self.index += 1;
        Ok(t)
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        Arc::clone(&self.desc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Field, Type, TupleDescItem};
    use crate::operator::tuple_iterator::TupleIterator;

    #[test]
    fn counts_grouped_rows() {
        let desc = Arc::new(TupleDesc::new(vec![
            TupleDescItem::new(Type::Str, Some("g".into())),
            TupleDescItem::new(Type::Int, Some("v".into())),
        ]).unwrap());
        let tuples = vec![("a", 1), ("a", 2), ("b", 3)]
            .into_iter()
            .map(|(g, v)| Tuple::from_fields(Arc::clone(&desc), vec![Field::Str(g.into()), Field::Int(v)]).unwrap())
            .collect();
        let child = Box::new(TupleIterator::new(desc, tuples));
        let mut agg = Aggregate::new(child, 1, Some(0), AggOp::Count).unwrap();
        agg.open().unwrap();

        let mut total = 0;
        while agg.has_next().unwrap() {
            let t = agg.next().unwrap();
            total += match t.field(1).unwrap() {
                Field::Int(v) => *v,
                _ => unreachable!(),
            };
        }
        assert_eq!(total, 3);
    }
}
