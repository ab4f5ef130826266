use crate::error::DbResult;
use crate::field::Field;
use crate::tuple::Tuple;

/// Comparison operators usable in a `Predicate` or `JoinPredicate`. `Like`
/// is substring containment, not a full glob/regex language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEq,
    GreaterThan,
    GreaterThanOrEq,
    Like,
}

impl Op {
    fn apply(self, a: &Field, b: &Field) -> DbResult<bool> {
        Ok(match self {
            Op::Equals => a == b,
            Op::NotEquals => a != b,
            Op::LessThan => a.partial_cmp_checked(b)?.is_lt(),
            Op::LessThanOrEq => a.partial_cmp_checked(b)?.is_le(),
            Op::GreaterThan => a.partial_cmp_checked(b)?.is_gt(),
            Op::GreaterThanOrEq => a.partial_cmp_checked(b)?.is_ge(),
            Op::Like => a.contains(b),
        })
    }
}

/// A `WHERE field OP constant` predicate evaluated against one tuple at a
/// time, for the `Filter` operator.
pub struct Predicate {
    field_index: usize,
    op: Op,
    operand: Field,
}

impl Predicate {
    pub fn new(field_index: usize, op: Op, operand: Field) -> Self {
        Self {
            field_index,
            op,
            operand,
        }
    }

    pub fn filter(&self, t: &Tuple) -> DbResult<bool> {
        self.op.apply(t.field(self.field_index)?, &self.operand)
    }
}

/// A `left.field OP right.field` predicate evaluated against a pair of
/// tuples, for the `Join` operator.
pub struct JoinPredicate {
    left_field: usize,
    op: Op,
    right_field: usize,
}

impl JoinPredicate {
    pub fn new(left_field: usize, op: Op, right_field: usize) -> Self {
        Self {
            left_field,
            op,
            right_field,
        }
    }

    pub fn filter(&self, left: &Tuple, right: &Tuple) -> DbResult<bool> {
        self.op
            .apply(left.field(self.left_field)?, right.field(self.right_field)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Type, TupleDesc, TupleDescItem};
    use std::sync::Arc;

    fn desc() -> Arc<TupleDesc> {
        Arc::new(TupleDesc::new(vec![TupleDescItem::new(Type::Int, Some("a".into()))]).unwrap())
    }

    #[test]
    fn predicate_compares_field_to_constant() {
        let t = Tuple::from_fields(desc(), vec![Field::Int(5)]).unwrap();
        let p = Predicate::new(0, Op::GreaterThan, Field::Int(3));
        assert!(p.filter(&t).unwrap());
        let p = Predicate::new(0, Op::LessThan, Field::Int(3));
        assert!(!p.filter(&t).unwrap());
    }

    #[test]
    fn join_predicate_compares_two_tuples() {
        let a = Tuple::from_fields(desc(), vec![Field::Int(5)]).unwrap();
        let b = Tuple::from_fields(desc(), vec![Field::Int(5)]).unwrap();
        let jp = JoinPredicate::new(0, Op::Equals, 0);
        assert!(jp.filter(&a, &b).unwrap());
    }
}
