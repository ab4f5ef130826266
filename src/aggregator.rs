use std::collections::HashMap;

use crate::error::{DbError, DbResult};
use crate::field::{Field, Type, TupleDesc, TupleDescItem};
use crate::tuple::Tuple;

/// The aggregate operators supported over a single field. `Avg` truncates
/// toward zero like integer division, matching the teaching engine's
/// all-integer arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

impl AggOp {
    pub fn parse(s: &str) -> DbResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "min" => Ok(AggOp::Min),
            "max" => Ok(AggOp::Max),
            "sum" => Ok(AggOp::Sum),
            "avg" => Ok(AggOp::Avg),
            "count" => Ok(AggOp::Count),
            other => Err(DbError::UnsupportedOperator(other.to_string())),
        }
    }
}

struct GroupState {
    count: i64,
    sum: i64,
    min: i64,
    max: i64,
}

impl GroupState {
    fn new(value: i64) -> Self {
        Self {
            count: 1,
            sum: value,
            min: value,
            max: value,
        }
    }

    fn merge(&mut self, value: i64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    fn result(&self, op: AggOp) -> i64 {
        match op {
            AggOp::Min => self.min,
            AggOp::Max => self.max,
            AggOp::Sum => self.sum,
            AggOp::Avg => self.sum / self.count,
            AggOp::Count => self.count,
        }
    }
}

/// A special group key meaning "no GROUP BY field": every input row merges
/// into the same, single group.
const NO_GROUPING: Option<Field> = None;

/// Incrementally aggregates integer fields, merging one tuple at a time and
/// materializing a result tuple per group on demand. Groups are reported in
/// first-seen order, matching the pull-based operators that consume them.
pub struct IntegerAggregator {
    group_field: Option<usize>,
    group_type: Option<Type>,
    agg_field: usize,
    op: AggOp,
    groups: HashMap<Option<Field>, GroupState>,
    order: Vec<Option<Field>>,
}

impl IntegerAggregator {
    pub fn new(group_field: Option<usize>, group_type: Option<Type>, agg_field: usize, op: AggOp) -> Self {
        Self {
            group_field,
            group_type,
            agg_field,
            op,
            groups: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn merge_tuple_into_group(&mut self, t: &Tuple) -> DbResult<()> {
        let key = match self.group_field {
            Some(idx) => Some(t.field(idx)?.clone()),
            None => NO_GROUPING,
        };
        let value = match t.field(self.agg_field)? {
            Field::Int(v) => *v,
            Field::Str(_) => {
                return Err(DbError::SchemaMismatch(
                    "IntegerAggregator requires an integer aggregate field".into(),
                ))
            }
        };

        if !self.groups.contains_key(&key) {
            self.order.push(key.clone());
            self.groups.insert(key.clone(), GroupState::new(value.into()));
        } else {
            self.groups.get_mut(&key).unwrap().merge(value.into());
        }
        Ok(())
    }

    pub fn tuple_desc(&self) -> DbResult<TupleDesc> {
        let agg_name = format!("{:?}", self.op).to_lowercase();
        let items = match self.group_field {
            Some(_) => vec![
                TupleDescItem::new(self.group_type.unwrap(), Some("groupVal".into())),
                TupleDescItem::new(Type::Int, Some(agg_name)),
            ],
            None => vec![TupleDescItem::new(Type::Int, Some(agg_name))],
        };
        TupleDesc::new(items)
    }

    pub fn iterate(&self) -> DbResult<Vec<Tuple>> {
        let desc = std::sync::Arc::new(self.tuple_desc()?);
        let mut out = Vec::with_capacity(self.order.len());
        for key in &self.order {
            let state = &self.groups[key];
            let result = Field::Int(state.result(self.op).try_into().unwrap());
            let fields = match key {
                Some(k) => vec![k.clone(), result],
                None => vec![result],
            };
            out.push(Tuple::from_fields(std::sync::Arc::clone(&desc), fields)?);
        }
        Ok(out)
    }
}

/// Aggregates over a string-valued field. Only `Count` is meaningful for
/// strings, since min/max/sum/avg have no defined semantics on text here.
pub struct StringAggregator {
    group_field: Option<usize>,
    group_type: Option<Type>,
    agg_field: usize,
    groups: HashMap<Option<Field>, i64>,
    order: Vec<Option<Field>>,
}

impl StringAggregator {
    pub fn new(group_field: Option<usize>, group_type: Option<Type>, agg_field: usize, op: AggOp) -> DbResult<Self> {
        if op != AggOp::Count {
            return Err(DbError::UnsupportedOperator(format!(
                "{op:?} is not supported over string fields"
            )));
        }
        Ok(Self {
            group_field,
            group_type,
            agg_field,
            groups: HashMap::new(),
            order: Vec::new(),
        })
    }

    pub fn merge_tuple_into_group(&mut self, t: &Tuple) -> DbResult<()> {
        let key = match self.group_field {
            Some(idx) => Some(t.field(idx)?.clone()),
            None => NO_GROUPING,
        };
        match t.field(self.agg_field)? {
            Field::Str(_) => {}
            Field::Int(_) => {
                return Err(DbError::SchemaMismatch(
                    "StringAggregator requires a string aggregate field".into(),
                ))
            }
        }
        if !self.groups.contains_key(&key) {
            self.order.push(key.clone());
        }
        *self.groups.entry(key).or_insert(0) += 1;
        Ok(())
    }

    pub fn tuple_desc(&self) -> DbResult<TupleDesc> {
        let items = match self.group_field {
            Some(_) => vec![
                TupleDescItem::new(self.group_type.unwrap(), Some("groupVal".into())),
                TupleDescItem::new(Type::Int, Some("count".into())),
            ],
            None => vec![TupleDescItem::new(Type::Int, Some("count".into()))],
        };
        TupleDesc::new(items)
    }

    pub fn iterate(&self) -> DbResult<Vec<Tuple>> {
        let desc = std::sync::Arc::new(self.tuple_desc()?);
        let mut out = Vec::with_capacity(self.order.len());
        for key in &self.order {
            let count = self.groups[key];
            let fields = match key {
                Some(k) => vec![k.clone(), Field::Int(count.try_into().unwrap())],
                None => vec![Field::Int(count.try_into().unwrap())],
            };
            out.push(Tuple::from_fields(std::sync::Arc::clone(&desc), fields)?);
        }
        Ok(out)
    }
}
