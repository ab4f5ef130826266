use std::fmt;
use std::sync::Arc;

use crate::error::{DbError, DbResult};
use crate::field::{Field, TupleDesc};
use crate::page_id::PageId;

/// Identity of a tuple as stored on a page: which page, which slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: usize,
}

impl RecordId {
    pub fn new(page_id: PageId, slot: usize) -> Self {
        Self { page_id, slot }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({}, slot={})", self.page_id, self.slot)
    }
}

/// A row: a schema plus one field per position, plus an optional location.
/// Fields start unset and are populated positionally; `to_bytes` requires
/// every field to be set.
#[derive(Debug, Clone)]
pub struct Tuple {
    desc: Arc<TupleDesc>,
    fields: Vec<Option<Field>>,
    record_id: Option<RecordId>,
}

impl Tuple {
    pub fn new(desc: Arc<TupleDesc>) -> Self {
        let n = desc.len();
        Self {
            desc,
            fields: vec![None; n],
            record_id: None,
        }
    }

    pub fn from_fields(desc: Arc<TupleDesc>, values: Vec<Field>) -> DbResult<Self> {
        let mut tuple = Tuple::new(desc);
        for (i, value) in values.into_iter().enumerate() {
            tuple.set_field(i, value)?;
        }
        Ok(tuple)
    }

    pub fn desc(&self) -> &TupleDesc {
        &self.desc
    }

    pub fn desc_arc(&self) -> Arc<TupleDesc> {
        Arc::clone(&self.desc)
    }

    pub fn field(&self, i: usize) -> DbResult<&Field> {
        self.fields
            .get(i)
            .and_then(|f| f.as_ref())
            .ok_or_else(|| DbError::NoSuchElement(format!("field {i} is unset")))
    }

    pub fn set_field(&mut self, i: usize, value: Field) -> DbResult<()> {
        let expected = self.desc.field_type(i)?;
        if value.field_type() != expected {
            return Err(DbError::SchemaMismatch(format!(
                "field {i}: expected {expected:?}, got {:?}",
                value.field_type()
            )));
        }
        self.fields[i] = Some(value);
        Ok(())
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, rid: RecordId) {
        self.record_id = Some(rid);
    }

    pub fn clear_record_id(&mut self) {
        self.record_id = None;
    }

    /// Serializes every field in schema order to exactly `desc.size()`
    /// bytes. Panics if a field is unset — callers (HeapPage::insert_tuple)
    /// only ever call this on fully populated tuples.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.desc.size());
        for (i, field) in self.fields.iter().enumerate() {
            let field = field
                .as_ref()
                .unwrap_or_else(|| panic!("tuple field {i} is unset"));
            bytes.extend(field.to_bytes());
        }
        bytes
    }

    /// Builds a tuple by concatenating `self`'s fields with `other`'s,
    /// under a merged descriptor. Used by Join.
    pub fn concat(&self, other: &Tuple, merged_desc: Arc<TupleDesc>) -> Tuple {
        let mut fields = self.fields.clone();
        fields.extend(other.fields.clone());
        Tuple {
            desc: merged_desc,
            fields,
            record_id: None,
        }
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.desc == other.desc && self.fields == other.fields && self.record_id == other.record_id
    }
}

impl Eq for Tuple {}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|field| match field {
                Some(field) => field.to_string(),
                None => "?".to_string(),
            })
            .collect();
        write!(f, "({})", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Type, TupleDescItem};

    fn int_desc(n: usize) -> Arc<TupleDesc> {
        let items = (0..n)
            .map(|i| TupleDescItem::new(Type::Int, Some(format!("f{i}"))))
            .collect();
        Arc::new(TupleDesc::new(items).unwrap())
    }

    #[test]
    fn set_field_checks_type() {
        let mut t = Tuple::new(int_desc(1));
        assert!(t.set_field(0, Field::Str("x".into())).is_err());
        assert!(t.set_field(0, Field::Int(1)).is_ok());
    }

    #[test]
    fn equality_considers_record_id() {
        let mut a = Tuple::from_fields(int_desc(1), vec![Field::Int(1)]).unwrap();
        let b = a.clone();
        assert_eq!(a, b);
        a.set_record_id(RecordId::new(PageId::new(1, 0), 0));
        assert_ne!(a, b);
    }

    #[test]
    fn to_bytes_round_trips_through_type_parse() {
        let t = Tuple::from_fields(int_desc(2), vec![Field::Int(7), Field::Int(-7)]).unwrap();
        let bytes = t.to_bytes();
        assert_eq!(Type::Int.parse(&bytes[0..4]).unwrap(), Field::Int(7));
        assert_eq!(Type::Int.parse(&bytes[4..8]).unwrap(), Field::Int(-7));
    }
}
