use std::cmp::Ordering;
use std::fmt;

use crate::error::{DbError, DbResult};

/// Fixed-width content of a STRING field: 4-byte big-endian length prefix
/// followed by this many bytes of padded content.
pub const STRING_MAX_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Str,
}

impl Type {
    pub fn size(self) -> usize {
        match self {
            Type::Int => 4,
            Type::Str => 4 + STRING_MAX_LEN,
        }
    }

    /// Parses exactly `self.size()` bytes from the front of `bytes` into a
    /// `Field`. `bytes` may be longer than needed; the tail is ignored.
    pub fn parse(self, bytes: &[u8]) -> DbResult<Field> {
        if bytes.len() < self.size() {
            return Err(DbError::PageReadError(format!(
                "short field read: need {} bytes, got {}",
                self.size(),
                bytes.len()
            )));
        }
        match self {
            Type::Int => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(&bytes[..4]);
                Ok(Field::Int(i32::from_be_bytes(buf)))
            }
            Type::Str => {
                let mut len_buf = [0u8; 4];
                len_buf.copy_from_slice(&bytes[..4]);
                let len = u32::from_be_bytes(len_buf) as usize;
                if len > STRING_MAX_LEN {
                    return Err(DbError::PageReadError(format!(
                        "string length {len} exceeds max {STRING_MAX_LEN}"
                    )));
                }
                let content = &bytes[4..4 + len];
                let s = std::str::from_utf8(content)
                    .map_err(|e| DbError::PageReadError(e.to_string()))?;
                Ok(Field::Str(s.to_string()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    Int(i32),
    Str(String),
}

impl Field {
    pub fn field_type(&self) -> Type {
        match self {
            Field::Int(_) => Type::Int,
            Field::Str(_) => Type::Str,
        }
    }

    /// Serializes to exactly `field_type().size()` bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Field::Int(v) => v.to_be_bytes().to_vec(),
            Field::Str(s) => {
                let bytes = s.as_bytes();
                let len = bytes.len().min(STRING_MAX_LEN);
                let mut out = Vec::with_capacity(Type::Str.size());
                out.extend_from_slice(&(len as u32).to_be_bytes());
                out.extend_from_slice(&bytes[..len]);
                out.resize(Type::Str.size(), 0);
                out
            }
        }
    }

    /// Natural ordering within the same variant; comparing across variants
    /// is a caller error in every context this engine compares fields
    /// (predicates and sorts are always type-checked against a schema
    /// first), so it is reported rather than silently defined.
    pub fn partial_cmp_checked(&self, other: &Field) -> DbResult<Ordering> {
        match (self, other) {
            (Field::Int(a), Field::Int(b)) => Ok(a.cmp(b)),
            (Field::Str(a), Field::Str(b)) => Ok(a.cmp(b)),
            _ => Err(DbError::SchemaMismatch(
                "cannot compare fields of different types".into(),
            )),
        }
    }

    pub fn contains(&self, needle: &Field) -> bool {
        match (self, needle) {
            (Field::Str(haystack), Field::Str(needle)) => haystack.contains(needle.as_str()),
            _ => false,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{v}"),
            Field::Str(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleDescItem {
    pub field_type: Type,
    pub name: Option<String>,
}

impl TupleDescItem {
    pub fn new(field_type: Type, name: impl Into<Option<String>>) -> Self {
        Self {
            field_type,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TupleDesc {
    items: Vec<TupleDescItem>,
}

impl TupleDesc {
    pub fn new(items: Vec<TupleDescItem>) -> DbResult<Self> {
        if items.is_empty() {
            return Err(DbError::SchemaMismatch(
                "a TupleDesc needs at least one field".into(),
            ));
        }
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn size(&self) -> usize {
        self.items.iter().map(|i| i.field_type.size()).sum()
    }

    pub fn field_type(&self, i: usize) -> DbResult<Type> {
        self.items
            .get(i)
            .map(|item| item.field_type)
            .ok_or_else(|| DbError::NoSuchElement(format!("field index {i}")))
    }

    pub fn field_name(&self, i: usize) -> DbResult<Option<&str>> {
        self.items
            .get(i)
            .map(|item| item.name.as_deref())
            .ok_or_else(|| DbError::NoSuchElement(format!("field index {i}")))
    }

    pub fn index_of(&self, name: &str) -> DbResult<usize> {
        self.items
            .iter()
            .position(|item| item.name.as_deref() == Some(name))
            .ok_or_else(|| DbError::NoSuchElement(format!("field named {name}")))
    }

    pub fn items(&self) -> &[TupleDescItem] {
        &self.items
    }

    /// A new descriptor with every field name prefixed by `alias.`.
    pub fn with_alias(&self, alias: &str) -> TupleDesc {
        let items = self
            .items
            .iter()
            .map(|item| TupleDescItem {
                field_type: item.field_type,
                name: item
                    .name
                    .as_ref()
                    .map(|name| format!("{alias}.{name}"))
                    .or_else(|| Some(format!("{alias}.unnamed"))),
            })
            .collect();
        TupleDesc { items }
    }

    pub fn merge(a: &TupleDesc, b: &TupleDesc) -> TupleDesc {
        let mut items = a.items.clone();
        items.extend(b.items.clone());
        TupleDesc { items }
    }
}

impl PartialEq for TupleDesc {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len()
            && self
                .items
                .iter()
                .zip(other.items.iter())
                .all(|(a, b)| a.field_type == b.field_type)
    }
}

impl Eq for TupleDesc {}

impl fmt::Display for TupleDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .items
            .iter()
            .map(|item| match &item.name {
                Some(name) => format!("{:?}({})", item.field_type, name),
                None => format!("{:?}", item.field_type),
            })
            .collect();
        write!(f, "({})", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_roundtrips() {
        let f = Field::Int(-42);
        let bytes = f.to_bytes();
        assert_eq!(bytes.len(), Type::Int.size());
        assert_eq!(Type::Int.parse(&bytes).unwrap(), f);
    }

    #[test]
    fn string_roundtrips_and_pads() {
        let f = Field::Str("hello".to_string());
        let bytes = f.to_bytes();
        assert_eq!(bytes.len(), Type::Str.size());
        assert_eq!(Type::Str.parse(&bytes).unwrap(), f);
    }

    #[test]
    fn tuple_desc_equality_ignores_names() {
        let a = TupleDesc::new(vec![TupleDescItem::new(Type::Int, Some("a".into()))]).unwrap();
        let b = TupleDesc::new(vec![TupleDescItem::new(Type::Int, Some("b".into()))]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn tuple_desc_rejects_empty() {
        assert!(TupleDesc::new(vec![]).is_err());
    }

    #[test]
    fn merge_concatenates_fields() {
        let a = TupleDesc::new(vec![TupleDescItem::new(Type::Int, None)]).unwrap();
        let b = TupleDesc::new(vec![TupleDescItem::new(Type::Str, None)]).unwrap();
        let merged = TupleDesc::merge(&a, &b);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.field_type(0).unwrap(), Type::Int);
        assert_eq!(merged.field_type(1).unwrap(), Type::Str);
    }
}
