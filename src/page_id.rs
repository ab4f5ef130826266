use std::fmt;

/// Identity of a heap page. Deriving `Hash`/`Eq` over both fields avoids the
/// classic bug of hashing a concatenated decimal string, which would
/// collide between e.g. `(11, 1)` and `(1, 11)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageId {
    pub table_id: i64,
    pub page_no: usize,
}

impl PageId {
    pub fn new(table_id: i64, page_no: usize) -> Self {
        Self { table_id, page_no }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageId(table={}, page={})", self.table_id, self.page_no)
    }
}
