use std::fmt;

/// The single error type threaded through every fallible operation in the
/// crate. Match on the variant, not the message, to tell failure modes
/// apart; the message is for logs and panics, not control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbError {
    NoSuchTable(String),
    NoSuchElement(String),
    SchemaMismatch(String),
    NoEmptySlots,
    EmptySlot,
    NotOnPage,
    PageReadError(String),
    PageWriteError(String),
    NoCleanVictim,
    TransactionAborted,
    UnsupportedOperator(String),
    NoMoreTuples,
    AlreadyOpen,
    NotOpen,
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::NoSuchTable(msg) => write!(f, "no such table: {msg}"),
            DbError::NoSuchElement(msg) => write!(f, "no such element: {msg}"),
            DbError::SchemaMismatch(msg) => write!(f, "schema mismatch: {msg}"),
            DbError::NoEmptySlots => write!(f, "page has no empty slots"),
            DbError::EmptySlot => write!(f, "slot is empty"),
            DbError::NotOnPage => write!(f, "tuple is not stored on this page"),
            DbError::PageReadError(msg) => write!(f, "page read error: {msg}"),
            DbError::PageWriteError(msg) => write!(f, "page write error: {msg}"),
            DbError::NoCleanVictim => write!(f, "no clean page available for eviction"),
            DbError::TransactionAborted => write!(f, "transaction aborted (lock wait timeout)"),
            DbError::UnsupportedOperator(msg) => write!(f, "unsupported aggregate operator: {msg}"),
            DbError::NoMoreTuples => write!(f, "no more tuples"),
            DbError::AlreadyOpen => write!(f, "operator is already open"),
            DbError::NotOpen => write!(f, "operator is not open"),
        }
    }
}

impl std::error::Error for DbError {}

pub type DbResult<T> = Result<T, DbError>;
