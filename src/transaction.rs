use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use log::info;

use crate::buffer_pool::BufferPool;
use crate::error::DbResult;

static NEXT_TID: AtomicU64 = AtomicU64::new(1);

/// Monotonically increasing transaction identity. Cheap to copy; every
/// `BufferPool` lock-table entry keys off this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl TransactionId {
    pub fn new() -> Self {
        Self(NEXT_TID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx#{}", self.0)
    }
}

/// A transaction handle: an id plus the commit/abort operations, which are
/// really just `BufferPool::transaction_complete` calls. Kept as a thin
/// wrapper so call sites read as "start a transaction ... commit it" rather
/// than threading a bare id through everything that cares about lifecycle.
#[derive(Debug, Clone, Copy)]
pub struct Transaction {
    id: TransactionId,
}

impl Transaction {
    pub fn new() -> Self {
        let tx = Self { id: TransactionId::new() };
        info!("{} started", tx.id);
        tx
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn commit(&self, pool: &BufferPool) -> DbResult<()> {
        info!("{} committing", self.id);
        pool.transaction_complete(self.id, true)
    }

    pub fn abort(&self, pool: &BufferPool) -> DbResult<()> {
        info!("{} aborting", self.id);
        pool.transaction_complete(self.id, false)
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}
