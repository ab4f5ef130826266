use std::sync::atomic::{AtomicUsize, Ordering};

/// Default page size in bytes. Matches the teaching-scale on-disk layout
/// used throughout the corpus this engine is built against.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Default exclusive-lock wait timeout before a waiter is aborted.
pub const DEFAULT_DEADLOCK_TIMEOUT_SECS: u64 = 100;

static PAGE_SIZE: AtomicUsize = AtomicUsize::new(DEFAULT_PAGE_SIZE);
static DEADLOCK_TIMEOUT_SECS: AtomicUsize = AtomicUsize::new(DEFAULT_DEADLOCK_TIMEOUT_SECS as usize);

/// Process-wide page size. Fixed for the lifetime of every page that has
/// already been constructed; changing it mid-run (outside test setup) is
/// undefined behavior, per the concurrency model.
pub fn page_size() -> usize {
    PAGE_SIZE.load(Ordering::Relaxed)
}

/// Overrides the process-wide page size. Intended for test setup only,
/// before any HeapPage/HeapFile touching the old size is still alive.
pub fn set_page_size(size: usize) {
    PAGE_SIZE.store(size, Ordering::Relaxed);
}

/// How long a `BufferPool::get_page` waiter blocks before it is aborted.
pub fn deadlock_timeout_secs() -> u64 {
    DEADLOCK_TIMEOUT_SECS.load(Ordering::Relaxed) as u64
}

/// Overrides the deadlock timeout. Used by lock-contention tests so they
/// don't have to wait out the production default.
pub fn set_deadlock_timeout_secs(secs: u64) {
    DEADLOCK_TIMEOUT_SECS.store(secs as usize, Ordering::Relaxed);
}
