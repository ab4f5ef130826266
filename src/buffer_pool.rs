use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config;
use crate::error::{DbError, DbResult};
use crate::heap_page::HeapPage;
use crate::page_id::PageId;
use crate::permissions::Permission;
use crate::transaction::TransactionId;
use crate::tuple::Tuple;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockKind {
    Shared,
    Exclusive,
}

impl From<Permission> for LockKind {
    fn from(p: Permission) -> Self {
        match p {
            Permission::ReadOnly => LockKind::Shared,
            Permission::ReadWrite => LockKind::Exclusive,
        }
    }
}

/// The lock table: which transactions hold which kind of lock on which page,
/// and, per-transaction, which pages it holds. A page is either unlocked,
/// shared by any number of transactions, or held exclusively by exactly one.
#[derive(Default)]
struct LockTable {
    shared_holders: HashMap<PageId, HashSet<TransactionId>>,
    exclusive_holder: HashMap<PageId, TransactionId>,
    held_by: HashMap<TransactionId, HashSet<PageId>>,
    /// tid -> set of tids it is currently waiting behind, used only for the
    /// wait-for-graph cycle fast path; the timeout is still the backstop.
    waits_for: HashMap<TransactionId, HashSet<TransactionId>>,
}

impl LockTable {
    fn holders(&self, pid: PageId) -> HashSet<TransactionId> {
        let mut h: HashSet<TransactionId> = self
            .shared_holders
            .get(&pid)
            .cloned()
            .unwrap_or_default();
        if let Some(&tid) = self.exclusive_holder.get(&pid) {
            h.insert(tid);
        }
        h
    }

    fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        self.exclusive_holder.get(&pid) == Some(&tid)
            || self
                .shared_holders
                .get(&pid)
                .map(|s| s.contains(&tid))
                .unwrap_or(false)
    }

    /// Attempts to grant `kind` on `pid` to `tid`. Returns true on success.
    /// Upgrade from shared to exclusive is permitted only when `tid` is the
    /// sole shared holder.
    fn try_grant(&mut self, tid: TransactionId, pid: PageId, kind: LockKind) -> bool {
        match kind {
            LockKind::Shared => {
                if let Some(holder) = self.exclusive_holder.get(&pid) {
                    return *holder == tid;
                }
                self.shared_holders.entry(pid).or_default().insert(tid);
                self.held_by.entry(tid).or_default().insert(pid);
                true
            }
            LockKind::Exclusive => {
                if let Some(holder) = self.exclusive_holder.get(&pid) {
                    return *holder == tid;
                }
                let shared = self.shared_holders.entry(pid).or_default();
                let others: HashSet<_> = shared.iter().filter(|&&h| h != tid).collect();
                if !others.is_empty() {
                    return false;
                }
                shared.remove(&tid);
                self.exclusive_holder.insert(pid, tid);
                self.held_by.entry(tid).or_default().insert(pid);
                true
            }
        }
    }

    fn update_waits_for(&mut self, tid: TransactionId, pid: PageId) {
        let blockers: HashSet<TransactionId> =
            self.holders(pid).into_iter().filter(|&h| h != tid).collect();
        if blockers.is_empty() {
            self.waits_for.remove(&tid);
        } else {
            self.waits_for.insert(tid, blockers);
        }
    }

    fn clear_waits_for(&mut self, tid: TransactionId) {
        self.waits_for.remove(&tid);
    }

    /// Cycle check over the wait-for graph, a pure early-exit optimization
    /// over the timeout: if `tid` is found to be waiting (transitively) on
    /// itself, the caller can fail fast instead of blocking out the timeout.
    fn has_cycle_from(&self, start: TransactionId) -> bool {
        let mut stack = vec![start];
        let mut visited = HashSet::new();
        while let Some(cur) = stack.pop() {
            if let Some(next) = self.waits_for.get(&cur) {
                for &n in next {
                    if n == start {
                        return true;
                    }
                    if visited.insert(n) {
                        stack.push(n);
                    }
                }
            }
        }
        false
    }

    fn release(&mut self, tid: TransactionId, pid: PageId) {
        if let Some(set) = self.shared_holders.get_mut(&pid) {
            set.remove(&tid);
        }
        if self.exclusive_holder.get(&pid) == Some(&tid) {
            self.exclusive_holder.remove(&pid);
        }
        if let Some(pages) = self.held_by.get_mut(&tid) {
            pages.remove(&pid);
        }
    }

    fn release_all(&mut self, tid: TransactionId) -> Vec<PageId> {
        let pages: Vec<PageId> = self
            .held_by
            .remove(&tid)
            .map(|s| s.into_iter().collect())
            .unwrap_or_default();
        for &pid in &pages {
            self.release(tid, pid);
        }
        self.waits_for.remove(&tid);
        pages
    }
}

struct CachedPage {
    page: Arc<Mutex<HeapPage>>,
    last_used: u64,
}

struct Inner {
    pages: HashMap<PageId, CachedPage>,
    locks: LockTable,
}

static CLOCK: AtomicU64 = AtomicU64::new(0);

fn tick() -> u64 {
    CLOCK.fetch_add(1, Ordering::Relaxed)
}

/// The fixed-capacity page cache and lock manager. A single `Mutex<Inner>`
/// protects both the page table and the lock table together, since granting
/// a lock and inserting a freshly-read page into the cache must be visible
/// atomically to other waiters; a `Condvar` wakes blocked lock requesters
/// whenever any lock is released.
pub struct BufferPool {
    capacity: usize,
    inner: Mutex<Inner>,
    cond: Condvar,
    catalog: Arc<Catalog>,
    deadlock_timeout: Duration,
}

impl BufferPool {
    pub fn new(capacity: usize, catalog: Arc<Catalog>) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner {
                pages: HashMap::new(),
                locks: LockTable::default(),
            }),
            cond: Condvar::new(),
            catalog,
            deadlock_timeout: Duration::from_secs(config::deadlock_timeout_secs()),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Pins `pid` for `tid` under strict two-phase locking: blocks until the
    /// requested lock is granted, reading the page from its `HeapFile` on a
    /// cache miss and evicting a clean victim if the cache is full. Fails
    /// with `TransactionAborted` if the lock cannot be granted within the
    /// deadlock timeout, or if a wait-for cycle is detected earlier.
    pub fn get_page(
        &self,
        tid: TransactionId,
        pid: PageId,
        perm: Permission,
    ) -> DbResult<Arc<Mutex<HeapPage>>> {
        let kind = LockKind::from(perm);
        let start = Instant::now();
        let mut guard = self.inner.lock().unwrap();

        loop {
            if guard.locks.try_grant(tid, pid, kind) {
                guard.locks.clear_waits_for(tid);
                break;
            }

            guard.locks.update_waits_for(tid, pid);
            if guard.locks.has_cycle_from(tid) {
                guard.locks.clear_waits_for(tid);
                warn!("{tid} aborted: wait-for cycle detected on {pid}");
                return Err(DbError::TransactionAborted);
            }

            let elapsed = start.elapsed();
            if elapsed >= self.deadlock_timeout {
                guard.locks.clear_waits_for(tid);
                warn!("{tid} aborted: timed out waiting for lock on {pid}");
                return Err(DbError::TransactionAborted);
            }

            let (g, timeout_result) = self
                .cond
                .wait_timeout(guard, self.deadlock_timeout - elapsed)
                .unwrap();
            guard = g;
            if timeout_result.timed_out() && !guard.locks.holds_lock(tid, pid) {
                guard.locks.clear_waits_for(tid);
                warn!("{tid} aborted: timed out waiting for lock on {pid}");
                return Err(DbError::TransactionAborted);
            }
        }

        if let Some(cached) = guard.pages.get_mut(&pid) {
            cached.last_used = tick();
            let page = Arc::clone(&cached.page);
            drop(guard);
            return Ok(page);
        }

        if guard.pages.len() >= self.capacity {
            self.evict_locked(&mut guard)?;
        }

        let file = self.catalog.file(pid.table_id)?;
        let page = file.read_page(pid.page_no)?;
        let page = Arc::new(Mutex::new(page));
        guard.pages.insert(
            pid,
            CachedPage {
                page: Arc::clone(&page),
                last_used: tick(),
            },
        );
        debug!("{tid} pinned {pid} ({perm:?})", perm = perm);
        Ok(page)
    }

    /// NO-STEAL eviction: only a page with no uncommitted changes may be
    /// evicted, since a dirty page's only record of its pre-transaction
    /// state (until commit) is the in-memory cache. Evicts the
    /// least-recently-used clean page; fails if every cached page is dirty.
    fn evict_locked(&self, guard: &mut std::sync::MutexGuard<'_, Inner>) -> DbResult<()> {
        let victim = guard
            .pages
            .iter()
            .filter(|(_, c)| c.page.lock().unwrap().is_dirty().is_none())
            .min_by_key(|(_, c)| c.last_used)
            .map(|(&pid, _)| pid);

        match victim {
            Some(pid) => {
                guard.pages.remove(&pid);
                debug!("evicted clean page {pid}");
                Ok(())
            }
            None => {
                warn!("no clean page to evict: cache full at capacity {} and every cached page is dirty", self.capacity);
                Err(DbError::NoCleanVictim)
            }
        }
    }

    pub fn insert_tuple(&self, tid: TransactionId, table_id: i64, t: Tuple) -> DbResult<()> {
        let file = self.catalog.file(table_id)?;
        file.insert_tuple(tid, |pid| self.get_page(tid, pid, Permission::ReadWrite), t)?;
        Ok(())
    }

    pub fn delete_tuple(&self, tid: TransactionId, table_id: i64, t: &Tuple) -> DbResult<()> {
        let file = self.catalog.file(table_id)?;
        file.delete_tuple(tid, |pid| self.get_page(tid, pid, Permission::ReadWrite), t)?;
        Ok(())
    }

    /// Flushes one page to disk and refreshes its before-image to the
    /// just-written state. Only ever called for committing transactions.
    pub fn flush_page(&self, pid: PageId) -> DbResult<()> {
        let guard = self.inner.lock().unwrap();
        if let Some(cached) = guard.pages.get(&pid) {
            let file = self.catalog.file(pid.table_id)?;
            let mut page = cached.page.lock().unwrap();
            file.write_page(&page)?;
            page.mark_dirty(false, None);
            page.set_before_image();
        }
        Ok(())
    }

    pub fn flush_all_pages(&self) -> DbResult<()> {
        let pids: Vec<PageId> = self.inner.lock().unwrap().pages.keys().copied().collect();
        for pid in pids {
            self.flush_page(pid)?;
        }
        Ok(())
    }

    /// Drops a page from the cache without writing it back. Used to discard
    /// a dirty page's in-memory state after an abort restores its
    /// before-image to disk.
    pub fn discard_page(&self, pid: PageId) {
        self.inner.lock().unwrap().pages.remove(&pid);
    }

    /// Ends a transaction: on commit, flushes every page it dirtied and
    /// advances their before-images; on abort, restores each dirtied page's
    /// pre-transaction before-image to disk and drops the cached copy so the
    /// next reader re-reads the reverted bytes. Either way, releases every
    /// lock the transaction held and wakes waiters.
    pub fn transaction_complete(&self, tid: TransactionId, commit: bool) -> DbResult<()> {
        let held: Vec<PageId> = {
            let guard = self.inner.lock().unwrap();
            guard
                .locks
                .held_by
                .get(&tid)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .collect()
        };

        for pid in &held {
            let dirtied = {
                let guard = self.inner.lock().unwrap();
                guard
                    .pages
                    .get(pid)
                    .map(|c| c.page.lock().unwrap().is_dirty() == Some(tid))
                    .unwrap_or(false)
            };
            if !dirtied {
                continue;
            }
            if commit {
                self.flush_page(*pid)?;
            } else {
                let file = self.catalog.file(pid.table_id)?;
                let guard = self.inner.lock().unwrap();
                if let Some(cached) = guard.pages.get(pid) {
                    let before = cached.page.lock().unwrap().before_image()?;
                    drop(guard);
                    file.write_page(&before)?;
                }
                self.discard_page(*pid);
            }
        }

        let mut guard = self.inner.lock().unwrap();
        guard.locks.release_all(tid);
        drop(guard);
        self.cond.notify_all();

        info!("{tid} {}", if commit { "committed" } else { "aborted" });
        Ok(())
    }

    /// Releases `tid`'s lock on `pid` alone, independent of transaction
    /// completion. Unsafe outside tests: releasing one lock while a
    /// transaction continues to run breaks strict 2PL, since a reader could
    /// then observe a later write from the same transaction without the
    /// exclusive lock that should still be guarding it.
    pub fn release_page(&self, tid: TransactionId, pid: PageId) {
        let mut guard = self.inner.lock().unwrap();
        guard.locks.release(tid, pid);
        drop(guard);
        self.cond.notify_all();
    }

    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        self.inner.lock().unwrap().locks.holds_lock(tid, pid)
    }

    pub fn cached_page_count(&self) -> usize {
        self.inner.lock().unwrap().pages.len()
    }
}
