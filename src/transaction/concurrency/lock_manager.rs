use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::Mutex;

use crate::common::types::{PageId, Permission, TransactionId};
use crate::transaction::concurrency::page_lock::PageLock;
use crate::transaction::concurrency::wait_graph::{TransactionAborted, WaitGraph};

#[derive(Default)]
struct LockTables {
    locks: HashMap<PageId, Arc<PageLock>>,
    records: HashMap<(TransactionId, PageId), Permission>,
    graph: WaitGraph,
}

/// What `acquire` decided to do once the tables were consulted. Blocking
/// happens on the page monitor after the table mutex is dropped.
enum Acquisition {
    Fresh(Arc<PageLock>),
    Upgrade(Arc<PageLock>),
}

/// Page-granularity strict 2PL lock table. A single mutex serializes the
/// lock keyset, the per-transaction lock records, and the wait-for graph;
/// the deadlock check runs (and the wait edge lands) inside that critical
/// section, before the caller ever blocks on a page monitor outside it.
pub struct LockManager {
    tables: Mutex<LockTables>,
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LockManager {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(LockTables::default()),
        }
    }

    /// Acquire `pid` for `tid` in `perm` mode, blocking until granted.
    /// Reentrant: a request at an equal or weaker mode than the held one
    /// returns immediately. A held shared lock plus an exclusive request
    /// becomes an upgrade. Fails with `TransactionAborted` when the wait
    /// would deadlock.
    pub fn acquire(
        &self,
        tid: TransactionId,
        pid: PageId,
        perm: Permission,
    ) -> Result<(), TransactionAborted> {
        let plan = {
            let mut tables = self.tables.lock();
            match tables.records.get(&(tid, pid)).copied() {
                Some(held) if held.covers(perm) => return Ok(()),
                Some(_) => {
                    // Holds shared, wants exclusive
                    if let Err(aborted) = tables.graph.check(tid, pid, Permission::Exclusive) {
                        debug!("deadlock: {tid} refused upgrade wait on page {pid}");
                        return Err(aborted);
                    }
                    let lock = Arc::clone(tables.locks.entry(pid).or_default());
                    Acquisition::Upgrade(lock)
                }
                None => {
                    if let Err(aborted) = tables.graph.check(tid, pid, perm) {
                        debug!("deadlock: {tid} refused {perm:?} wait on page {pid}");
                        return Err(aborted);
                    }
                    let lock = Arc::clone(tables.locks.entry(pid).or_default());
                    Acquisition::Fresh(lock)
                }
            }
        };

        match plan {
            Acquisition::Upgrade(lock) => {
                lock.upgrade(tid);
                let mut tables = self.tables.lock();
                tables.graph.release(tid, pid, Permission::Shared);
                tables.graph.grant(tid, pid, Permission::Exclusive);
                tables.records.insert((tid, pid), Permission::Exclusive);
                trace!("{tid} upgraded to Exclusive on page {pid}");
            }
            Acquisition::Fresh(lock) => {
                match perm {
                    Permission::Shared => lock.acquire_shared(tid),
                    Permission::Exclusive => lock.acquire_exclusive(tid),
                }
                let mut tables = self.tables.lock();
                tables.graph.grant(tid, pid, perm);
                tables.records.insert((tid, pid), perm);
                trace!("{tid} acquired {perm:?} on page {pid}");
            }
        }
        Ok(())
    }

    pub fn holds(&self, tid: TransactionId, pid: PageId) -> bool {
        self.tables.lock().records.contains_key(&(tid, pid))
    }

    pub fn held_mode(&self, tid: TransactionId, pid: PageId) -> Option<Permission> {
        self.tables.lock().records.get(&(tid, pid)).copied()
    }

    /// Release whatever `tid` holds on `pid`; no-op when nothing is held.
    /// Graph bookkeeping happens before the monitor release so a
    /// concurrent deadlock check never sees a stale holder.
    pub fn release(&self, tid: TransactionId, pid: PageId) {
        let released = {
            let mut tables = self.tables.lock();
            let Some(perm) = tables.records.remove(&(tid, pid)) else {
                return;
            };
            tables.graph.release(tid, pid, perm);
            tables.locks.get(&pid).map(|lock| (Arc::clone(lock), perm))
        };
        if let Some((lock, perm)) = released {
            match perm {
                Permission::Shared => lock.release_shared(tid),
                Permission::Exclusive => lock.release_exclusive(tid),
            }
            trace!("{tid} released {perm:?} on page {pid}");
        }
    }

    /// Every lock `tid` currently holds, in page order
    pub fn locks_held_by(&self, tid: TransactionId) -> Vec<(PageId, Permission)> {
        let tables = self.tables.lock();
        let mut held: Vec<(PageId, Permission)> = tables
            .records
            .iter()
            .filter(|((owner, _), _)| *owner == tid)
            .map(|((_, pid), perm)| (*pid, *perm))
            .collect();
        held.sort_unstable_by_key(|(pid, _)| *pid);
        held
    }

    /// Release everything `tid` holds; used at commit and abort
    pub fn release_all(&self, tid: TransactionId) {
        self.tables.lock().graph.cancel_wait(tid);
        for (pid, _) in self.locks_held_by(tid) {
            self.release(tid, pid);
        }
    }
}
