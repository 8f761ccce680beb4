use parking_lot::{Condvar, Mutex};

use crate::common::types::TransactionId;

#[derive(Debug, Default)]
struct LockState {
    readers: u32,
    writer: Option<TransactionId>,
    upgrader: Option<TransactionId>,
}

/// Readers-writer lock for a single page, with shared-to-exclusive
/// upgrade. One monitor guards the whole state; each caller blocks on the
/// condvar until its predicate holds: no writer for shared, no holders at
/// all for exclusive, sole remaining reader for upgrade.
///
/// The monitor itself never gives up. Cycles among waiters, a second
/// concurrent upgrader included, must be refused by the wait-for graph
/// before the caller blocks here.
#[derive(Debug, Default)]
pub struct PageLock {
    state: Mutex<LockState>,
    cond: Condvar,
}

impl PageLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until no writer holds the page, then join the readers
    pub fn acquire_shared(&self, _tid: TransactionId) {
        let mut state = self.state.lock();
        while state.writer.is_some() {
            self.cond.wait(&mut state);
        }
        state.readers += 1;
    }

    /// Block until the page has no holders at all, then take it
    pub fn acquire_exclusive(&self, tid: TransactionId) {
        let mut state = self.state.lock();
        while state.readers > 0 || state.writer.is_some() {
            self.cond.wait(&mut state);
        }
        state.writer = Some(tid);
    }

    /// Trade a held shared lock for the exclusive one. Blocks until the
    /// caller is the sole reader; the switch itself is a single step under
    /// the monitor, so no other holder can slip in between. At most one
    /// upgrade is in flight per lock.
    pub fn upgrade(&self, tid: TransactionId) {
        let mut state = self.state.lock();
        debug_assert!(state.readers > 0, "upgrade without a shared hold");
        while state.upgrader.is_some() {
            self.cond.wait(&mut state);
        }
        state.upgrader = Some(tid);
        while state.readers > 1 || state.writer.is_some() {
            self.cond.wait(&mut state);
        }
        state.readers -= 1;
        state.writer = Some(tid);
        state.upgrader = None;
        self.cond.notify_all();
    }

    pub fn release_shared(&self, _tid: TransactionId) {
        let mut state = self.state.lock();
        debug_assert!(state.readers > 0, "release without a shared hold");
        state.readers -= 1;
        self.cond.notify_all();
    }

    pub fn release_exclusive(&self, tid: TransactionId) {
        let mut state = self.state.lock();
        debug_assert_eq!(state.writer, Some(tid), "release by a non-writer");
        state.writer = None;
        self.cond.notify_all();
    }
}
