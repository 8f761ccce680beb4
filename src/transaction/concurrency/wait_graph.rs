use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::common::types::{PageId, Permission, TransactionId};

/// Raised when granting a lock wait would close a cycle in the wait-for
/// graph. The victim is always the requester; its caller must follow up
/// with `transaction_complete(tid, false)` to roll back.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("transaction {tid} aborted: waiting on page {pid} would deadlock")]
pub struct TransactionAborted {
    pub tid: TransactionId,
    pub pid: PageId,
}

/// Wait-for graph over transactions. Edges run from a waiting transaction
/// to every holder whose mode conflicts with the request; two shared
/// holders are compatible and never form an edge. A transaction has at
/// most one outstanding wait.
///
/// The graph holds no lock of its own: the lock manager serializes
/// `check`, `grant` and `release` under its table mutex.
#[derive(Debug, Default)]
pub struct WaitGraph {
    waits_on: HashMap<TransactionId, (PageId, Permission)>,
    holders: HashMap<PageId, HashSet<(TransactionId, Permission)>>,
}

impl WaitGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the wait edge for `tid`, unless doing so closes a cycle; in
    /// that case the tentative edge is removed again and the wait refused.
    pub fn check(
        &mut self,
        tid: TransactionId,
        pid: PageId,
        perm: Permission,
    ) -> Result<(), TransactionAborted> {
        self.waits_on.insert(tid, (pid, perm));
        if self.closes_cycle(tid) {
            self.waits_on.remove(&tid);
            return Err(TransactionAborted { tid, pid });
        }
        Ok(())
    }

    /// The wait is over: `tid` now holds `pid` in `perm` mode
    pub fn grant(&mut self, tid: TransactionId, pid: PageId, perm: Permission) {
        self.waits_on.remove(&tid);
        self.holders.entry(pid).or_default().insert((tid, perm));
    }

    pub fn release(&mut self, tid: TransactionId, pid: PageId, perm: Permission) {
        if let Some(set) = self.holders.get_mut(&pid) {
            set.remove(&(tid, perm));
            if set.is_empty() {
                self.holders.remove(&pid);
            }
        }
    }

    /// Drop any pending wait edge for `tid`
    pub fn cancel_wait(&mut self, tid: TransactionId) {
        self.waits_on.remove(&tid);
    }

    /// Depth-first search from `start` back to itself along wait edges.
    /// The visited set bounds the walk even if the graph were ever left
    /// inconsistent.
    fn closes_cycle(&self, start: TransactionId) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![start];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(&(pid, requested)) = self.waits_on.get(&current) else {
                continue;
            };
            let Some(holders) = self.holders.get(&pid) else {
                continue;
            };
            for &(holder, held) in holders {
                if holder == current {
                    continue; // an upgrader waits past its own shared hold
                }
                if held == Permission::Shared && requested == Permission::Shared {
                    continue;
                }
                if holder == start {
                    return true;
                }
                stack.push(holder);
            }
        }
        false
    }
}
