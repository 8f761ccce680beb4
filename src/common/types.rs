use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::config::page_size;

/// Table ID type
pub type TableId = u32;

/// Identifies a page as (table, page number). The derived ordering makes
/// iteration over lock sets and cache snapshots deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    pub table_id: TableId,
    pub page_number: u32,
}

impl PageId {
    pub fn new(table_id: TableId, page_number: u32) -> Self {
        Self {
            table_id,
            page_number,
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.table_id, self.page_number)
    }
}

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque transaction identifier; equality is identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Allocate a fresh id from the process-wide counter
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        TransactionId(NEXT_TRANSACTION_ID.fetch_add(1, Ordering::SeqCst))
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Lock mode requested on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Shared,
    Exclusive,
}

impl Permission {
    /// True when holding `self` already satisfies a request for `other`
    pub fn covers(self, other: Permission) -> bool {
        self == Permission::Exclusive || other == Permission::Shared
    }
}

/// In-memory image of a disk page. The dirty indicator names the
/// transaction that modified the page, or nothing when the image matches
/// disk.
#[derive(Debug, Clone)]
pub struct Page {
    id: PageId,
    pub data: Vec<u8>,
    dirtied_by: Option<TransactionId>,
}

impl Page {
    pub fn new(id: PageId) -> Self {
        Self {
            id,
            data: vec![0; page_size()],
            dirtied_by: None,
        }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    /// The transaction that dirtied this page, if any
    pub fn is_dirty(&self) -> Option<TransactionId> {
        self.dirtied_by
    }

    pub fn mark_dirty(&mut self, tid: TransactionId) {
        self.dirtied_by = Some(tid);
    }

    pub fn mark_clean(&mut self) {
        self.dirtied_by = None;
    }
}

/// Smart pointer to a page
pub type PagePtr = Arc<RwLock<Page>>;
