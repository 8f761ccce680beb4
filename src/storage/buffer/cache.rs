use std::collections::HashMap;

use crate::common::types::{PageId, PagePtr};

/// Bounded map of cached pages. The cache holds no policy of its own: the
/// pool decides what to evict and when, the cache only enforces the
/// capacity invariant.
pub struct PageCache {
    pages: HashMap<PageId, PagePtr>,
    capacity: usize,
}

impl PageCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            pages: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.pages.len() >= self.capacity
    }

    pub fn contains(&self, pid: &PageId) -> bool {
        self.pages.contains_key(pid)
    }

    pub fn get(&self, pid: &PageId) -> Option<PagePtr> {
        self.pages.get(pid).cloned()
    }

    pub fn put(&mut self, pid: PageId, page: PagePtr) {
        debug_assert!(
            self.pages.contains_key(&pid) || self.pages.len() < self.capacity,
            "page cache over capacity"
        );
        self.pages.insert(pid, page);
    }

    pub fn remove(&mut self, pid: &PageId) -> Option<PagePtr> {
        self.pages.remove(pid)
    }

    /// Cached page ids in (table, page number) order
    pub fn snapshot_keys(&self) -> Vec<PageId> {
        let mut keys: Vec<PageId> = self.pages.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}
