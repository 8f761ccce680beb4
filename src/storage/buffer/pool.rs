use std::sync::Arc;

use log::debug;
use parking_lot::{Mutex, RwLock};

use crate::catalog::Catalog;
use crate::common::types::{PageId, PagePtr, Permission, TableId, TransactionId};
use crate::storage::buffer::cache::PageCache;
use crate::storage::buffer::error::BufferPoolError;
use crate::storage::buffer::replacer::LruReplacer;
use crate::storage::heap::{HeapFileError, Tuple};
use crate::transaction::concurrency::LockManager;

struct PoolInner {
    cache: PageCache,
    replacer: LruReplacer,
}

/// The buffer pool mediates every page access. It acquires page locks on
/// behalf of transactions (strict 2PL with deadlock detection), caches at
/// most `capacity` pages fetched through the catalog's heap files, and
/// enforces NO-STEAL at eviction and FORCE at commit: a dirty page never
/// reaches disk before its transaction commits, and commit writes all of
/// them before returning.
pub struct BufferPool {
    capacity: usize,
    catalog: Arc<Catalog>,
    lock_manager: LockManager,
    inner: Mutex<PoolInner>,
}

impl BufferPool {
    pub fn new(capacity: usize, catalog: Arc<Catalog>) -> Self {
        Self {
            capacity,
            catalog,
            lock_manager: LockManager::new(),
            inner: Mutex::new(PoolInner {
                cache: PageCache::new(capacity),
                replacer: LruReplacer::new(capacity),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fetch `pid` on behalf of `tid`, blocking until the lock for `perm`
    /// is granted. A miss on a full cache evicts a clean page first; the
    /// pool mutex stays held across evict, read and insert so the caller
    /// sees a consistent cache. Fetching never marks the page dirty:
    /// dirtiness comes from modification, not from exclusive intent.
    pub fn get_page(
        &self,
        tid: TransactionId,
        pid: PageId,
        perm: Permission,
    ) -> Result<PagePtr, BufferPoolError> {
        self.lock_manager.acquire(tid, pid, perm)?;

        let mut inner = self.inner.lock();
        if let Some(page) = inner.cache.get(&pid) {
            inner.replacer.record_access(pid);
            return Ok(page);
        }

        if inner.cache.is_full() {
            Self::evict(&mut inner)?;
        }

        let file = self
            .catalog
            .heap_file(pid.table_id)
            .ok_or(BufferPoolError::UnknownTable(pid.table_id))?;
        let page = Arc::new(RwLock::new(file.read_page(pid)?));
        inner.cache.put(pid, Arc::clone(&page));
        inner.replacer.record_access(pid);
        Ok(page)
    }

    /// Evict the least recently used clean page. Dirty pages are never
    /// victims: with no log, a dirty page on disk would be an uncommitted
    /// update the store can not take back.
    fn evict(inner: &mut PoolInner) -> Result<(), BufferPoolError> {
        let PoolInner { cache, replacer } = inner;
        let victim = replacer
            .victim(|pid| {
                cache
                    .get(pid)
                    .map_or(true, |page| page.read().is_dirty().is_none())
            })
            .ok_or(BufferPoolError::AllPagesDirty)?;
        cache.remove(&victim);
        debug!("evicted clean page {victim}");
        Ok(())
    }

    /// Insert `tuple` into `table_id`. The heap file requests the pages it
    /// touches through `get_page`, so 2PL is enforced on the way; every
    /// page it modified comes back dirtied by `tid` and cached.
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        table_id: TableId,
        tuple: &mut Tuple,
    ) -> Result<(), BufferPoolError> {
        let file = self
            .catalog
            .heap_file(table_id)
            .ok_or(BufferPoolError::UnknownTable(table_id))?;
        let dirtied = file.insert_tuple(tid, self, tuple)?;
        self.absorb_dirty(tid, dirtied)
    }

    /// Remove the tuple named by its record id from its table
    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> Result<(), BufferPoolError> {
        let table_id = tuple
            .rid()
            .ok_or(HeapFileError::MissingRecordId)?
            .page_id
            .table_id;
        let file = self
            .catalog
            .heap_file(table_id)
            .ok_or(BufferPoolError::UnknownTable(table_id))?;
        let dirtied = file.delete_tuple(tid, self, tuple)?;
        self.absorb_dirty(tid, dirtied)
    }

    /// Mark pages modified by `tid` dirty and make sure the modified
    /// versions sit in the cache, replacing whatever was there. A clean
    /// page evicted between modification and this call is re-admitted.
    fn absorb_dirty(
        &self,
        tid: TransactionId,
        pages: Vec<PagePtr>,
    ) -> Result<(), BufferPoolError> {
        let mut inner = self.inner.lock();
        for page in pages {
            let pid = {
                let mut guard = page.write();
                guard.mark_dirty(tid);
                guard.id()
            };
            if !inner.cache.contains(&pid) && inner.cache.is_full() {
                Self::evict(&mut inner)?;
            }
            inner.cache.put(pid, Arc::clone(&page));
            inner.replacer.record_access(pid);
        }
        Ok(())
    }

    /// Commit or abort `tid`. Commit flushes every page the transaction
    /// held exclusively (FORCE); abort discards them from the cache so the
    /// next reader refetches the on-disk pre-image. Either way, every lock
    /// the transaction holds is released afterwards.
    pub fn transaction_complete(
        &self,
        tid: TransactionId,
        commit: bool,
    ) -> Result<(), BufferPoolError> {
        for (pid, perm) in self.lock_manager.locks_held_by(tid) {
            if perm != Permission::Exclusive {
                continue;
            }
            if commit {
                self.flush_page(pid)?;
            } else {
                self.discard_page(pid);
            }
        }
        self.lock_manager.release_all(tid);
        debug!(
            "transaction {tid} {}",
            if commit { "committed" } else { "aborted" }
        );
        Ok(())
    }

    /// True when `tid` holds a lock of any mode on `pid`
    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        self.lock_manager.holds(tid, pid)
    }

    /// Release a single page lock mid-transaction. This breaks strict 2PL
    /// and can expose other transactions to uncommitted state; recovery
    /// style code paths only.
    pub fn release_page(&self, tid: TransactionId, pid: PageId) {
        self.lock_manager.release(tid, pid);
    }

    /// Write `pid`'s cached image back to its heap file and clear the
    /// dirty flag. Clean or uncached pages are left alone.
    pub fn flush_page(&self, pid: PageId) -> Result<(), BufferPoolError> {
        let inner = self.inner.lock();
        let Some(page) = inner.cache.get(&pid) else {
            return Ok(());
        };
        let mut guard = page.write();
        if guard.is_dirty().is_none() {
            return Ok(());
        }
        let file = self
            .catalog
            .heap_file(pid.table_id)
            .ok_or(BufferPoolError::UnknownTable(pid.table_id))?;
        file.write_page(&guard)?;
        guard.mark_clean();
        debug!("flushed page {pid}");
        Ok(())
    }

    /// Flush every dirty cached page. Once everything is clean this is a
    /// no-op until new pages are dirtied.
    pub fn flush_all_pages(&self) -> Result<(), BufferPoolError> {
        let pids = self.inner.lock().cache.snapshot_keys();
        for pid in pids {
            self.flush_page(pid)?;
        }
        Ok(())
    }

    /// Drop `pid` from the cache without writing it back
    pub fn discard_page(&self, pid: PageId) {
        let mut inner = self.inner.lock();
        inner.cache.remove(&pid);
        inner.replacer.remove(&pid);
    }

    /// Ids of the currently cached pages in (table, page number) order
    pub fn cached_pages(&self) -> Vec<PageId> {
        self.inner.lock().cache.snapshot_keys()
    }
}
