use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use parking_lot::Mutex;
use thiserror::Error;

use crate::common::config::page_size;
use crate::common::types::{Page, PageId, PagePtr, Permission, TableId, TransactionId};
use crate::storage::buffer::{BufferPool, BufferPoolError};
use crate::storage::heap::tuple::{RecordId, Tuple};
use crate::storage::page::{PageError, PageManager};

#[derive(Error, Debug)]
pub enum HeapFileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Page error: {0}")]
    Page(#[from] PageError),
    #[error("Tuple carries no record id")]
    MissingRecordId,
    #[error("Tuple belongs to table {actual}, not table {expected}")]
    WrongTable { expected: TableId, actual: TableId },
}

/// A heap file stores tuples in no particular order across fixed-size
/// pages, concatenated from offset 0 with no file header. Every page it
/// touches on behalf of a transaction is requested through the buffer
/// pool, which is where locking happens; the file itself never takes page
/// locks.
pub struct HeapFile {
    file: Mutex<File>,
    table_id: TableId,
    page_manager: PageManager,
}

impl HeapFile {
    /// Open (or create) the backing file for `table_id`
    pub fn open(path: impl AsRef<Path>, table_id: TableId) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Ok(Self {
            file: Mutex::new(file),
            table_id,
            page_manager: PageManager::new(),
        })
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Read the page at `pid`. A read landing past the end of the file
    /// yields an initialized empty page: the append path fetches the new
    /// page before the extending write hits disk.
    pub fn read_page(&self, pid: PageId) -> io::Result<Page> {
        let offset = pid.page_number as u64 * page_size() as u64;
        let mut page = Page::new(pid);

        let mut file = self.file.lock();
        let file_size = file.metadata()?.len();
        if offset >= file_size {
            self.page_manager.init_page(&mut page);
            return Ok(page);
        }

        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut page.data)?;
        Ok(page)
    }

    /// Write the full page image at its offset
    pub fn write_page(&self, page: &Page) -> io::Result<()> {
        let offset = page.id().page_number as u64 * page_size() as u64;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&page.data)?;
        file.flush()
    }

    /// Number of pages in the file
    pub fn num_pages(&self) -> io::Result<u32> {
        let len = self.file.lock().metadata()?.len();
        let page_size = page_size() as u64;
        Ok(((len + page_size - 1) / page_size) as u32)
    }

    /// Insert `tuple` into the first page with room, scanning by ascending
    /// page number under a shared lock and re-requesting the chosen page
    /// exclusively. When every page is full, a fresh empty page is
    /// appended at `num_pages` and the tuple goes there. Returns the
    /// page(s) the insert modified.
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        pool: &BufferPool,
        tuple: &mut Tuple,
    ) -> Result<Vec<PagePtr>, BufferPoolError> {
        let record_len = tuple.data().len();
        let num_pages = self.num_pages().map_err(HeapFileError::from)?;

        let mut target = None;
        for page_number in 0..num_pages {
            let pid = PageId::new(self.table_id, page_number);
            let page = pool.get_page(tid, pid, Permission::Shared)?;
            if self.page_manager.has_space(&page.read(), record_len) {
                target = Some(pid);
                break;
            }
        }

        let (pid, page) = match target {
            Some(pid) => (pid, pool.get_page(tid, pid, Permission::Exclusive)?),
            None => {
                // Append: the pool fetches an empty image past EOF, then the
                // extending write makes the new page count visible on disk.
                let pid = PageId::new(self.table_id, num_pages);
                let page = pool.get_page(tid, pid, Permission::Exclusive)?;
                self.write_page(&page.read()).map_err(HeapFileError::from)?;
                (pid, page)
            }
        };

        let slot = {
            let mut guard = page.write();
            self.page_manager
                .insert_record(&mut guard, tuple.data())
                .map_err(HeapFileError::from)?
        };
        tuple.set_rid(RecordId { page_id: pid, slot });

        Ok(vec![page])
    }

    /// Delete the tuple named by its record id. Returns the modified page.
    pub fn delete_tuple(
        &self,
        tid: TransactionId,
        pool: &BufferPool,
        tuple: &Tuple,
    ) -> Result<Vec<PagePtr>, BufferPoolError> {
        let rid = tuple.rid().ok_or(HeapFileError::MissingRecordId)?;
        if rid.page_id.table_id != self.table_id {
            return Err(HeapFileError::WrongTable {
                expected: self.table_id,
                actual: rid.page_id.table_id,
            }
            .into());
        }

        let page = pool.get_page(tid, rid.page_id, Permission::Exclusive)?;
        {
            let mut guard = page.write();
            self.page_manager
                .delete_record(&mut guard, rid.slot)
                .map_err(HeapFileError::from)?;
        }

        Ok(vec![page])
    }
}
