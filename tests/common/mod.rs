use std::sync::Arc;

use anyhow::Result;
use tempfile::NamedTempFile;

use tarndb::{BufferPool, Catalog, HeapFile, Page, PageId, PageManager, TableId, Tuple};

// Create a buffer pool over a single empty heap file registered as `table_id`
#[allow(dead_code)]
pub fn create_test_pool(
    table_id: TableId,
    pool_size: usize,
) -> Result<(Arc<BufferPool>, Arc<HeapFile>, NamedTempFile)> {
    let file = NamedTempFile::new()?;
    let heap = Arc::new(HeapFile::open(file.path(), table_id)?);
    let catalog = Arc::new(Catalog::new());
    catalog.register_table(Arc::clone(&heap));
    Ok((Arc::new(BufferPool::new(pool_size, catalog)), heap, file))
}

// Extend the table's file with `count` empty page images
#[allow(dead_code)]
pub fn append_empty_pages(heap: &HeapFile, count: u32) -> Result<()> {
    let page_manager = PageManager::new();
    for page_number in 0..count {
        let mut page = Page::new(PageId::new(heap.table_id(), page_number));
        page_manager.init_page(&mut page);
        heap.write_page(&page)?;
    }
    Ok(())
}

// Build a tuple of `len` bytes, each set to `fill`
#[allow(dead_code)]
pub fn tuple_of_bytes(len: usize, fill: u8) -> Tuple {
    Tuple::new(vec![fill; len])
}
