use std::sync::Arc;

use anyhow::Result;

use tarndb::{BufferPoolError, Page, PageId, PageManager, Permission, TransactionId, Tuple};

mod common;
use common::{append_empty_pages, create_test_pool, tuple_of_bytes};

const TABLE: u32 = 10;

#[test]
fn test_cache_hit_returns_same_page() -> Result<()> {
    let (pool, heap, _file) = create_test_pool(TABLE, 2)?;
    append_empty_pages(&heap, 1)?;

    let tid = TransactionId::new();
    let pid = PageId::new(TABLE, 0);

    let first = pool.get_page(tid, pid, Permission::Shared)?;
    let second = pool.get_page(tid, pid, Permission::Shared)?;

    // Hit path: the very same cached page comes back, nothing was evicted
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(pool.cached_pages(), vec![pid]);
    assert!(pool.holds_lock(tid, pid));

    pool.transaction_complete(tid, true)?;
    Ok(())
}

#[test]
fn test_clean_page_evicted_on_miss() -> Result<()> {
    let (pool, heap, _file) = create_test_pool(TABLE, 1)?;
    append_empty_pages(&heap, 2)?;

    let tid = TransactionId::new();
    pool.get_page(tid, PageId::new(TABLE, 0), Permission::Shared)?;
    pool.get_page(tid, PageId::new(TABLE, 1), Permission::Shared)?;

    // Page 0 was clean and made room for page 1
    assert_eq!(pool.cached_pages(), vec![PageId::new(TABLE, 1)]);

    pool.transaction_complete(tid, true)?;
    Ok(())
}

#[test]
fn test_no_steal_refuses_to_evict_dirty_page() -> Result<()> {
    let (pool, heap, _file) = create_test_pool(TABLE, 1)?;
    append_empty_pages(&heap, 2)?;

    let t1 = TransactionId::new();
    pool.get_page(t1, PageId::new(TABLE, 0), Permission::Exclusive)?;

    let mut tuple = tuple_of_bytes(32, 0xAB);
    pool.insert_tuple(t1, TABLE, &mut tuple)?;

    // The only frame holds T1's uncommitted page; T2's miss cannot evict it
    let t2 = TransactionId::new();
    let err = pool
        .get_page(t2, PageId::new(TABLE, 1), Permission::Shared)
        .unwrap_err();
    assert!(matches!(err, BufferPoolError::AllPagesDirty));

    pool.transaction_complete(t2, false)?;
    pool.transaction_complete(t1, true)?;
    Ok(())
}

#[test]
fn test_eviction_prefers_least_recently_used() -> Result<()> {
    let (pool, heap, _file) = create_test_pool(TABLE, 2)?;
    append_empty_pages(&heap, 3)?;

    let tid = TransactionId::new();
    pool.get_page(tid, PageId::new(TABLE, 0), Permission::Shared)?;
    pool.get_page(tid, PageId::new(TABLE, 1), Permission::Shared)?;
    // Touch page 0 again so page 1 is the coldest
    pool.get_page(tid, PageId::new(TABLE, 0), Permission::Shared)?;

    pool.get_page(tid, PageId::new(TABLE, 2), Permission::Shared)?;
    assert_eq!(
        pool.cached_pages(),
        vec![PageId::new(TABLE, 0), PageId::new(TABLE, 2)]
    );

    pool.transaction_complete(tid, true)?;
    Ok(())
}

#[test]
fn test_get_page_does_not_mark_dirty() -> Result<()> {
    let (pool, heap, _file) = create_test_pool(TABLE, 2)?;
    append_empty_pages(&heap, 1)?;

    let tid = TransactionId::new();
    let page = pool.get_page(tid, PageId::new(TABLE, 0), Permission::Exclusive)?;

    // Exclusive intent alone does not dirty a page
    assert!(page.read().is_dirty().is_none());

    pool.transaction_complete(tid, true)?;
    Ok(())
}

#[test]
fn test_insert_marks_page_dirty_by_owner() -> Result<()> {
    let (pool, heap, _file) = create_test_pool(TABLE, 2)?;
    append_empty_pages(&heap, 1)?;

    let tid = TransactionId::new();
    let mut tuple = tuple_of_bytes(16, 0x01);
    pool.insert_tuple(tid, TABLE, &mut tuple)?;

    let rid = tuple.rid().expect("insert must place the tuple");
    let page = pool.get_page(tid, rid.page_id, Permission::Shared)?;
    assert_eq!(page.read().is_dirty(), Some(tid));

    pool.transaction_complete(tid, true)?;
    Ok(())
}

#[test]
fn test_insert_appends_page_when_table_is_full() -> Result<()> {
    let (pool, heap, _file) = create_test_pool(TABLE, 4)?;
    append_empty_pages(&heap, 1)?;

    let tid = TransactionId::new();

    // Two records of ~3KB cannot share one 4KB page
    let mut first = tuple_of_bytes(3000, 0x11);
    pool.insert_tuple(tid, TABLE, &mut first)?;
    let mut second = tuple_of_bytes(3000, 0x22);
    pool.insert_tuple(tid, TABLE, &mut second)?;

    assert_eq!(first.rid().unwrap().page_id, PageId::new(TABLE, 0));
    assert_eq!(second.rid().unwrap().page_id, PageId::new(TABLE, 1));
    assert_eq!(heap.num_pages()?, 2);

    pool.transaction_complete(tid, true)?;
    Ok(())
}

#[test]
fn test_write_discard_read_round_trip() -> Result<()> {
    let (pool, heap, _file) = create_test_pool(TABLE, 2)?;

    let pid = PageId::new(TABLE, 0);
    let page_manager = PageManager::new();
    let mut page = Page::new(pid);
    page_manager.init_page(&mut page);
    page_manager.insert_record(&mut page, b"round trip bytes")?;

    heap.write_page(&page)?;
    pool.discard_page(pid);

    let read_back = heap.read_page(pid)?;
    assert_eq!(read_back.data, page.data);

    // The pool refetches the same image
    let tid = TransactionId::new();
    let fetched = pool.get_page(tid, pid, Permission::Shared)?;
    assert_eq!(fetched.read().data, page.data);
    pool.transaction_complete(tid, true)?;
    Ok(())
}

#[test]
fn test_flush_all_pages_is_idempotent() -> Result<()> {
    let (pool, heap, _file) = create_test_pool(TABLE, 4)?;
    append_empty_pages(&heap, 1)?;

    let tid = TransactionId::new();
    let mut tuple = tuple_of_bytes(64, 0x3C);
    pool.insert_tuple(tid, TABLE, &mut tuple)?;

    pool.flush_all_pages()?;

    // Everything cached is clean now, and stays clean on a second pass
    for pid in pool.cached_pages() {
        let page = pool.get_page(tid, pid, Permission::Shared)?;
        assert!(page.read().is_dirty().is_none());
    }
    pool.flush_all_pages()?;

    let on_disk = heap.read_page(tuple.rid().unwrap().page_id)?;
    assert_eq!(PageManager::new().get_record(&on_disk, 0)?, vec![0x3C; 64]);

    pool.transaction_complete(tid, true)?;
    Ok(())
}

#[test]
fn test_unknown_table_is_reported() -> Result<()> {
    let (pool, _heap, _file) = create_test_pool(TABLE, 2)?;

    let tid = TransactionId::new();
    let err = pool
        .get_page(tid, PageId::new(99, 0), Permission::Shared)
        .unwrap_err();
    assert!(matches!(err, BufferPoolError::UnknownTable(99)));
    Ok(())
}

#[test]
fn test_delete_tuple_requires_record_id() -> Result<()> {
    let (pool, _heap, _file) = create_test_pool(TABLE, 2)?;

    let tid = TransactionId::new();
    let unplaced = Tuple::new(vec![1, 2, 3]);
    assert!(pool.delete_tuple(tid, &unplaced).is_err());
    Ok(())
}

#[test]
fn test_insert_then_delete_round_trip() -> Result<()> {
    let (pool, heap, _file) = create_test_pool(TABLE, 4)?;
    append_empty_pages(&heap, 1)?;

    let tid = TransactionId::new();
    let mut tuple = tuple_of_bytes(32, 0x55);
    pool.insert_tuple(tid, TABLE, &mut tuple)?;
    pool.delete_tuple(tid, &tuple)?;
    pool.transaction_complete(tid, true)?;

    // After commit the page on disk holds only the tombstone
    let rid = tuple.rid().unwrap();
    let on_disk = heap.read_page(rid.page_id)?;
    let page_manager = PageManager::new();
    assert_eq!(page_manager.live_record_count(&on_disk), 0);
    Ok(())
}
