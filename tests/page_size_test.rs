use anyhow::Result;

use tarndb::common::config::{page_size, reset_page_size, set_page_size, DEFAULT_PAGE_SIZE};
use tarndb::{PageId, TransactionId};

mod common;
use common::{append_empty_pages, create_test_pool, tuple_of_bytes};

// The override is process-wide, so this binary holds exactly one test.
#[test]
fn test_page_size_override_round_trip() -> Result<()> {
    assert_eq!(page_size(), DEFAULT_PAGE_SIZE);
    set_page_size(512);

    let (pool, heap, _file) = create_test_pool(7, 4)?;
    append_empty_pages(&heap, 1)?;

    // A 512-byte page fits one 300-byte record, not two
    let tid = TransactionId::new();
    let mut first = tuple_of_bytes(300, 0xA1);
    pool.insert_tuple(tid, 7, &mut first)?;
    let mut second = tuple_of_bytes(300, 0xB2);
    pool.insert_tuple(tid, 7, &mut second)?;

    assert_eq!(first.rid().unwrap().page_id, PageId::new(7, 0));
    assert_eq!(second.rid().unwrap().page_id, PageId::new(7, 1));
    pool.transaction_complete(tid, true)?;

    assert_eq!(heap.num_pages()?, 2);

    reset_page_size();
    assert_eq!(page_size(), DEFAULT_PAGE_SIZE);
    Ok(())
}
