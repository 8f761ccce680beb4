use thiserror::Error;

use crate::common::types::TableId;
use crate::storage::heap::HeapFileError;
use crate::transaction::concurrency::TransactionAborted;

#[derive(Error, Debug)]
pub enum BufferPoolError {
    #[error(transparent)]
    TransactionAborted(#[from] TransactionAborted),

    #[error("all pages in the buffer pool are dirty")]
    AllPagesDirty,

    #[error("no table registered under id {0}")]
    UnknownTable(TableId),

    #[error("heap file error: {0}")]
    HeapFile(#[from] HeapFileError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
