// Transaction concurrency module exports

pub mod lock_manager;
pub mod page_lock;
pub mod wait_graph;

// Public exports
pub use lock_manager::LockManager;
pub use page_lock::PageLock;
pub use wait_graph::{TransactionAborted, WaitGraph};
