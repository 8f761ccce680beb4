pub mod concurrency;

// Public exports
pub use concurrency::{LockManager, TransactionAborted};
