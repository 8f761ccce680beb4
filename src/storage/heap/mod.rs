mod file;
mod tuple;

pub use file::{HeapFile, HeapFileError};
pub use tuple::{RecordId, Tuple};
