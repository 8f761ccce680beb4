use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::types::TableId;
use crate::storage::heap::HeapFile;

/// Directory of heap files by table id. Schema and column metadata live
/// outside the transactional core; the buffer pool only ever asks for the
/// file behind a table id.
pub struct Catalog {
    tables: RwLock<HashMap<TableId, Arc<HeapFile>>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Register `file` under its own table id, replacing any previous
    /// registration.
    pub fn register_table(&self, file: Arc<HeapFile>) {
        self.tables.write().insert(file.table_id(), file);
    }

    pub fn heap_file(&self, table_id: TableId) -> Option<Arc<HeapFile>> {
        self.tables.read().get(&table_id).cloned()
    }

    /// Registered table ids in ascending order
    pub fn table_ids(&self) -> Vec<TableId> {
        let mut ids: Vec<TableId> = self.tables.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
