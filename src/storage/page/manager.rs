use crate::common::config::page_size;
use crate::common::types::Page;
use crate::storage::page::error::PageError;
use crate::storage::page::header::PageHeader;
use crate::storage::page::layout::{SlotEntry, HEADER_SIZE, SLOT_ENTRY_SIZE};

/// Stateless manager for the slotted page layout. Record data grows up
/// from the header; the slot directory grows down from the end of the
/// page. Deleted records keep their slot as a zero-length tombstone so
/// record ids of the survivors stay stable.
pub struct PageManager;

impl Default for PageManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PageManager {
    pub fn new() -> Self {
        Self
    }

    /// Write a fresh header; the page afterwards holds no records.
    pub fn init_page(&self, page: &mut Page) {
        let header = PageHeader::new();
        page.data[0..HEADER_SIZE].copy_from_slice(&header.to_bytes());
    }

    fn header(&self, page: &Page) -> PageHeader {
        PageHeader::from_bytes(&page.data[0..HEADER_SIZE])
    }

    fn put_header(&self, page: &mut Page, header: &PageHeader) {
        page.data[0..HEADER_SIZE].copy_from_slice(&header.to_bytes());
    }

    fn slot_position(&self, slot: u32) -> usize {
        page_size() - SLOT_ENTRY_SIZE * (slot as usize + 1)
    }

    fn slot(&self, page: &Page, slot: u32) -> SlotEntry {
        let pos = self.slot_position(slot);
        SlotEntry::from_bytes(&page.data[pos..pos + SLOT_ENTRY_SIZE])
    }

    fn put_slot(&self, page: &mut Page, slot: u32, entry: SlotEntry) {
        let pos = self.slot_position(slot);
        page.data[pos..pos + SLOT_ENTRY_SIZE].copy_from_slice(&entry.to_bytes());
    }

    /// Number of slots ever allocated on the page, tombstones included
    pub fn record_count(&self, page: &Page) -> u32 {
        self.header(page).record_count
    }

    /// Number of live records on the page
    pub fn live_record_count(&self, page: &Page) -> u32 {
        let header = self.header(page);
        (0..header.record_count)
            .filter(|&slot| self.slot(page, slot).length != 0)
            .count() as u32
    }

    /// Whether a record of `record_len` bytes plus its slot entry fits
    pub fn has_space(&self, page: &Page, record_len: usize) -> bool {
        self.header(page).free_space_size as usize >= record_len + SLOT_ENTRY_SIZE
    }

    pub fn insert_record(&self, page: &mut Page, data: &[u8]) -> Result<u32, PageError> {
        let mut header = self.header(page);

        // Record bytes plus the slot entry for the record
        let needed = data.len() + SLOT_ENTRY_SIZE;
        if (header.free_space_size as usize) < needed {
            return Err(PageError::InsufficientSpace);
        }

        let slot = header.record_count;
        let entry = SlotEntry {
            offset: header.free_space_offset,
            length: data.len() as u32,
        };

        let start = header.free_space_offset as usize;
        page.data[start..start + data.len()].copy_from_slice(data);
        self.put_slot(page, slot, entry);

        header.free_space_offset += data.len() as u32;
        header.free_space_size -= needed as u32;
        header.record_count += 1;
        self.put_header(page, &header);

        Ok(slot)
    }

    /// Mark the record's slot as deleted. The record bytes are not
    /// reclaimed; that only happens when the page is rewritten.
    pub fn delete_record(&self, page: &mut Page, slot: u32) -> Result<(), PageError> {
        let header = self.header(page);
        if slot >= header.record_count {
            return Err(PageError::InvalidSlot);
        }
        let mut entry = self.slot(page, slot);
        if entry.length == 0 {
            return Err(PageError::RecordNotFound); // Already deleted
        }
        entry.length = 0;
        self.put_slot(page, slot, entry);
        Ok(())
    }

    pub fn get_record(&self, page: &Page, slot: u32) -> Result<Vec<u8>, PageError> {
        let header = self.header(page);
        if slot >= header.record_count {
            return Err(PageError::InvalidSlot);
        }
        let entry = self.slot(page, slot);
        if entry.length == 0 {
            return Err(PageError::RecordNotFound);
        }
        let start = entry.offset as usize;
        Ok(page.data[start..start + entry.length as usize].to_vec())
    }
}
