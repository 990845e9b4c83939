//! Region file location table.
//!
//! The first 4096 bytes of a region file hold 1024 big-endian entries:
//! `[sector_offset:3][sector_count:1]`.

use super::{CHUNKS_PER_REGION, LOCATION_TABLE_SIZE, SECTOR_SIZE, chunk_index};
use crate::error::{RegionError, RegionResult};

/// Where one chunk column is stored, in 4 KiB sectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocationEntry {
    pub sector_offset: u32,
    pub sector_count: u8,
}

impl LocationEntry {
    pub fn new(sector_offset: u32, sector_count: u8) -> Self {
        Self { sector_offset, sector_count }
    }

    /// Decode a packed `[offset:3][count:1]` entry.
    pub fn from_be_bytes(bytes: [u8; 4]) -> Self {
        let packed = u32::from_be_bytes(bytes);
        Self {
            sector_offset: packed >> 8,
            sector_count: (packed & 0xFF) as u8,
        }
    }

    pub fn to_be_bytes(&self) -> [u8; 4] {
        ((self.sector_offset << 8) | self.sector_count as u32).to_be_bytes()
    }

    /// No chunk is stored for this column.
    ///
    /// Besides the all-zero sentinel, an offset of 0 would point into the
    /// location table itself, so it never names real chunk data.
    pub fn is_absent(&self) -> bool {
        self.sector_offset == 0
    }

    /// Byte offset of the chunk record in the file.
    pub fn byte_offset(&self) -> u64 {
        super::sector_to_offset(self.sector_offset)
    }

    /// Number of bytes reserved for the chunk record.
    pub fn byte_len(&self) -> u64 {
        self.sector_count as u64 * SECTOR_SIZE as u64
    }
}

/// Immutable snapshot of a region's location table, taken when the file is opened.
#[derive(Debug, Clone)]
pub struct LocationTable {
    entries: Box<[LocationEntry; CHUNKS_PER_REGION]>,
}

impl LocationTable {
    /// Parse the 4096-byte header. Anything shorter is a truncated file.
    pub fn parse(header: &[u8]) -> RegionResult<Self> {
        if header.len() < LOCATION_TABLE_SIZE {
            return Err(RegionError::TruncatedHeader {
                expected: LOCATION_TABLE_SIZE,
                found: header.len(),
            });
        }

        let mut entries = Box::new([LocationEntry::default(); CHUNKS_PER_REGION]);
        for (entry, raw) in entries
            .iter_mut()
            .zip(header[..LOCATION_TABLE_SIZE].chunks_exact(4))
        {
            *entry = LocationEntry::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
        }

        Ok(Self { entries })
    }

    /// Entry by table index (0-1023).
    pub fn get(&self, index: usize) -> Option<LocationEntry> {
        self.entries.get(index).copied()
    }

    /// Entry for a world chunk column.
    pub fn entry(&self, chunk_x: i32, chunk_z: i32) -> LocationEntry {
        self.entries[chunk_index(chunk_x, chunk_z)]
    }

    /// Iterate over the columns that actually hold data.
    pub fn present(&self) -> impl Iterator<Item = (usize, LocationEntry)> + '_ {
        self.entries
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, entry)| !entry.is_absent())
    }

    pub fn len_present(&self) -> usize {
        self.present().count()
    }
}
