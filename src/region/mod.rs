//! Minecraft Anvil region file format (.mca).
//!
//! Region files contain 32x32 chunks in a specific binary format:
//! - Bytes 0-4095: Location table (1024 entries × 4 bytes)
//! - Chunk data at `sector_offset * 4096`: `[length:4][compression:1][payload:length-1]`
//!
//! Only the read path is implemented here.

mod compression;
mod file;
mod header;
mod record;
mod source;

#[cfg(test)]
pub(crate) mod testutil;

pub use compression::{CompressionScheme, decompress};
pub use file::RegionFile;
pub use header::{LocationEntry, LocationTable};
pub use record::{ChunkRecord, ChunkRecordReader};
pub use source::ReadAt;

/// Size of one sector in bytes (4 KB).
pub const SECTOR_SIZE: usize = 4096;

/// Size of the location table at the start of every region file.
pub const LOCATION_TABLE_SIZE: usize = SECTOR_SIZE;

/// Number of chunks per region dimension.
pub const REGION_SIZE: i32 = 32;

/// Number of chunk columns stored in one region file.
pub const CHUNKS_PER_REGION: usize = (REGION_SIZE * REGION_SIZE) as usize;

/// Convert chunk coordinates to local region coordinates (0-31).
#[inline]
pub fn chunk_to_local(chunk_coord: i32) -> i32 {
    chunk_coord.rem_euclid(REGION_SIZE)
}

/// Convert chunk coordinates to region coordinates.
#[inline]
pub fn chunk_to_region(chunk_coord: i32) -> i32 {
    chunk_coord.div_euclid(REGION_SIZE)
}

/// Calculate linear index for a chunk within a region (0-1023).
#[inline]
pub fn local_to_index(local_x: i32, local_z: i32) -> usize {
    (local_z * REGION_SIZE + local_x) as usize
}

/// Location table index of a world chunk column. Negative coordinates wrap
/// into the region the same way `chunk_to_region` assigns them.
#[inline]
pub fn chunk_index(chunk_x: i32, chunk_z: i32) -> usize {
    local_to_index(chunk_to_local(chunk_x), chunk_to_local(chunk_z))
}

/// Calculate local coordinates from linear index.
#[inline]
pub fn index_to_local(index: usize) -> (i32, i32) {
    let local_x = (index % REGION_SIZE as usize) as i32;
    let local_z = (index / REGION_SIZE as usize) as i32;
    (local_x, local_z)
}

/// Calculate file offset for a chunk given its sector number.
#[inline]
pub fn sector_to_offset(sector: u32) -> u64 {
    sector as u64 * SECTOR_SIZE as u64
}

/// Coordinates for a chunk column in the world.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Index of this column inside its region's location table.
    pub fn region_index(&self) -> usize {
        chunk_index(self.x, self.z)
    }
}

/// Region file coordinates (parsed from filename like "r.0.-1.mca").
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct RegionPos {
    pub x: i32,
    pub z: i32,
}

impl RegionPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The region holding the given chunk column.
    pub fn of_chunk(pos: ChunkPos) -> Self {
        Self {
            x: chunk_to_region(pos.x),
            z: chunk_to_region(pos.z),
        }
    }

    /// Parse region position from filename (e.g., "r.0.-1.mca").
    pub fn from_filename(name: &str) -> Option<Self> {
        let parts: Vec<&str> = name.split('.').collect();
        if parts.len() == 4 && parts[0] == "r" && parts[3] == "mca" {
            let x = parts[1].parse().ok()?;
            let z = parts[2].parse().ok()?;
            Some(Self { x, z })
        } else {
            None
        }
    }

    pub fn filename(&self) -> String {
        format!("r.{}.{}.mca", self.x, self.z)
    }

    /// Convert local chunk coordinates to world chunk coordinates.
    pub fn local_to_world(&self, local_x: i32, local_z: i32) -> ChunkPos {
        ChunkPos::new(
            self.x * REGION_SIZE + local_x,
            self.z * REGION_SIZE + local_z,
        )
    }
}
