//! A world directory of region files (`r.X.Z.mca`).

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::ChunkCache;
use crate::error::{RegionError, RegionResult};
use crate::nbt::Chunk;
use crate::region::{ChunkPos, RegionFile, RegionPos};

/// Resolves world chunk coordinates to region files, opening each file at most
/// once and only when first needed.
pub struct World {
    dir: PathBuf,
    regions: ChunkCache<RegionPos, RegionFile<File>>,
    chunks_per_region: usize,
}

impl World {
    /// A world that keeps every opened region and decoded chunk.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self::with_capacity(dir, 0, 0)
    }

    /// A world holding at most `regions` open region files, each caching at
    /// most `chunks_per_region` decoded chunks. Zero means unbounded.
    pub fn with_capacity(
        dir: impl Into<PathBuf>,
        regions: usize,
        chunks_per_region: usize,
    ) -> Self {
        Self {
            dir: dir.into(),
            regions: ChunkCache::with_capacity(regions),
            chunks_per_region,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Region files present on disk, in no particular order.
    pub fn region_positions(&self) -> RegionResult<Vec<RegionPos>> {
        let mut positions = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if let Some(pos) = entry.file_name().to_str().and_then(RegionPos::from_filename) {
                positions.push(pos);
            }
        }
        Ok(positions)
    }

    /// The opened region, or `None` if its file does not exist.
    pub async fn region(&self, pos: RegionPos) -> RegionResult<Option<Arc<RegionFile<File>>>> {
        let path = self.dir.join(pos.filename());
        let capacity = self.chunks_per_region;
        let load = move || RegionFile::open_path(path).map(|r| r.with_cache_capacity(capacity));
        match self.regions.get_or_load(pos, load).await {
            Ok(region) => Ok(Some(region)),
            Err(e) if e.is_file_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Load the chunk column at world chunk coordinates `(x, z)`.
    pub async fn get_chunk(&self, x: i32, z: i32) -> RegionResult<Arc<Chunk>> {
        let pos = RegionPos::of_chunk(ChunkPos::new(x, z));
        match self.region(pos).await? {
            Some(region) => region.get_chunk(x, z).await,
            None => Err(RegionError::ChunkNotPresent { x, z }),
        }
    }

    pub fn regions(&self) -> &ChunkCache<RegionPos, RegionFile<File>> {
        &self.regions
    }
}
