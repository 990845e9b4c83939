use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use super::{
    ChunkPos, ChunkRecordReader, LOCATION_TABLE_SIZE, LocationTable, ReadAt, chunk_to_local,
    decompress,
};
use crate::cache::ChunkCache;
use crate::chunk::decode_chunk;
use crate::error::{RegionError, RegionResult};
use crate::nbt::Chunk;

/// A region container opened for reading, with its decoded chunks cached by
/// local column (0-31 on each axis).
pub struct RegionFile<S: ReadAt + 'static> {
    source: Arc<S>,
    locations: LocationTable,
    cache: ChunkCache<ChunkPos, Chunk>,
}

impl RegionFile<File> {
    pub fn open_path(path: impl AsRef<Path>) -> RegionResult<Self> {
        let path = path.as_ref();
        log::debug!("Opening region file {}", path.display());
        Self::open(File::open(path)?)
    }
}

impl<S: ReadAt + 'static> RegionFile<S> {
    /// Read the location table and keep it for the lifetime of the container.
    pub fn open(source: S) -> RegionResult<Self> {
        let mut header = vec![0u8; LOCATION_TABLE_SIZE];
        let got = source.read_exact_at(&mut header, 0)?;
        let locations = LocationTable::parse(&header[..got])?;

        Ok(Self {
            source: Arc::new(source),
            locations,
            cache: ChunkCache::new(),
        })
    }

    /// Replace the chunk cache with one holding at most `capacity` decoded
    /// chunks. Zero means unbounded.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = ChunkCache::with_capacity(capacity);
        self
    }

    pub fn locations(&self) -> &LocationTable {
        &self.locations
    }

    pub fn cache(&self) -> &ChunkCache<ChunkPos, Chunk> {
        &self.cache
    }

    /// Load the chunk column at world chunk coordinates `(x, z)`.
    ///
    /// Columns with nothing stored yield [`RegionError::ChunkNotPresent`]
    /// without touching the byte source. Coordinates wrap into the region, so
    /// `(-1, -1)` and `(31, 31)` name the same stored column and share one
    /// cached decode.
    pub async fn get_chunk(&self, x: i32, z: i32) -> RegionResult<Arc<Chunk>> {
        let entry = self.locations.entry(x, z);
        if entry.is_absent() {
            return Err(RegionError::ChunkNotPresent { x, z });
        }

        let key = ChunkPos::new(chunk_to_local(x), chunk_to_local(z));
        let source = Arc::clone(&self.source);
        self.cache
            .get_or_load(key, move || {
                let record = ChunkRecordReader::new(&*source).read(entry.byte_offset())?;
                let stream = decompress(record.compression, &record.payload)?;
                decode_chunk(stream)
            })
            .await
    }

    /// Like [`get_chunk`](Self::get_chunk), with absence mapped to `None`.
    pub async fn try_get_chunk(&self, x: i32, z: i32) -> RegionResult<Option<Arc<Chunk>>> {
        match self.get_chunk(x, z).await {
            Ok(chunk) => Ok(Some(chunk)),
            Err(e) if e.is_not_present() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
