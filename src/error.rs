use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Errors produced while opening a region container or loading a chunk from it.
///
/// The type is `Clone` so a single failed load can be handed to every caller
/// that was waiting on it.
#[derive(Debug, Clone, Error)]
pub enum RegionError {
    #[error("Region header truncated: expected {expected} bytes, found {found}.")]
    TruncatedHeader { expected: usize, found: usize },
    #[error("Short read at offset {offset}: expected {expected} bytes, got {got}.")]
    ShortRead { offset: u64, expected: usize, got: usize },
    #[error("IO Error: {0}")]
    Io(#[source] Arc<io::Error>),
    #[error("Corrupt chunk payload: {0}")]
    CorruptPayload(String),
    #[error("Unsupported compression scheme: {0}")]
    UnsupportedCompression(u8),
    #[error("Chunk ({x}, {z}) is not present.")]
    ChunkNotPresent { x: i32, z: i32 },
    #[error("Failed to decode chunk NBT: {0}")]
    Decode(String),
    #[error("Chunk loader panicked.")]
    LoaderPanicked,
}

impl RegionError {
    /// True for the expected "nothing stored here" outcome, false for real failures.
    pub fn is_not_present(&self) -> bool {
        matches!(self, RegionError::ChunkNotPresent { .. })
    }

    pub(crate) fn is_file_not_found(&self) -> bool {
        matches!(self, RegionError::Io(e) if e.kind() == io::ErrorKind::NotFound)
    }

    pub(crate) fn corrupt(msg: impl std::fmt::Display) -> Self {
        RegionError::CorruptPayload(msg.to_string())
    }
}

impl From<io::Error> for RegionError {
    fn from(err: io::Error) -> Self {
        RegionError::Io(Arc::new(err))
    }
}

impl From<fastnbt::error::Error> for RegionError {
    fn from(err: fastnbt::error::Error) -> Self {
        RegionError::Decode(err.to_string())
    }
}

pub type RegionResult<T> = Result<T, RegionError>;
