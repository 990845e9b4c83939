//! Chunk record framing: `[length:4][compression:1][payload:length-1]`.

use super::{ReadAt, SECTOR_SIZE};
use crate::error::{RegionError, RegionResult};

/// Bytes in the record header (length + compression tag).
pub const RECORD_HEADER_SIZE: usize = 5;

/// Largest record the sector count byte can describe (255 sectors).
pub const MAX_RECORD_LEN: usize = 255 * SECTOR_SIZE;

/// Raw chunk bytes as stored in the file, still compressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRecord {
    /// Compression tag, uninterpreted.
    pub compression: u8,
    pub payload: Vec<u8>,
}

/// Reads chunk records from a positioned byte source.
pub struct ChunkRecordReader<'a, S: ReadAt + ?Sized> {
    source: &'a S,
}

impl<'a, S: ReadAt + ?Sized> ChunkRecordReader<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Read the record starting at `offset`: one read for the header,
    /// one for the payload.
    pub fn read(&self, offset: u64) -> RegionResult<ChunkRecord> {
        let mut header = [0u8; RECORD_HEADER_SIZE];
        self.read_full(&mut header, offset)?;

        let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let compression = header[4];

        // The length covers the compression byte, so 0 cannot be valid.
        if length == 0 {
            return Err(RegionError::corrupt(format!(
                "zero-length chunk record at offset {}",
                offset
            )));
        }
        if length > MAX_RECORD_LEN {
            return Err(RegionError::corrupt(format!(
                "chunk record at offset {} claims {} bytes (max {})",
                offset, length, MAX_RECORD_LEN
            )));
        }

        let mut payload = vec![0u8; length - 1];
        self.read_full(&mut payload, offset + RECORD_HEADER_SIZE as u64)?;

        Ok(ChunkRecord { compression, payload })
    }

    fn read_full(&self, buf: &mut [u8], offset: u64) -> RegionResult<()> {
        let got = self.source.read_exact_at(buf, offset)?;
        if got < buf.len() {
            return Err(RegionError::ShortRead {
                offset,
                expected: buf.len(),
                got,
            });
        }
        Ok(())
    }
}
