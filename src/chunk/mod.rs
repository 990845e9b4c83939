//! Chunk decoding.
//!
//! Turns the decompressed byte stream of a chunk record into a typed [`Chunk`].

use std::io::Read;

pub use crate::nbt::{Biomes, BlockEntity, BlockState, BlockStates, Chunk, Heightmaps, Section};

use crate::error::{RegionError, RegionResult};

/// Decode a chunk from its decompressed NBT stream.
///
/// Stream failures are reported as corrupt payloads, NBT schema failures as
/// decode errors.
pub fn decode_chunk(mut reader: impl Read) -> RegionResult<Chunk> {
    let mut nbt_bytes = Vec::new();
    if let Err(e) = reader.read_to_end(&mut nbt_bytes) {
        log::debug!("Chunk stream failed after {} bytes: {}", nbt_bytes.len(), e);
        return Err(RegionError::corrupt(e));
    }

    let chunk: Chunk = fastnbt::from_bytes(&nbt_bytes)?;
    Ok(chunk)
}
