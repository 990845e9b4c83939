//! Builders for synthetic region containers used by the tests.

use std::collections::HashMap;
use std::io::Write;

use fastnbt::{ByteArray, LongArray, Value};
use flate2::Compression;
use flate2::write::{GzEncoder, ZlibEncoder};

use super::{CompressionScheme, LOCATION_TABLE_SIZE, LocationEntry, SECTOR_SIZE, chunk_index};
use crate::nbt::{Biomes, BlockEntity, BlockState, BlockStates, Chunk, Heightmaps, Section};

/// A small but fully populated chunk at the given column.
pub fn sample_chunk(chunk_x: i32, chunk_z: i32) -> Chunk {
    let mut properties = HashMap::new();
    properties.insert("axis".to_string(), Value::String("y".to_string()));

    let sections = vec![
        Section {
            y: -4,
            block_light: Some(ByteArray::new(vec![0; 2048])),
            sky_light: None,
            block_states: Some(BlockStates {
                palette: vec![
                    BlockState { name: "minecraft:bedrock".to_string(), properties: None },
                    BlockState {
                        name: "minecraft:oak_log".to_string(),
                        properties: Some(properties),
                    },
                ],
                data: Some(LongArray::new(vec![0x1111_1111; 256])),
            }),
            biomes: Some(Biomes {
                palette: vec!["minecraft:plains".to_string()],
                data: None,
            }),
        },
        Section {
            y: 0,
            block_light: None,
            sky_light: Some(ByteArray::new(vec![-1; 2048])),
            block_states: Some(BlockStates {
                palette: vec![BlockState { name: "minecraft:air".to_string(), properties: None }],
                data: None,
            }),
            biomes: None,
        },
    ];

    Chunk {
        data_version: 3953,
        heightmaps: Heightmaps {
            motion_blocking: Some(LongArray::new(vec![7; 37])),
            motion_blocking_no_leaves: None,
            ocean_floor: Some(LongArray::new(vec![3; 37])),
            world_surface: Some(LongArray::new(vec![9; 37])),
        },
        inhabited_time: 120,
        last_update: 4242,
        status: "minecraft:full".to_string(),
        block_entities: vec![BlockEntity {
            id: "minecraft:chest".to_string(),
            x: chunk_x * 16 + 1,
            y: 64,
            z: chunk_z * 16 + 2,
        }],
        sections,
        x_pos: chunk_x,
        y_pos: -4,
        z_pos: chunk_z,
    }
}

/// Compress raw bytes with the given scheme.
pub fn compress(scheme: CompressionScheme, data: &[u8]) -> Vec<u8> {
    match scheme {
        CompressionScheme::GZip => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data).unwrap();
            encoder.finish().unwrap()
        }
        CompressionScheme::ZLib => {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data).unwrap();
            encoder.finish().unwrap()
        }
        CompressionScheme::Uncompressed => data.to_vec(),
    }
}

/// Pack in MCA format: `[length:4][type:1][data:N]`.
pub fn wrap_record(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(5 + payload.len());
    let total_len = (payload.len() + 1) as u32;
    result.extend_from_slice(&total_len.to_be_bytes());
    result.push(tag);
    result.extend_from_slice(payload);
    result
}

/// Serialize, compress and frame a chunk.
pub fn chunk_record(chunk: &Chunk, scheme: CompressionScheme) -> Vec<u8> {
    let nbt = fastnbt::to_bytes(chunk).unwrap();
    wrap_record(scheme.tag(), &compress(scheme, &nbt))
}

/// Assembles a region file in memory, sector by sector.
pub struct RegionBuilder {
    bytes: Vec<u8>,
}

impl RegionBuilder {
    pub fn new() -> Self {
        // Location table plus the (unused here) timestamp sector.
        Self { bytes: vec![0u8; LOCATION_TABLE_SIZE + SECTOR_SIZE] }
    }

    /// Append a raw record for the column and point the location table at it.
    pub fn raw(mut self, chunk_x: i32, chunk_z: i32, record: &[u8]) -> Self {
        let sector_offset = (self.bytes.len() / SECTOR_SIZE) as u32;
        let sector_count = record.len().div_ceil(SECTOR_SIZE) as u8;

        self.bytes.extend_from_slice(record);
        let padded = (sector_offset as usize + sector_count as usize) * SECTOR_SIZE;
        self.bytes.resize(padded, 0);

        let index = chunk_index(chunk_x, chunk_z) * 4;
        let entry = LocationEntry::new(sector_offset, sector_count);
        self.bytes[index..index + 4].copy_from_slice(&entry.to_be_bytes());
        self
    }

    pub fn chunk(self, chunk: &Chunk, scheme: CompressionScheme) -> Self {
        let record = chunk_record(chunk, scheme);
        self.raw(chunk.x_pos, chunk.z_pos, &record)
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}
