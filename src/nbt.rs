//! NBT (Named Binary Tag) structures for Minecraft chunk data.
//!
//! These mirror the root compound stored in each region chunk record and are
//! deserialized with fastnbt.

use std::collections::HashMap;

use fastnbt::{ByteArray, LongArray, Value};
use serde::{Deserialize, Serialize};

/// Main chunk structure - the root of NBT hierarchy in .mca files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(rename = "DataVersion")]
    pub data_version: i32,

    #[serde(rename = "Heightmaps", default)]
    pub heightmaps: Heightmaps,

    #[serde(rename = "InhabitedTime", default)]
    pub inhabited_time: i64,

    #[serde(rename = "LastUpdate", default)]
    pub last_update: i64,

    // e.g. "minecraft:full"
    #[serde(rename = "Status", default)]
    pub status: String,

    #[serde(default)]
    pub block_entities: Vec<BlockEntity>,

    // Vertical slices of the chunk (16 blocks high each)
    #[serde(default)]
    pub sections: Vec<Section>,

    // Chunk coordinates (absolute, not relative to region)
    #[serde(rename = "xPos")]
    pub x_pos: i32,
    #[serde(rename = "yPos", default)]
    pub y_pos: i32,
    #[serde(rename = "zPos")]
    pub z_pos: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Heightmaps {
    #[serde(rename = "MOTION_BLOCKING", skip_serializing_if = "Option::is_none")]
    pub motion_blocking: Option<LongArray>,
    #[serde(rename = "MOTION_BLOCKING_NO_LEAVES", skip_serializing_if = "Option::is_none")]
    pub motion_blocking_no_leaves: Option<LongArray>,
    #[serde(rename = "OCEAN_FLOOR", skip_serializing_if = "Option::is_none")]
    pub ocean_floor: Option<LongArray>,
    #[serde(rename = "WORLD_SURFACE", skip_serializing_if = "Option::is_none")]
    pub world_surface: Option<LongArray>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockEntity {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

// --- Section (16x16x16 Cube) ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    // Vertical index of this section (e.g., -4 for the bottom, up to 19)
    #[serde(rename = "Y")]
    pub y: i8,

    #[serde(rename = "BlockLight", default, skip_serializing_if = "Option::is_none")]
    pub block_light: Option<ByteArray>,

    #[serde(rename = "SkyLight", default, skip_serializing_if = "Option::is_none")]
    pub sky_light: Option<ByteArray>,

    // Empty sections might omit these.
    #[serde(rename = "block_states", default, skip_serializing_if = "Option::is_none")]
    pub block_states: Option<BlockStates>,

    #[serde(rename = "biomes", default, skip_serializing_if = "Option::is_none")]
    pub biomes: Option<Biomes>,
}

// --- Block Palette ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockStates {
    pub palette: Vec<BlockState>,
    // Indices into the palette. Required if palette length > 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<LongArray>,
}

// --- Biome Palette ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Biomes {
    pub palette: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<LongArray>,
}

// --- Single Block ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockState {
    #[serde(rename = "Name")]
    pub name: String,
    // waterlogged, facing, ...
    #[serde(rename = "Properties", default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, Value>>,
}

impl Chunk {
    /// Number of distinct block states across all sections.
    pub fn palette_len(&self) -> usize {
        self.sections
            .iter()
            .filter_map(|s| s.block_states.as_ref())
            .map(|b| b.palette.len())
            .sum()
    }
}
