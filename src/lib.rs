//! anvil-chunkd: concurrent read access to Minecraft Anvil region files.
//!
//! Region containers are parsed lazily: the location table is read once when
//! a file is opened, and each chunk column is decoded on first request and
//! then served from a per-region [`ChunkCache`].

pub mod cache;
pub mod chunk;
pub mod container;
pub mod error;
pub mod nbt;
pub mod player;
pub mod protocol;
pub mod region;
pub mod world;

pub use cache::{CacheStats, ChunkCache};
pub use error::{RegionError, RegionResult};
pub use nbt::Chunk;
pub use region::{ChunkPos, RegionFile, RegionPos};
pub use world::World;
