//! Per-player transient state shared between connection tasks.

use std::sync::RwLock;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::region::ChunkPos;

/// An `f64` stored as its bit pattern.
#[derive(Debug, Default)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

#[derive(Debug, Default)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn set(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatMode {
    #[default]
    Enabled,
    CommandsOnly,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MainHand {
    Left,
    #[default]
    Right,
}

/// Settings the client reports about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInformation {
    pub locale: String,
    pub view_distance: i8,
    pub chat_mode: ChatMode,
    pub chat_colors: bool,
    pub displayed_skin_parts: u8,
    pub main_hand: MainHand,
    pub enable_text_filtering: bool,
    pub allow_server_listings: bool,
}

impl Default for ClientInformation {
    fn default() -> Self {
        Self {
            locale: "en_us".to_string(),
            view_distance: 10,
            chat_mode: ChatMode::Enabled,
            chat_colors: true,
            displayed_skin_parts: 0x7F,
            main_hand: MainHand::Right,
            enable_text_filtering: false,
            allow_server_listings: true,
        }
    }
}

/// A connected player. Every field can be read and written through `&self`.
#[derive(Debug)]
pub struct Player {
    entity_id: i32,

    x: AtomicF64,
    y: AtomicF64,
    z: AtomicF64,
    yaw: AtomicF32,
    pitch: AtomicF32,

    client_info: RwLock<ClientInformation>,
}

impl Player {
    pub fn new(entity_id: i32) -> Self {
        Self {
            entity_id,
            x: AtomicF64::default(),
            y: AtomicF64::default(),
            z: AtomicF64::default(),
            yaw: AtomicF32::default(),
            pitch: AtomicF32::default(),
            client_info: RwLock::new(ClientInformation::default()),
        }
    }

    pub fn entity_id(&self) -> i32 {
        self.entity_id
    }

    pub fn position(&self) -> (f64, f64, f64) {
        (self.x.get(), self.y.get(), self.z.get())
    }

    pub fn set_position(&self, x: f64, y: f64, z: f64) {
        self.x.set(x);
        self.y.set(y);
        self.z.set(z);
    }

    pub fn rotation(&self) -> (f32, f32) {
        (self.yaw.get(), self.pitch.get())
    }

    pub fn set_rotation(&self, yaw: f32, pitch: f32) {
        self.yaw.set(yaw);
        self.pitch.set(pitch);
    }

    /// The chunk column the player is standing in.
    pub fn chunk_pos(&self) -> ChunkPos {
        let (x, _, z) = self.position();
        ChunkPos::new((x.floor() as i32) >> 4, (z.floor() as i32) >> 4)
    }

    pub fn client_information(&self) -> ClientInformation {
        self.client_info
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set_client_information(&self, info: ClientInformation) {
        *self.client_info.write().unwrap_or_else(|e| e.into_inner()) = info;
    }
}
