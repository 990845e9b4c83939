use std::io;

use bytes::{Buf, BufMut, BytesMut};

use super::{Packet, ensure_remaining};

/// Set Player Position (serverbound)
/// Sent by the client when it moves without changing its rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetPlayerPosition {
    /// Absolute feet position
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub on_ground: bool,
}

impl Packet for SetPlayerPosition {
    const ID: i32 = 0x1A;

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_f64(self.x);
        buf.put_f64(self.y);
        buf.put_f64(self.z);
        buf.put_u8(self.on_ground as u8);
    }

    fn decode(buf: &mut impl Buf) -> io::Result<Self> {
        ensure_remaining(&*buf, 8 * 3 + 1, "SetPlayerPosition")?;
        Ok(Self {
            x: buf.get_f64(),
            y: buf.get_f64(),
            z: buf.get_f64(),
            on_ground: buf.get_u8() != 0,
        })
    }
}
