//! Play-state packets the server exchanges with clients.
//!
//! Only the packet bodies live here; framing and transport belong to the
//! connection layer.

mod set_player_position;

pub use set_player_position::SetPlayerPosition;

use std::io;

use bytes::{Buf, BytesMut};

/// Packet trait. Contains the packet ID and the functions to write and read the packet body.
pub trait Packet: Sized {
    const ID: i32;

    fn encode(&self, buf: &mut BytesMut);

    fn decode(buf: &mut impl Buf) -> io::Result<Self>;
}

/// Fail with `UnexpectedEof` unless `buf` holds at least `len` more bytes.
pub(crate) fn ensure_remaining(buf: &impl Buf, len: usize, what: &str) -> io::Result<()> {
    if buf.remaining() < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("{}: need {} bytes, {} left", what, len, buf.remaining()),
        ));
    }
    Ok(())
}
