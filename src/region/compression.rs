use std::io::Read;

use flate2::read::{GzDecoder, ZlibDecoder};

use crate::error::{RegionError, RegionResult};

/// Compression types used in Minecraft Anvil format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionScheme {
    GZip = 1,
    ZLib = 2,
    Uncompressed = 3,
}

impl CompressionScheme {
    pub fn from_tag(tag: u8) -> RegionResult<Self> {
        match tag {
            1 => Ok(Self::GZip),
            2 => Ok(Self::ZLib),
            3 => Ok(Self::Uncompressed),
            unexpected => Err(RegionError::UnsupportedCompression(unexpected)),
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Reject payloads whose stream header cannot belong to this scheme.
    fn check_header(self, payload: &[u8]) -> RegionResult<()> {
        match self {
            Self::GZip => {
                if payload.len() < 2 || payload[0] != 0x1f || payload[1] != 0x8b {
                    return Err(RegionError::corrupt("missing gzip magic"));
                }
            }
            Self::ZLib => {
                if payload.len() < 2 {
                    return Err(RegionError::corrupt("zlib stream too short"));
                }
                let (cmf, flg) = (payload[0], payload[1]);
                if cmf & 0x0F != 8 || (u16::from(cmf) << 8 | u16::from(flg)) % 31 != 0 {
                    return Err(RegionError::corrupt("invalid zlib header"));
                }
            }
            Self::Uncompressed => {}
        }
        Ok(())
    }
}

/// Open a decompressing stream over a chunk payload.
///
/// Unknown tags fail here rather than later inside the NBT decoder.
pub fn decompress<'a>(tag: u8, payload: &'a [u8]) -> RegionResult<Box<dyn Read + Send + 'a>> {
    let scheme = CompressionScheme::from_tag(tag)?;
    scheme.check_header(payload)?;

    Ok(match scheme {
        CompressionScheme::GZip => Box::new(GzDecoder::new(payload)),
        CompressionScheme::ZLib => Box::new(ZlibDecoder::new(payload)),
        CompressionScheme::Uncompressed => Box::new(payload),
    })
}
