use std::fmt;

use crate::error::{Error, Result};

/// Magic marker identifying a live container header ("VDH/").
pub const MAGIC: u32 = 0x5644_482F;

/// Size of the encoded header in bytes.
pub const HEADER_LEN: usize = 8;

const SIZE_SHIFT: u32 = 32;
const SALT_SHIFT: u32 = 48;

/// Fixed 64-bit integrity header.
///
/// Layout of the raw `u64` (bit 0 is the least significant bit):
///
/// | bits   | field | notes                                   |
/// |--------|-------|-----------------------------------------|
/// | 0..32  | magic | always [`MAGIC`]                        |
/// | 32..48 | size  | payload byte size, truncated to 16 bits |
/// | 48..64 | salt  | per-instance cookie                     |
///
/// The size field is informational. It is never consulted for bounds.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Header(u64);

impl Header {
    /// Build a header for a payload of `payload_size` bytes.
    /// Sizes of 64 KiB and above wrap silently.
    #[inline]
    pub const fn new(payload_size: usize, salt: u16) -> Self {
        let size = payload_size as u16;
        Header(
            MAGIC as u64 | (size as u64) << SIZE_SHIFT | (salt as u64) << SALT_SHIFT,
        )
    }

    /// Reinterpret a raw header word, rejecting it unless the magic matches.
    pub fn decode(raw: u64) -> Result<Self> {
        let header = Header(raw);
        if !header.is_valid() {
            return Err(Error::InvalidMagic {
                found: header.magic(),
            });
        }
        Ok(header)
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.magic() == MAGIC
    }

    #[inline]
    pub const fn magic(self) -> u32 {
        self.0 as u32
    }

    #[inline]
    pub const fn size(self) -> u16 {
        (self.0 >> SIZE_SHIFT) as u16
    }

    #[inline]
    pub const fn salt(self) -> u16 {
        (self.0 >> SALT_SHIFT) as u16
    }

    #[inline]
    pub const fn to_raw(self) -> u64 {
        self.0
    }

    /// In-memory byte image of the header (little-endian field order).
    #[inline]
    pub const fn to_bytes(self) -> [u8; HEADER_LEN] {
        self.0.to_le_bytes()
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Header")
            .field("magic", &format_args!("{:#010x}", self.magic()))
            .field("size", &self.size())
            .field("salt", &format_args!("{:#06x}", self.salt()))
            .finish()
    }
}
