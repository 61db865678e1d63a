//! Fixed 8-byte frame header with zero-copy parsing.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    Opcode,
    errors::{ProtocolError, Result},
};

/// Frame header (Big Endian network byte order)
///
/// ```text
/// 0      2         3        4              8
/// | magic | version | opcode | payload_size |
/// ```
///
/// Fields are raw byte arrays so every 8-byte pattern is a valid value and
/// untrusted input can be cast without copying. Validation of magic, version
/// and size happens in [`FrameHeader::from_bytes`]; the opcode is checked
/// when the payload is decoded.
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct FrameHeader {
    magic: [u8; 2],                   // "LS"
    version: u8,                      // 0x01
    opcode: u8,                       // Opcode
    pub(crate) payload_size: [u8; 4], // u32 payload length
}

impl FrameHeader {
    /// Size of the serialized header
    pub const SIZE: usize = 8;

    /// Magic number: "LS" in ASCII
    pub const MAGIC: u16 = 0x4C53;

    /// Current protocol version
    pub const VERSION: u8 = 0x01;

    /// Maximum payload size (1 MiB)
    pub const MAX_PAYLOAD_SIZE: u32 = 1024 * 1024;

    /// Create a header for `opcode` with an empty payload.
    pub fn new(opcode: Opcode) -> Self {
        Self {
            magic: Self::MAGIC.to_be_bytes(),
            version: Self::VERSION,
            opcode: opcode.to_u8(),
            payload_size: [0; 4],
        }
    }

    /// Parse a header from the front of `bytes` without copying.
    ///
    /// # Errors
    ///
    /// - `FrameTooShort` if fewer than [`FrameHeader::SIZE`] bytes
    /// - `InvalidMagic` if the magic number is wrong
    /// - `UnsupportedVersion` if the version byte is not ours
    /// - `PayloadTooLarge` if the claimed payload exceeds the limit
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        let (header, _) = Self::ref_from_prefix(bytes).map_err(|_| {
            ProtocolError::FrameTooShort { expected: Self::SIZE, actual: bytes.len() }
        })?;

        if u16::from_be_bytes(header.magic) != Self::MAGIC {
            return Err(ProtocolError::InvalidMagic);
        }

        if header.version != Self::VERSION {
            return Err(ProtocolError::UnsupportedVersion(header.version));
        }

        let payload_size = u32::from_be_bytes(header.payload_size);
        if payload_size > Self::MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload_size as usize,
                max: Self::MAX_PAYLOAD_SIZE as usize,
            });
        }

        Ok(header)
    }

    /// Serialize header to bytes.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(IntoBytes::as_bytes(self));
        arr
    }

    /// Protocol version byte.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Operation code as a raw byte.
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Operation code as enum. `None` if unrecognized.
    pub fn opcode_enum(&self) -> Option<Opcode> {
        Opcode::from_u8(self.opcode)
    }

    /// Payload size in bytes.
    pub fn payload_size(&self) -> u32 {
        u32::from_be_bytes(self.payload_size)
    }
}

// Manual Debug implementation (can't derive due to packed repr)
impl std::fmt::Debug for FrameHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameHeader")
            .field("magic", &format!("{:#06x}", u16::from_be_bytes(self.magic)))
            .field("version", &self.version())
            .field("opcode", &format!("{:#04x}", self.opcode()))
            .field("payload_size", &self.payload_size())
            .finish()
    }
}

// Manual PartialEq implementation (can't derive due to packed repr)
impl PartialEq for FrameHeader {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for FrameHeader {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_eight_bytes() {
        assert_eq!(std::mem::size_of::<FrameHeader>(), FrameHeader::SIZE);

        let bytes = FrameHeader::new(Opcode::Record).to_bytes();
        assert_eq!(bytes, [b'L', b'S', 0x01, 0x02, 0, 0, 0, 0]);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_eq!(
            FrameHeader::from_bytes(&[b'L', b'S', 1]),
            Err(ProtocolError::FrameTooShort { expected: 8, actual: 3 })
        );
        assert_eq!(
            FrameHeader::from_bytes(&[b'X', b'S', 1, 1, 0, 0, 0, 0]),
            Err(ProtocolError::InvalidMagic)
        );
        assert_eq!(
            FrameHeader::from_bytes(&[b'L', b'S', 9, 1, 0, 0, 0, 0]),
            Err(ProtocolError::UnsupportedVersion(9))
        );
        assert_eq!(
            FrameHeader::from_bytes(&[b'L', b'S', 1, 1, 0, 0x10, 0, 1]),
            Err(ProtocolError::PayloadTooLarge { size: 0x0010_0001, max: 0x0010_0000 })
        );
    }

    #[test]
    fn unknown_opcode_parses_but_has_no_enum() {
        let header = FrameHeader::from_bytes(&[b'L', b'S', 1, 0x7f, 0, 0, 0, 0]).unwrap();
        assert_eq!(header.opcode(), 0x7f);
        assert_eq!(header.opcode_enum(), None);
    }
}
