//! CBOR-encoded protocol messages.
//!
//! Frame headers are raw binary; payloads use CBOR. The payload type is
//! identified by the header opcode, so only the inner struct is serialized
//! (no variant tag).
//!
//! # Invariants
//!
//! Each payload variant maps to exactly one opcode (enforced by match
//! exhaustiveness).

pub mod handshake;
pub mod record;

use bytes::BufMut;
use serde::de::DeserializeOwned;

use crate::{
    Frame, FrameHeader, Opcode,
    errors::{ProtocolError, Result},
};

/// All possible frame payloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Handshake offer
    Hello(handshake::Hello),
    /// Protected application record
    Record(record::Record),
    /// Orderly shutdown
    Close(handshake::Close),
}

fn decode_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::de::from_reader(bytes).map_err(|e| ProtocolError::CborDecode(e.to_string()))
}

impl Payload {
    /// Opcode corresponding to this payload type.
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::Hello(_) => Opcode::Hello,
            Self::Record(_) => Opcode::Record,
            Self::Close(_) => Opcode::Close,
        }
    }

    /// Encode the inner struct as CBOR into `dst`.
    ///
    /// Does not enforce the payload size limit; [`Frame::encode`] does.
    ///
    /// # Errors
    ///
    /// - `CborEncode` if serialization fails
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        let mut writer = dst.writer();

        match self {
            Self::Hello(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::Record(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::Close(inner) => ciborium::ser::into_writer(inner, &mut writer),
        }
        .map_err(|e| ProtocolError::CborEncode(e.to_string()))
    }

    /// Decode a payload of type `opcode` from CBOR bytes.
    ///
    /// # Errors
    ///
    /// - `PayloadTooLarge` if `bytes` exceeds the protocol limit (checked
    ///   before parsing)
    /// - `CborDecode` if the bytes are not a valid payload of that type
    pub fn decode(opcode: Opcode, bytes: &[u8]) -> Result<Self> {
        if bytes.len() > FrameHeader::MAX_PAYLOAD_SIZE as usize {
            return Err(ProtocolError::PayloadTooLarge {
                size: bytes.len(),
                max: FrameHeader::MAX_PAYLOAD_SIZE as usize,
            });
        }

        let payload = match opcode {
            Opcode::Hello => Self::Hello(decode_cbor(bytes)?),
            Opcode::Record => Self::Record(decode_cbor(bytes)?),
            Opcode::Close => Self::Close(decode_cbor(bytes)?),
        };

        Ok(payload)
    }

    /// Encode into a transport frame with the matching opcode.
    ///
    /// Never returns a frame that [`Frame::encode`] would refuse.
    ///
    /// # Errors
    ///
    /// - `CborEncode` if serialization fails
    /// - `PayloadTooLarge` if the encoded payload exceeds
    ///   [`FrameHeader::MAX_PAYLOAD_SIZE`]
    pub fn into_frame(self) -> Result<Frame> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;

        if buf.len() > FrameHeader::MAX_PAYLOAD_SIZE as usize {
            return Err(ProtocolError::PayloadTooLarge {
                size: buf.len(),
                max: FrameHeader::MAX_PAYLOAD_SIZE as usize,
            });
        }

        Ok(Frame::new(FrameHeader::new(self.opcode()), buf))
    }

    /// Parse the payload of a transport frame.
    ///
    /// # Errors
    ///
    /// - `UnknownOpcode` if the header opcode is not recognized
    /// - `CborDecode` if the payload does not match the opcode
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let opcode = frame
            .header
            .opcode_enum()
            .ok_or(ProtocolError::UnknownOpcode(frame.header.opcode()))?;

        Self::decode(opcode, &frame.payload)
    }
}
