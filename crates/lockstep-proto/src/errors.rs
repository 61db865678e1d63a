//! Protocol error types

use thiserror::Error;

/// Result alias for wire-format operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors from framing and payload (de)serialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Header does not start with the protocol magic
    #[error("invalid magic number")]
    InvalidMagic,

    /// Header carries a version this build does not speak
    #[error("unsupported protocol version {0:#04x}")]
    UnsupportedVersion(u8),

    /// Opcode byte does not name a known payload
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),

    /// Fewer bytes than a header
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Bytes required
        expected: usize,
        /// Bytes available
        actual: usize,
    },

    /// Header promises more payload than is present
    #[error("frame truncated: payload needs {expected} bytes, got {actual}")]
    FrameTruncated {
        /// Payload size claimed by the header
        expected: usize,
        /// Payload bytes available
        actual: usize,
    },

    /// Payload exceeds the protocol limit
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Actual size
        size: usize,
        /// Protocol limit
        max: usize,
    },

    /// CBOR serialization failed
    #[error("CBOR encode failed: {0}")]
    CborEncode(String),

    /// CBOR deserialization failed
    #[error("CBOR decode failed: {0}")]
    CborDecode(String),
}
