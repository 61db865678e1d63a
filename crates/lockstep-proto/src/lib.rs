//! Lockstep wire protocol
//!
//! Every message between endpoints is a [`Frame`]: a fixed 8-byte binary
//! [`FrameHeader`] followed by a CBOR payload. The header is parsed in place
//! so a reader learns the payload length and type before touching the body.
//!
//! ```text
//! ┌──────────┬─────────┬────────┬──────────────┬──────────────────────┐
//! │ magic    │ version │ opcode │ payload_size │ payload (CBOR)       │
//! │ "LS" u16 │ u8      │ u8     │ u32 BE       │ ≤ 1 MiB              │
//! └──────────┴─────────┴────────┴──────────────┴──────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod errors;
pub mod frame;
pub mod header;
pub mod opcode;
pub mod payloads;

pub use errors::{ProtocolError, Result};
pub use frame::Frame;
pub use header::FrameHeader;
pub use opcode::Opcode;
pub use payloads::{
    Payload,
    handshake::{Close, HELLO_NONCE_SIZE, Hello},
    record::{RECORD_TAG_SIZE, Record},
};
