//! Lockstep Protocol Core
//!
//! The handshake and record-protection engine, written as a pure state
//! machine. A [`HandshakeSession`] consumes frames and plaintexts and returns
//! [`SessionAction`]s; the caller owns all I/O. Randomness comes from an
//! injected [`Environment`] so the same code runs against the OS generator in
//! production and a seeded generator in simulation.
//!
//! # Protocol
//!
//! ```text
//! Client                                   Server
//!   │── Hello {p, g, g^a, nonce_c} ──────────>│
//!   │<────────── Hello {p, g, g^b, nonce_s} ──│
//!   │                                         │
//!   │  shared = (g^b)^a = (g^a)^b             │
//!   │  keys   = HKDF(shared, nonce_c || nonce_s)
//!   │                                         │
//!   │── Record {CBC(m), HMAC} ───────────────>│
//!   │<─────────────── Record {CBC(m), HMAC} ──│
//!   │── Close ───────────────────────────────>│
//! ```
//!
//! # Security
//!
//! - Peer public values are range-checked before any exponentiation
//! - Inbound records are verified before decryption; a failed record is
//!   never decrypted
//! - Key material is dropped as soon as a session closes or aborts

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod env;
pub mod error;
pub mod record;
pub mod session;
pub mod system_env;

pub use config::SessionConfig;
pub use env::{EnvRng, Environment};
pub use error::SessionError;
pub use record::{Direction, RecordLayer};
pub use session::{HandshakeSession, Role, SessionAction, SessionState};
pub use system_env::SystemEnv;

// Hello nonces and record tags cross from the wire into the crypto layer as-is
const _: () = assert!(
    lockstep_proto::HELLO_NONCE_SIZE == lockstep_crypto::NONCE_SIZE
        && lockstep_proto::RECORD_TAG_SIZE == lockstep_crypto::TAG_SIZE
);
