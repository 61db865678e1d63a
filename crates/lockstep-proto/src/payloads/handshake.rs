//! Handshake and shutdown payloads.

use serde::{Deserialize, Serialize};

/// Size of the handshake nonce.
///
/// The same value as the key-derivation nonce size in `lockstep-crypto`;
/// `lockstep-core` fails to compile if the two drift apart.
pub const HELLO_NONCE_SIZE: usize = 32;

/// Handshake offer.
///
/// Both endpoints send one. Integers are unsigned big-endian byte strings;
/// the receiver checks that the domain parameters equal its own before
/// using the public value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
    /// Group modulus `p`
    pub modulus: Vec<u8>,

    /// Group generator `g`
    pub generator: Vec<u8>,

    /// Sender's public value `g^secret mod p`
    pub public_value: Vec<u8>,

    /// Fresh randomness mixed into key derivation
    pub nonce: [u8; HELLO_NONCE_SIZE],
}

/// Orderly shutdown notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Close {
    /// Human-readable reason
    pub reason: String,
}
