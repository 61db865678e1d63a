//! Protected application record payload.

use serde::{Deserialize, Serialize};

/// Size of the record authentication tag.
///
/// The same value as the HMAC-SHA256 tag size in `lockstep-crypto`;
/// `lockstep-core` fails to compile if the two drift apart.
pub const RECORD_TAG_SIZE: usize = 32;

/// One encrypted and authenticated application message.
///
/// The ciphertext is CBC output (a whole number of cipher blocks). The tag
/// is an HMAC over the record's direction, sequence number and ciphertext,
/// so a record replayed or moved to another position fails verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// CBC ciphertext
    pub ciphertext: Vec<u8>,

    /// HMAC-SHA256 tag
    pub tag: [u8; RECORD_TAG_SIZE],
}
