//! Error types for cryptographic operations

use thiserror::Error;

/// Errors from the Lockstep cryptographic primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Modulus must be greater than one
    #[error("invalid modulus: must be greater than 1")]
    InvalidModulus,

    /// Domain parameters violate their range constraints
    #[error("invalid domain parameters: {reason}")]
    InvalidParameters {
        /// Which constraint was violated
        reason: String,
    },

    /// Private scalar outside `[1, modulus - 2]`
    #[error("secret scalar outside [1, modulus - 2]")]
    InvalidSecret,

    /// Peer's public value outside `[2, modulus - 2]`
    ///
    /// Values `0`, `1` and `modulus - 1` collapse the shared secret to a
    /// value an observer can predict.
    #[error("peer public value outside [2, modulus - 2]")]
    InvalidPublicValue,

    /// Cipher key is not 16, 24 or 32 bytes
    #[error("invalid key length: expected 16, 24 or 32 bytes, got {actual}")]
    InvalidKeyLength {
        /// Actual key length
        actual: usize,
    },

    /// Key would expand to a schedule with repeated subkeys
    #[error("weak key: round key schedule would repeat a subkey")]
    WeakKey,

    /// Ciphertext is empty or not a whole number of blocks
    #[error("invalid ciphertext length {actual}: must be a positive multiple of {block_size}")]
    InvalidCiphertextLength {
        /// Actual ciphertext length
        actual: usize,
        /// Required block multiple
        block_size: usize,
    },

    /// Trailing pad bytes are malformed
    #[error("malformed padding")]
    Padding,
}
