//! Error types for the Lockstep session layer.

use lockstep_crypto::CryptoError;
use lockstep_proto::ProtocolError;
use thiserror::Error;

use crate::session::SessionState;

/// Errors from [`crate::HandshakeSession`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Peer's public value outside `[2, modulus - 2]`
    #[error("peer public value outside [2, modulus - 2]")]
    InvalidPublicValue,

    /// Operation attempted out of sequence
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// State when the operation was attempted
        state: SessionState,
        /// Operation that was attempted
        operation: String,
    },

    /// Peer offered different domain parameters
    #[error("peer domain parameters do not match ours")]
    ParameterMismatch,

    /// Authenticated record decrypted to malformed padding
    #[error("record padding is malformed")]
    Padding,

    /// Record tag did not verify; the record was discarded undecrypted
    #[error("record failed integrity check")]
    Integrity,

    /// Frame type not valid in the current state
    #[error("unexpected frame: opcode {opcode:#04x} in state {state:?}")]
    UnexpectedFrame {
        /// State when the frame arrived
        state: SessionState,
        /// Opcode of the frame
        opcode: u8,
    },

    /// Other primitive failure
    #[error("crypto error: {0}")]
    Crypto(CryptoError),

    /// Frame or payload could not be (de)serialized
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl SessionError {
    /// Returns true if this error ends the session.
    ///
    /// `Integrity` and `Padding` are scoped to a single record: the record is
    /// dropped and the session state is untouched (unless the session is
    /// configured to abort on integrity failure). Everything else means the
    /// peer is broken or hostile, or the caller misused the API.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Integrity | Self::Padding)
    }
}

impl From<CryptoError> for SessionError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidPublicValue => Self::InvalidPublicValue,
            CryptoError::Padding => Self::Padding,
            other => Self::Crypto(other),
        }
    }
}
