//! Harness error type

use lockstep_core::SessionError;
use lockstep_proto::ProtocolError;
use thiserror::Error;

/// Errors from driving sessions over a channel or stream.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Underlying stream failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bytes on the stream are not a valid frame
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Session failed fatally
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Stream ended before the session closed
    #[error("peer disconnected in state {0}")]
    Disconnected(String),
}
