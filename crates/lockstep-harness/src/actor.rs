//! Async endpoint and relay drivers over byte streams.
//!
//! Frames travel as `header || payload` on any `AsyncRead + AsyncWrite`
//! stream: a tokio duplex pipe in tests, a turmoil TCP socket in network
//! simulation, or a real socket. Each endpoint owns one
//! [`HandshakeSession`] and runs a fixed script: handshake, send its
//! outbound messages, wait for the expected number of inbound records,
//! then close (client) or wait for the peer's Close (server).

use bytes::BytesMut;
use lockstep_core::{
    Environment, HandshakeSession, Role, SessionAction, SessionError, SessionState,
};
use lockstep_crypto::SessionKeys;
use lockstep_proto::{Frame, FrameHeader};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{error::HarnessError, tamper::Tamper};

/// Close reason a client sends once its script is done.
pub const CLOSE_REASON: &str = "script complete";

/// Read one frame.
///
/// Returns `None` if the stream ends before a complete header.
///
/// # Errors
///
/// - `Io` if the stream fails or ends inside a payload
/// - `Protocol` if the header or payload is malformed
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Frame>, HarnessError>
where
    R: AsyncRead + Unpin,
{
    let mut header_bytes = [0u8; FrameHeader::SIZE];
    match reader.read_exact(&mut header_bytes).await {
        Ok(_) => {},
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let payload_size = FrameHeader::from_bytes(&header_bytes)?.payload_size() as usize;

    let mut buf = BytesMut::with_capacity(FrameHeader::SIZE + payload_size);
    buf.extend_from_slice(&header_bytes);
    buf.resize(FrameHeader::SIZE + payload_size, 0);
    reader.read_exact(&mut buf[FrameHeader::SIZE..]).await?;

    Ok(Some(Frame::decode(&buf)?))
}

/// Write one frame and flush.
///
/// # Errors
///
/// - `Protocol` if the frame cannot be encoded
/// - `Io` if the stream fails
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<(), HarnessError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = frame.to_vec()?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// What an endpoint does once connected.
#[derive(Debug, Clone, Default)]
pub struct EndpointScript {
    /// Messages to send once keys are derived
    pub outbound: Vec<Vec<u8>>,
    /// Inbound records (delivered or rejected) to wait for before closing
    pub expect_inbound: usize,
}

/// Outcome of one endpoint run.
#[derive(Debug)]
pub struct EndpointReport {
    /// Role this endpoint played
    pub role: Role,
    /// Final session state
    pub state: SessionState,
    /// Keys as derived during the handshake
    pub session_keys: Option<SessionKeys>,
    /// Plaintexts delivered, in order
    pub delivered: Vec<Vec<u8>>,
    /// Records rejected without ending the session
    pub rejected: Vec<SessionError>,
    /// Reason carried by the Close that ended the session
    pub close_reason: Option<String>,
}

/// Drive `session` over `stream` until it closes.
///
/// # Errors
///
/// - `Session` for a fatal session error
/// - `Io` / `Protocol` for transport failures
/// - `Disconnected` if the stream ends while the session is still open
pub async fn run_endpoint<S, E>(
    mut stream: S,
    mut session: HandshakeSession<E>,
    script: EndpointScript,
) -> Result<EndpointReport, HarnessError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    E: Environment,
{
    let mut report = EndpointReport {
        role: session.role(),
        state: session.state(),
        session_keys: None,
        delivered: Vec::new(),
        rejected: Vec::new(),
        close_reason: None,
    };

    let actions = session.start()?;
    execute(&mut stream, &session, actions, &mut report).await?;

    let mut outbound_sent = false;
    loop {
        if !outbound_sent && session.state().has_keys() {
            for message in &script.outbound {
                let actions = session.send(message)?;
                execute(&mut stream, &session, actions, &mut report).await?;
            }
            outbound_sent = true;
            tracing::debug!(role = ?report.role, count = script.outbound.len(), "outbound sent");
        }

        let inbound = report.delivered.len() + report.rejected.len();
        if outbound_sent && inbound >= script.expect_inbound && report.role == Role::Client {
            let actions = session.close(CLOSE_REASON)?;
            execute(&mut stream, &session, actions, &mut report).await?;
        }

        if session.state().is_terminal() {
            report.state = session.state();
            tracing::info!(
                role = ?report.role,
                state = ?report.state,
                delivered = report.delivered.len(),
                rejected = report.rejected.len(),
                "endpoint finished"
            );
            return Ok(report);
        }

        let Some(frame) = read_frame(&mut stream).await? else {
            return Err(HarnessError::Disconnected(format!("{:?}", session.state())));
        };

        match session.handle_frame(&frame) {
            Ok(actions) => execute(&mut stream, &session, actions, &mut report).await?,
            Err(error) if !session.state().is_terminal() => {
                tracing::warn!(role = ?report.role, %error, "inbound record rejected");
                report.rejected.push(error);
            },
            Err(error) => return Err(error.into()),
        }
    }
}

async fn execute<S, E>(
    stream: &mut S,
    session: &HandshakeSession<E>,
    actions: Vec<SessionAction>,
    report: &mut EndpointReport,
) -> Result<(), HarnessError>
where
    S: AsyncWrite + Unpin,
    E: Environment,
{
    for action in actions {
        match action {
            SessionAction::Send(frame) => write_frame(stream, &frame).await?,
            SessionAction::KeysDerived => report.session_keys = session.session_keys().cloned(),
            SessionAction::Deliver(plaintext) => report.delivered.push(plaintext),
            SessionAction::Close { reason } => report.close_reason = Some(reason),
        }
    }
    Ok(())
}

/// Forward frames from `reader` to `writer` through `tamper`.
///
/// Runs until `reader` ends, then shuts `writer` down so the far side sees
/// the end of stream too. Returns the tamper state so callers can check
/// whether the planned corruption fired.
///
/// # Errors
///
/// - `Io` / `Protocol` if either side fails
pub async fn forward_frames<R, W>(
    mut reader: R,
    mut writer: W,
    mut tamper: Tamper,
) -> Result<Tamper, HarnessError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = read_frame(&mut reader).await? {
        let frame = tamper.apply(frame)?;
        write_frame(&mut writer, &frame).await?;
    }

    // Far side may already be gone
    if let Err(e) = writer.shutdown().await {
        tracing::debug!(error = %e, "relay shutdown after peer left");
    }
    Ok(tamper)
}
