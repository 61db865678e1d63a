//! Handshake and record state machine.
//!
//! Uses the action pattern: methods take input (a frame, a plaintext) and
//! return actions for the driver to execute. The session performs no I/O and
//! draws randomness only from its [`Environment`], so a pair of sessions can
//! be driven step by step in tests.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ start ┌───────────┐ peer Hello ┌───────────────────┐
//! │ Init │──────>│ SentHello │───────────>│ ReceivedPeerHello │
//! └──────┘       └───────────┘            └───────────────────┘
//!                                                   │ derive keys
//!                                                   ↓
//!            ┌─────────────┐ first record  ┌────────────┐
//!            │ Established │<──────────────│ KeyDerived │
//!            └─────────────┘               └────────────┘
//!                   │ close / peer Close
//!                   ↓
//!              ┌────────┐        any fatal error ┌─────────┐
//!              │ Closed │                        │ Aborted │
//!              └────────┘                        └─────────┘
//! ```
//!
//! Every non-terminal state can move to `Closed` (explicit close) or
//! `Aborted` (fatal error). A step either completes its transition or
//! aborts; no state is skipped.

use lockstep_crypto::{
    KeyPair, NONCE_SIZE, SessionKeys, SharedSecret, compute_shared_secret, derive_session_keys,
    generate_key_pair, validate_public_value,
};
use lockstep_proto::{Close, Frame, Hello, Opcode, Payload, Record};
use num_bigint::BigUint;

use crate::{
    config::SessionConfig,
    env::{EnvRng, Environment},
    error::SessionError,
    record::{Direction, RecordLayer},
};

/// Actions returned by the session state machine.
///
/// The driver executes these:
/// - `Send`: encode and write the frame to the peer
/// - `KeysDerived`: the handshake produced session keys
/// - `Deliver`: hand a verified plaintext to the application
/// - `Close`: the session ended with this reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Send this frame to the peer
    Send(Frame),

    /// Session keys are available
    KeysDerived,

    /// Verified application plaintext
    Deliver(Vec<u8>),

    /// Session is closed
    Close {
        /// Reason for closing
        reason: String,
    },
}

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Created, nothing sent
    Init,
    /// Own Hello sent, waiting for the peer's
    SentHello,
    /// Peer Hello validated
    ReceivedPeerHello,
    /// Shared secret computed and session keys derived
    KeyDerived,
    /// At least one record sent or received
    Established,
    /// Closed by either side (terminal)
    Closed,
    /// Failed (terminal)
    Aborted,
}

impl SessionState {
    /// `Closed` or `Aborted`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Aborted)
    }

    /// Records may be sent and received.
    pub fn has_keys(self) -> bool {
        matches!(self, Self::KeyDerived | Self::Established)
    }
}

/// Which end of the handshake this session plays.
///
/// Both ends send a Hello; the role only fixes the nonce order in key
/// derivation and the direction labels of records. The two peers must take
/// opposite roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Initiating endpoint
    Client,
    /// Responding endpoint
    Server,
}

impl Role {
    /// The role the other endpoint plays.
    pub fn peer(self) -> Self {
        match self {
            Self::Client => Self::Server,
            Self::Server => Self::Client,
        }
    }

    fn outbound(self) -> Direction {
        match self {
            Self::Client => Direction::ClientToServer,
            Self::Server => Direction::ServerToClient,
        }
    }
}

/// One endpoint of a secure channel.
///
/// Single owner: every method takes `&mut self`. Key material is dropped
/// (and wiped) as soon as the session reaches a terminal state.
pub struct HandshakeSession<E: Environment> {
    env: E,
    role: Role,
    config: SessionConfig,
    state: SessionState,
    key_pair: Option<KeyPair>,
    own_nonce: [u8; NONCE_SIZE],
    peer_public: Option<BigUint>,
    shared_secret: Option<SharedSecret>,
    session_keys: Option<SessionKeys>,
    records: Option<RecordLayer>,
    records_received: u64,
}

impl<E: Environment> HandshakeSession<E> {
    /// Create a session in [`SessionState::Init`].
    pub fn new(env: E, role: Role, config: SessionConfig) -> Self {
        Self {
            env,
            role,
            config,
            state: SessionState::Init,
            key_pair: None,
            own_nonce: [0; NONCE_SIZE],
            peer_public: None,
            shared_secret: None,
            session_keys: None,
            records: None,
            records_received: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// This endpoint's role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Own public value. `None` before [`HandshakeSession::start`].
    pub fn public_value(&self) -> Option<&BigUint> {
        self.key_pair.as_ref().map(KeyPair::public)
    }

    /// Peer's validated public value. `None` before its Hello.
    pub fn peer_public_value(&self) -> Option<&BigUint> {
        self.peer_public.as_ref()
    }

    /// Shared secret. `None` until keys are derived and after termination.
    pub fn shared_secret(&self) -> Option<&SharedSecret> {
        self.shared_secret.as_ref()
    }

    /// Derived keys. `None` until keys are derived and after termination.
    pub fn session_keys(&self) -> Option<&SessionKeys> {
        self.session_keys.as_ref()
    }

    /// Records sealed by this endpoint.
    pub fn records_sent(&self) -> u64 {
        self.records.as_ref().map_or(0, RecordLayer::sent)
    }

    /// Records verified and delivered to the application.
    pub fn records_received(&self) -> u64 {
        self.records_received
    }

    /// Generate the key pair and nonce, and emit Hello.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if not in `Init`
    pub fn start(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        self.require(SessionState::Init, "start")?;

        let key_pair = {
            let mut rng = EnvRng::new(&self.env);
            generate_key_pair(&self.config.params, &mut rng)
        };
        let key_pair = match key_pair {
            Ok(pair) => pair,
            Err(e) => return Err(self.fail(e.into())),
        };
        self.env.random_bytes(&mut self.own_nonce);

        let hello = Payload::Hello(Hello {
            modulus: self.config.params.modulus().to_bytes_be(),
            generator: self.config.params.generator().to_bytes_be(),
            public_value: key_pair.public().to_bytes_be(),
            nonce: self.own_nonce,
        });
        let frame = match hello.into_frame() {
            Ok(frame) => frame,
            Err(e) => return Err(self.fail(e.into())),
        };

        self.key_pair = Some(key_pair);
        self.transition(SessionState::SentHello);

        Ok(vec![SessionAction::Send(frame)])
    }

    /// Process an incoming frame.
    ///
    /// # Errors
    ///
    /// - `InvalidState` for any frame once terminal, or a Hello/Record that
    ///   arrives before this endpoint is ready for it
    /// - `ParameterMismatch` / `InvalidPublicValue` for a bad peer Hello
    /// - `UnexpectedFrame` for a second Hello
    /// - `Integrity` / `Padding` for a bad record (session survives unless
    ///   configured to abort)
    /// - `Protocol` for an unknown opcode or undecodable payload
    pub fn handle_frame(&mut self, frame: &Frame) -> Result<Vec<SessionAction>, SessionError> {
        if self.state.is_terminal() {
            return Err(self.invalid_state("handle_frame"));
        }

        let payload = match Payload::from_frame(frame) {
            Ok(payload) => payload,
            Err(e) => return Err(self.fail(e.into())),
        };

        match (self.state, payload) {
            (SessionState::SentHello, Payload::Hello(hello)) => self.handle_hello(&hello),
            (state, Payload::Record(record)) if state.has_keys() => self.handle_record(&record),
            (_, Payload::Close(close)) => Ok(self.handle_close(close)),
            (SessionState::Init, Payload::Hello(_)) => Err(self.fail_invalid_state("handle_hello")),
            (SessionState::Init | SessionState::SentHello, Payload::Record(_)) => {
                Err(self.fail_invalid_state("handle_record"))
            },
            (state, _) => {
                let err = SessionError::UnexpectedFrame { state, opcode: frame.header.opcode() };
                Err(self.fail(err))
            },
        }
    }

    /// Protect and emit one application record.
    ///
    /// # Errors
    ///
    /// - `InvalidState` before keys are derived or once terminal
    /// - `Protocol` if the record would not fit in one frame; the session
    ///   aborts without consuming a sequence number or emitting anything
    pub fn send(&mut self, plaintext: &[u8]) -> Result<Vec<SessionAction>, SessionError> {
        if !self.state.has_keys() {
            return Err(self.fail_invalid_state("send"));
        }

        let Some(records) = self.records.as_mut() else {
            return Err(self.fail_invalid_state("send"));
        };
        let frame = match records.seal(plaintext) {
            Ok(frame) => frame,
            Err(e) => return Err(self.fail(e.into())),
        };

        if self.state == SessionState::KeyDerived {
            self.transition(SessionState::Established);
        }

        Ok(vec![SessionAction::Send(frame)])
    }

    /// Close the session and tell the peer.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if already terminal
    /// - `Protocol` if `reason` would not fit in one frame; the session
    ///   aborts without emitting anything
    pub fn close(&mut self, reason: &str) -> Result<Vec<SessionAction>, SessionError> {
        if self.state.is_terminal() {
            return Err(self.invalid_state("close"));
        }

        let frame = match Payload::Close(Close { reason: reason.to_string() }).into_frame() {
            Ok(frame) => frame,
            Err(e) => return Err(self.fail(e.into())),
        };
        self.transition(SessionState::Closed);
        self.wipe();

        Ok(vec![SessionAction::Send(frame), SessionAction::Close { reason: reason.to_string() }])
    }

    /// Abandon the session without notifying the peer.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if already terminal
    pub fn abort(&mut self, reason: &str) -> Result<(), SessionError> {
        if self.state.is_terminal() {
            return Err(self.invalid_state("abort"));
        }

        tracing::warn!(role = ?self.role, from = ?self.state, %reason, "session aborted");
        self.state = SessionState::Aborted;
        self.wipe();
        Ok(())
    }

    fn handle_hello(&mut self, hello: &Hello) -> Result<Vec<SessionAction>, SessionError> {
        let params = &self.config.params;
        if BigUint::from_bytes_be(&hello.modulus) != *params.modulus()
            || BigUint::from_bytes_be(&hello.generator) != *params.generator()
        {
            return Err(self.fail(SessionError::ParameterMismatch));
        }

        let peer_public = BigUint::from_bytes_be(&hello.public_value);
        if let Err(e) = validate_public_value(&peer_public, params.modulus()) {
            return Err(self.fail(e.into()));
        }

        self.peer_public = Some(peer_public);
        self.transition(SessionState::ReceivedPeerHello);

        match self.derive_keys(&hello.nonce) {
            Ok(()) => {
                self.transition(SessionState::KeyDerived);
                Ok(vec![SessionAction::KeysDerived])
            },
            Err(e) => Err(self.fail(e)),
        }
    }

    fn derive_keys(&mut self, peer_nonce: &[u8; NONCE_SIZE]) -> Result<(), SessionError> {
        let (Some(key_pair), Some(peer_public)) = (&self.key_pair, &self.peer_public) else {
            return Err(self.invalid_state("derive_keys"));
        };

        let shared =
            compute_shared_secret(key_pair.secret(), peer_public, self.config.params.modulus())?;

        let (client_nonce, server_nonce) = match self.role {
            Role::Client => (&self.own_nonce, peer_nonce),
            Role::Server => (peer_nonce, &self.own_nonce),
        };
        let keys = derive_session_keys(&shared, client_nonce, server_nonce, self.config.key_size);
        let records = RecordLayer::new(&keys, self.role.outbound())?;

        self.shared_secret = Some(shared);
        self.session_keys = Some(keys);
        self.records = Some(records);

        Ok(())
    }

    fn handle_record(&mut self, record: &Record) -> Result<Vec<SessionAction>, SessionError> {
        let Some(records) = self.records.as_mut() else {
            return Err(self.fail_invalid_state("handle_record"));
        };

        match records.open(record) {
            Ok(plaintext) => {
                self.records_received += 1;
                if self.state == SessionState::KeyDerived {
                    self.transition(SessionState::Established);
                }
                Ok(vec![SessionAction::Deliver(plaintext)])
            },
            Err(SessionError::Integrity) if !self.config.abort_on_integrity_failure => {
                tracing::warn!(role = ?self.role, "record failed integrity check, discarded");
                Err(SessionError::Integrity)
            },
            Err(SessionError::Padding) => {
                tracing::warn!(role = ?self.role, "record padding malformed, discarded");
                Err(SessionError::Padding)
            },
            Err(e) => Err(self.fail(e)),
        }
    }

    fn handle_close(&mut self, close: Close) -> Vec<SessionAction> {
        self.transition(SessionState::Closed);
        self.wipe();
        vec![SessionAction::Close { reason: close.reason }]
    }

    fn require(&mut self, expected: SessionState, operation: &str) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.fail_invalid_state(operation))
        }
    }

    fn invalid_state(&self, operation: &str) -> SessionError {
        SessionError::InvalidState { state: self.state, operation: operation.to_string() }
    }

    fn fail_invalid_state(&mut self, operation: &str) -> SessionError {
        let err = self.invalid_state(operation);
        self.fail(err)
    }

    /// Abort on any error except one scoped to a single record.
    fn fail(&mut self, err: SessionError) -> SessionError {
        let record_scoped = !err.is_fatal()
            && !(matches!(err, SessionError::Integrity) && self.config.abort_on_integrity_failure);

        if !record_scoped && !self.state.is_terminal() {
            tracing::warn!(role = ?self.role, from = ?self.state, error = %err, "session aborted");
            self.state = SessionState::Aborted;
            self.wipe();
        }

        err
    }

    fn transition(&mut self, to: SessionState) {
        tracing::debug!(role = ?self.role, from = ?self.state, ?to, "session transition");
        self.state = to;
    }

    fn wipe(&mut self) {
        self.key_pair = None;
        self.shared_secret = None;
        self.session_keys = None;
        self.records = None;
    }
}

impl<E: Environment> std::fmt::Debug for HandshakeSession<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandshakeSession")
            .field("role", &self.role)
            .field("state", &self.state)
            .field("records_sent", &self.records_sent())
            .field("records_received", &self.records_received)
            .finish_non_exhaustive()
    }
}
