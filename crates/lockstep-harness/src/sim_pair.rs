//! Synchronous two-party simulation.
//!
//! [`SimPair`] wires a client and a server session together through two
//! ordered in-memory links. Nothing runs until [`SimPair::pump`] is called,
//! so a test controls exactly when frames move and can inspect both sessions
//! between steps.

use std::collections::VecDeque;

use lockstep_core::{HandshakeSession, Role, SessionAction, SessionConfig, SessionError};
use lockstep_proto::Frame;

use crate::{
    error::HarnessError,
    sim_env::SimEnv,
    tamper::{Tamper, TamperPlan},
};

/// Something observable that happened at one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    /// Endpoint sealed a plaintext
    Sent {
        /// Sending endpoint
        from: Role,
        /// Message before sealing
        plaintext: Vec<u8>,
    },
    /// Endpoint derived session keys
    KeysDerived(Role),
    /// Endpoint delivered a verified plaintext
    Delivered {
        /// Receiving endpoint
        to: Role,
        /// Recovered message
        plaintext: Vec<u8>,
    },
    /// Endpoint rejected a record and kept going
    Rejected {
        /// Rejecting endpoint
        at: Role,
        /// Why
        error: SessionError,
    },
    /// Endpoint closed
    Closed {
        /// Closing endpoint
        at: Role,
        /// Close reason
        reason: String,
    },
}

/// One direction of travel: an ordered queue behind a tamper point.
#[derive(Debug, Default)]
struct SimLink {
    queue: VecDeque<Frame>,
    tamper: Tamper,
}

impl SimLink {
    fn push(&mut self, frame: Frame) -> Result<(), HarnessError> {
        let frame = self.tamper.apply(frame)?;
        self.queue.push_back(frame);
        Ok(())
    }
}

/// Client and server sessions joined by in-memory links.
pub struct SimPair {
    client: HandshakeSession<SimEnv>,
    server: HandshakeSession<SimEnv>,
    to_client: SimLink,
    to_server: SimLink,
    events: Vec<SimEvent>,
}

impl SimPair {
    /// Build a pair whose randomness is fully determined by `seed`.
    pub fn new(seed: u64, config: &SessionConfig) -> Self {
        let client = HandshakeSession::new(SimEnv::with_seed(seed), Role::Client, config.clone());
        let server = HandshakeSession::new(
            SimEnv::with_seed(seed ^ 0x5EED_0000_5EED),
            Role::Server,
            config.clone(),
        );

        Self {
            client,
            server,
            to_client: SimLink::default(),
            to_server: SimLink::default(),
            events: Vec::new(),
        }
    }

    /// Corrupt one record travelling toward `toward`.
    pub fn tamper(&mut self, toward: Role, plan: TamperPlan) {
        self.link_to(toward).tamper = Tamper::with_plan(plan);
    }

    /// Whether the tamper plan on the link toward `toward` has fired.
    pub fn tampered(&self, toward: Role) -> bool {
        match toward {
            Role::Client => self.to_client.tamper.applied(),
            Role::Server => self.to_server.tamper.applied(),
        }
    }

    /// Session playing `role`.
    pub fn session(&self, role: Role) -> &HandshakeSession<SimEnv> {
        match role {
            Role::Client => &self.client,
            Role::Server => &self.server,
        }
    }

    /// The client session.
    pub fn client(&self) -> &HandshakeSession<SimEnv> {
        &self.client
    }

    /// The server session.
    pub fn server(&self) -> &HandshakeSession<SimEnv> {
        &self.server
    }

    /// Everything observed so far, in order.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Plaintexts delivered to `to`, in order.
    pub fn delivered(&self, to: Role) -> Vec<Vec<u8>> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SimEvent::Delivered { to: r, plaintext } if *r == to => Some(plaintext.clone()),
                _ => None,
            })
            .collect()
    }

    /// Plaintexts sealed by `from`, in order.
    pub fn sent(&self, from: Role) -> Vec<Vec<u8>> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SimEvent::Sent { from: r, plaintext } if *r == from => Some(plaintext.clone()),
                _ => None,
            })
            .collect()
    }

    /// Errors `at` recovered from, in order.
    pub fn rejected(&self, at: Role) -> Vec<SessionError> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SimEvent::Rejected { at: r, error } if *r == at => Some(error.clone()),
                _ => None,
            })
            .collect()
    }

    /// Start both endpoints and exchange Hellos.
    ///
    /// # Errors
    ///
    /// - `Session` if either endpoint fails the handshake
    pub fn handshake(&mut self) -> Result<(), HarnessError> {
        let actions = self.client.start()?;
        self.execute(Role::Client, actions)?;
        let actions = self.server.start()?;
        self.execute(Role::Server, actions)?;

        self.pump()?;
        Ok(())
    }

    /// Seal `plaintext` at `from` and queue it toward the peer.
    ///
    /// # Errors
    ///
    /// - `Session` if `from` has no keys or is terminal
    pub fn send(&mut self, from: Role, plaintext: &[u8]) -> Result<(), HarnessError> {
        let actions = self.session_mut(from).send(plaintext)?;
        self.events.push(SimEvent::Sent { from, plaintext: plaintext.to_vec() });
        self.execute(from, actions)
    }

    /// Close `from` and queue the Close frame toward the peer.
    ///
    /// # Errors
    ///
    /// - `Session` if `from` is already terminal
    pub fn close(&mut self, from: Role, reason: &str) -> Result<(), HarnessError> {
        let actions = self.session_mut(from).close(reason)?;
        self.execute(from, actions)
    }

    /// Deliver queued frames until both links are empty.
    ///
    /// Record failures the receiver survives become [`SimEvent::Rejected`];
    /// an error that ends a session stops the pump.
    ///
    /// # Errors
    ///
    /// - `Session` for a fatal error at either endpoint
    pub fn pump(&mut self) -> Result<usize, HarnessError> {
        let mut moved = 0;

        loop {
            let (to, frame) = if let Some(frame) = self.to_server.queue.pop_front() {
                (Role::Server, frame)
            } else if let Some(frame) = self.to_client.queue.pop_front() {
                (Role::Client, frame)
            } else {
                return Ok(moved);
            };
            moved += 1;

            match self.session_mut(to).handle_frame(&frame) {
                Ok(actions) => self.execute(to, actions)?,
                Err(error) if !self.session(to).state().is_terminal() => {
                    tracing::debug!(role = ?to, %error, "record rejected");
                    self.events.push(SimEvent::Rejected { at: to, error });
                },
                Err(error) => return Err(error.into()),
            }
        }
    }

    fn execute(&mut self, at: Role, actions: Vec<SessionAction>) -> Result<(), HarnessError> {
        for action in actions {
            match action {
                SessionAction::Send(frame) => self.link_to(at.peer()).push(frame)?,
                SessionAction::KeysDerived => self.events.push(SimEvent::KeysDerived(at)),
                SessionAction::Deliver(plaintext) => {
                    self.events.push(SimEvent::Delivered { to: at, plaintext });
                },
                SessionAction::Close { reason } => self.events.push(SimEvent::Closed { at, reason }),
            }
        }
        Ok(())
    }

    fn session_mut(&mut self, role: Role) -> &mut HandshakeSession<SimEnv> {
        match role {
            Role::Client => &mut self.client,
            Role::Server => &mut self.server,
        }
    }

    fn link_to(&mut self, role: Role) -> &mut SimLink {
        match role {
            Role::Client => &mut self.to_client,
            Role::Server => &mut self.to_server,
        }
    }
}
