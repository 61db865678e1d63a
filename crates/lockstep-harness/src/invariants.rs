//! Invariants checked against a [`SimPair`] after any sequence of steps.
//!
//! Each invariant states something that must hold no matter which frames
//! were sent, tampered with, or closed. Tests drive a pair however they like
//! and then run [`InvariantRegistry::standard`] over it.

use lockstep_core::Role;

use crate::sim_pair::SimPair;

/// A broken invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Name of the invariant
    pub invariant: &'static str,
    /// What was observed
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

/// A property of a pair of sessions.
pub trait Invariant {
    /// Short name for reports
    fn name(&self) -> &'static str;

    /// Check the pair, describing the first problem found.
    fn check(&self, pair: &SimPair) -> Result<(), String>;
}

/// Endpoints that both hold keys hold the same keys.
#[derive(Debug, Clone, Copy)]
pub struct KeyAgreement;

impl Invariant for KeyAgreement {
    fn name(&self) -> &'static str {
        "key_agreement"
    }

    fn check(&self, pair: &SimPair) -> Result<(), String> {
        match (pair.client().session_keys(), pair.server().session_keys()) {
            (Some(c), Some(s)) if c != s => Err("client and server keys differ".into()),
            _ => Ok(()),
        }
    }
}

/// Terminal sessions hold no key material.
#[derive(Debug, Clone, Copy)]
pub struct KeysWipedWhenTerminal;

impl Invariant for KeysWipedWhenTerminal {
    fn name(&self) -> &'static str {
        "keys_wiped_when_terminal"
    }

    fn check(&self, pair: &SimPair) -> Result<(), String> {
        for role in [Role::Client, Role::Server] {
            let session = pair.session(role);
            if session.state().is_terminal()
                && (session.session_keys().is_some() || session.shared_secret().is_some())
            {
                return Err(format!("{role:?} is {:?} but still holds keys", session.state()));
            }
        }
        Ok(())
    }
}

/// Every delivered plaintext was sent by the peer, in the order sent.
///
/// Rejected records leave gaps, so delivery is a subsequence of what the
/// peer sent, never a reordering or an invention.
#[derive(Debug, Clone, Copy)]
pub struct InOrderDelivery;

impl Invariant for InOrderDelivery {
    fn name(&self) -> &'static str {
        "in_order_delivery"
    }

    fn check(&self, pair: &SimPair) -> Result<(), String> {
        for role in [Role::Client, Role::Server] {
            let sent = pair.sent(role.peer());
            let mut remaining = sent.iter();
            for (i, message) in pair.delivered(role).iter().enumerate() {
                if !remaining.any(|candidate| candidate == message) {
                    return Err(format!("{role:?} delivery {i} was never sent, or out of order"));
                }
            }
        }
        Ok(())
    }
}

/// Receive counters match what was actually delivered.
#[derive(Debug, Clone, Copy)]
pub struct ReceiveCounterMatches;

impl Invariant for ReceiveCounterMatches {
    fn name(&self) -> &'static str {
        "receive_counter_matches"
    }

    fn check(&self, pair: &SimPair) -> Result<(), String> {
        for role in [Role::Client, Role::Server] {
            let counted = pair.session(role).records_received();
            let delivered = pair.delivered(role).len() as u64;
            if counted != delivered {
                return Err(format!("{role:?} counted {counted} but delivered {delivered}"));
            }
        }
        Ok(())
    }
}

/// A set of invariants run together.
#[derive(Default)]
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl InvariantRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every invariant in this module.
    pub fn standard() -> Self {
        Self::new()
            .with(KeyAgreement)
            .with(KeysWipedWhenTerminal)
            .with(InOrderDelivery)
            .with(ReceiveCounterMatches)
    }

    /// Add an invariant.
    #[must_use]
    pub fn with(mut self, invariant: impl Invariant + 'static) -> Self {
        self.invariants.push(Box::new(invariant));
        self
    }

    /// Check every invariant, collecting all violations.
    pub fn check_all(&self, pair: &SimPair) -> Vec<Violation> {
        self.invariants
            .iter()
            .filter_map(|invariant| {
                invariant
                    .check(pair)
                    .err()
                    .map(|message| Violation { invariant: invariant.name(), message })
            })
            .collect()
    }
}
