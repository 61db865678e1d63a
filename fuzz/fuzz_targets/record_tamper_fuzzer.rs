//! Fuzz target for record tampering
//!
//! Runs a seeded handshake, sends fuzzer-chosen messages in both directions,
//! and corrupts fuzzer-chosen records in flight.
//!
//! # Invariants
//!
//! - Every corrupted record is rejected with `Integrity`, never delivered
//! - Every untouched record is delivered, in order
//! - Rejections never end either session
//! - The standard invariant registry holds after every step

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use lockstep_core::{Role, SessionConfig, SessionError};
use lockstep_crypto::DomainParameters;
use lockstep_harness::{InvariantRegistry, SimPair, TamperPlan};

#[derive(Debug, Clone, Arbitrary)]
enum Action {
    ClientSends(Vec<u8>),
    ServerSends(Vec<u8>),
    CorruptTowardServer { record: u8, byte: u16, bit: u8 },
    CorruptTowardClient { record: u8, byte: u16, bit: u8 },
    Pump,
}

#[derive(Debug, Clone, Arbitrary)]
struct Scenario {
    seed: u64,
    actions: Vec<Action>,
}

fuzz_target!(|scenario: Scenario| {
    let mut pair = SimPair::new(scenario.seed, &SessionConfig::with_params(DomainParameters::toy()));
    pair.handshake().expect("honest handshake must succeed");
    let registry = InvariantRegistry::standard();

    for action in scenario.actions.into_iter().take(64) {
        match action {
            Action::ClientSends(msg) => pair.send(Role::Client, &msg).expect("send"),
            Action::ServerSends(msg) => pair.send(Role::Server, &msg).expect("send"),
            Action::CorruptTowardServer { record, byte, bit } => pair.tamper(
                Role::Server,
                TamperPlan { record_index: u64::from(record % 8), byte: usize::from(byte), bit },
            ),
            Action::CorruptTowardClient { record, byte, bit } => pair.tamper(
                Role::Client,
                TamperPlan { record_index: u64::from(record % 8), byte: usize::from(byte), bit },
            ),
            Action::Pump => {
                pair.pump().expect("record failures must not end a session");
            },
        }
        assert_eq!(registry.check_all(&pair), vec![]);
    }

    pair.pump().expect("record failures must not end a session");
    for role in [Role::Client, Role::Server] {
        assert!(pair.rejected(role).iter().all(|e| *e == SessionError::Integrity));
        assert_eq!(
            pair.delivered(role).len() + pair.rejected(role).len(),
            pair.sent(role.peer()).len()
        );
    }
});
