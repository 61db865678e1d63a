//! End-to-end handshake and record tests over the in-memory simulation.

use lockstep_core::{Role, SessionConfig, SessionError, SessionState};
use lockstep_crypto::{DomainParameters, KeySize};
use lockstep_harness::{InvariantRegistry, SimEvent, SimPair, TamperPlan};
use proptest::prelude::*;

fn toy() -> SessionConfig {
    SessionConfig::with_params(DomainParameters::toy())
}

#[test]
fn modp_handshake_agrees_on_every_secret() {
    let mut pair = SimPair::new(2024, &SessionConfig::default());
    pair.handshake().unwrap();

    assert_eq!(pair.client().state(), SessionState::KeyDerived);
    assert_eq!(pair.server().state(), SessionState::KeyDerived);
    assert_eq!(pair.client().shared_secret(), pair.server().shared_secret());
    assert_eq!(pair.client().session_keys(), pair.server().session_keys());
    assert_eq!(pair.client().peer_public_value(), pair.server().public_value());
    assert_eq!(pair.server().peer_public_value(), pair.client().public_value());
}

#[test]
fn conversation_reaches_established_and_closes() {
    let mut pair = SimPair::new(9, &toy());
    pair.handshake().unwrap();

    pair.send(Role::Client, b"ping").unwrap();
    pair.pump().unwrap();
    pair.send(Role::Server, b"pong").unwrap();
    pair.pump().unwrap();

    assert_eq!(pair.delivered(Role::Server), vec![b"ping".to_vec()]);
    assert_eq!(pair.delivered(Role::Client), vec![b"pong".to_vec()]);
    assert_eq!(pair.client().state(), SessionState::Established);
    assert_eq!(pair.server().state(), SessionState::Established);

    pair.close(Role::Client, "bye").unwrap();
    pair.pump().unwrap();

    assert_eq!(pair.server().state(), SessionState::Closed);
    assert!(pair.server().session_keys().is_none());
    assert_eq!(
        pair.events().last(),
        Some(&SimEvent::Closed { at: Role::Server, reason: "bye".into() })
    );
}

#[test]
fn tampered_record_never_reaches_the_application() {
    let mut pair = SimPair::new(77, &toy());
    pair.handshake().unwrap();
    pair.tamper(Role::Server, TamperPlan { record_index: 0, byte: 17, bit: 4 });

    pair.send(Role::Client, b"attack at dawn, bring snacks").unwrap();
    pair.pump().unwrap();

    assert!(pair.tampered(Role::Server));
    assert_eq!(pair.rejected(Role::Server), vec![SessionError::Integrity]);
    assert!(pair.delivered(Role::Server).is_empty());
    assert_eq!(pair.server().state(), SessionState::KeyDerived);

    // Later records still flow
    pair.send(Role::Client, b"retreat").unwrap();
    pair.pump().unwrap();
    assert_eq!(pair.delivered(Role::Server), vec![b"retreat".to_vec()]);
}

#[test]
fn strict_config_aborts_on_tamper() {
    let config = toy().abort_on_integrity_failure(true);
    let mut pair = SimPair::new(5, &config);
    pair.handshake().unwrap();
    pair.tamper(Role::Server, TamperPlan::first_record());

    pair.send(Role::Client, b"x").unwrap();
    let result = pair.pump();

    assert!(result.is_err());
    assert_eq!(pair.server().state(), SessionState::Aborted);
    assert!(pair.server().session_keys().is_none());
}

#[test]
fn oversized_message_aborts_sender_and_queues_nothing() {
    let mut pair = SimPair::new(13, &toy());
    pair.handshake().unwrap();

    assert!(pair.send(Role::Client, &vec![0xff; 600_000]).is_err());

    assert_eq!(pair.client().state(), SessionState::Aborted);
    assert!(pair.sent(Role::Client).is_empty());
    assert_eq!(pair.pump().unwrap(), 0);
    assert_eq!(pair.server().state(), SessionState::KeyDerived);
    assert_eq!(InvariantRegistry::standard().check_all(&pair), vec![]);
}

#[test]
fn send_before_handshake_is_rejected() {
    let mut pair = SimPair::new(1, &toy());
    assert!(pair.send(Role::Client, b"too early").is_err());
    assert_eq!(pair.client().state(), SessionState::Aborted);
}

fn key_size_strategy() -> impl Strategy<Value = KeySize> {
    prop_oneof![Just(KeySize::Aes128), Just(KeySize::Aes192), Just(KeySize::Aes256)]
}

#[derive(Debug, Clone)]
enum Step {
    Send(Role, Vec<u8>),
    Tamper(Role, TamperPlan),
    Pump,
}

fn role_strategy() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::Client), Just(Role::Server)]
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => (role_strategy(), prop::collection::vec(any::<u8>(), 0..64))
            .prop_map(|(r, m)| Step::Send(r, m)),
        1 => (role_strategy(), 0u64..4, any::<usize>(), 0u8..8).prop_map(|(r, i, byte, bit)| {
            Step::Tamper(r, TamperPlan { record_index: i, byte, bit })
        }),
        2 => Just(Step::Pump),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_invariants_hold_for_any_schedule(
        seed in any::<u64>(),
        key_size in key_size_strategy(),
        steps in prop::collection::vec(step_strategy(), 1..40),
    ) {
        let mut pair = SimPair::new(seed, &toy().key_size(key_size));
        pair.handshake().unwrap();
        let registry = InvariantRegistry::standard();

        for step in steps {
            match step {
                Step::Send(role, msg) => pair.send(role, &msg).unwrap(),
                Step::Tamper(role, plan) => pair.tamper(role, plan),
                Step::Pump => { pair.pump().unwrap(); },
            }
            prop_assert_eq!(registry.check_all(&pair), vec![]);
        }

        pair.pump().unwrap();
        let sent = pair.sent(Role::Client).len() + pair.sent(Role::Server).len();
        let received = pair.delivered(Role::Client).len() + pair.delivered(Role::Server).len();
        let rejected = pair.rejected(Role::Client).len() + pair.rejected(Role::Server).len();
        prop_assert_eq!(sent, received + rejected);
    }
}
