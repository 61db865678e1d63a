//! Deterministic simulation harness for Lockstep sessions.
//!
//! Two ways to run a pair of endpoints:
//!
//! - [`SimPair`]: both sessions in one thread, joined by in-memory links that
//!   only move frames when told to. Every step is observable and the whole
//!   run is reproducible from one seed.
//! - [`run_endpoint`]: one session per task over any async byte stream, for
//!   concurrent runs over tokio pipes or turmoil's simulated TCP.
//!
//! Either way a link can carry a [`Tamper`] that flips one ciphertext bit in
//! a chosen record, to check that the receiver rejects it and carries on.
//!
//! # Invariant Testing
//!
//! The `invariants` module states properties that must hold after any run
//! of a [`SimPair`]. Use [`InvariantRegistry::standard()`] to check them all.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod actor;
pub mod error;
pub mod invariants;
pub mod sim_env;
pub mod sim_pair;
pub mod tamper;

pub use actor::{
    CLOSE_REASON, EndpointReport, EndpointScript, forward_frames, read_frame, run_endpoint,
    write_frame,
};
pub use error::HarnessError;
pub use invariants::{
    InOrderDelivery, Invariant, InvariantRegistry, KeyAgreement, KeysWipedWhenTerminal,
    ReceiveCounterMatches, Violation,
};
pub use sim_env::SimEnv;
pub use sim_pair::{SimEvent, SimPair};
pub use tamper::{Tamper, TamperPlan};
