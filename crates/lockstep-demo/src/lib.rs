//! Local two-endpoint run of the Lockstep protocol.
//!
//! A client and a server task talk over tokio duplex pipes through a relay.
//! The relay forwards frames unchanged unless told to corrupt a record, which
//! shows the receiver rejecting it while the rest of the conversation goes
//! through.
//!
//! ```text
//! client ──duplex──> relay (tamper) ──duplex──> server
//!        <──duplex── relay          <──duplex──
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use lockstep_core::{Environment, HandshakeSession, Role, SessionConfig, SystemEnv};
use lockstep_harness::{
    EndpointReport, EndpointScript, HarnessError, SimEnv, Tamper, TamperPlan, forward_frames,
    run_endpoint,
};

/// Pipe capacity; a MODP-2048 Hello is well under this.
const PIPE_CAPACITY: usize = 64 * 1024;

/// Message the server sends once keys are derived.
pub const SERVER_GREETING: &[u8] = b"server ready";

/// What to run.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Settings shared by both endpoints
    pub session: SessionConfig,
    /// Messages the client sends
    pub messages: Vec<Vec<u8>>,
    /// Corrupt one client record on its way to the server
    pub tamper: Option<TamperPlan>,
    /// Seed both endpoints deterministically instead of using OS randomness
    pub seed: Option<u64>,
}

/// Both endpoints' reports plus whether the relay corrupted anything.
#[derive(Debug)]
pub struct DemoOutcome {
    /// Client endpoint
    pub client: EndpointReport,
    /// Server endpoint
    pub server: EndpointReport,
    /// Relay corrupted a record
    pub tampered: bool,
}

impl DemoOutcome {
    /// Both endpoints derived the same keys.
    pub fn keys_match(&self) -> bool {
        self.client.session_keys.is_some() && self.client.session_keys == self.server.session_keys
    }
}

/// Run the client and server to completion.
///
/// # Errors
///
/// - Any endpoint or relay failure
pub async fn run_demo(config: DemoConfig) -> Result<DemoOutcome, HarnessError> {
    match config.seed {
        Some(seed) => {
            run_with(SimEnv::with_seed(seed), SimEnv::with_seed(seed.wrapping_add(1)), config)
                .await
        },
        None => run_with(SystemEnv::new(), SystemEnv::new(), config).await,
    }
}

async fn run_with<E: Environment>(
    client_env: E,
    server_env: E,
    config: DemoConfig,
) -> Result<DemoOutcome, HarnessError> {
    let (client_io, relay_client_side) = tokio::io::duplex(PIPE_CAPACITY);
    let (relay_server_side, server_io) = tokio::io::duplex(PIPE_CAPACITY);
    let (from_client, to_client) = tokio::io::split(relay_client_side);
    let (from_server, to_server) = tokio::io::split(relay_server_side);

    let upstream = config.tamper.map_or_else(Tamper::none, Tamper::with_plan);

    let client = HandshakeSession::new(client_env, Role::Client, config.session.clone());
    let server = HandshakeSession::new(server_env, Role::Server, config.session);

    let client_script = EndpointScript { outbound: config.messages.clone(), expect_inbound: 1 };
    let server_script = EndpointScript {
        outbound: vec![SERVER_GREETING.to_vec()],
        expect_inbound: config.messages.len(),
    };

    tracing::info!(
        messages = config.messages.len(),
        tamper = config.tamper.is_some(),
        deterministic = config.seed.is_some(),
        "starting endpoints"
    );

    let (client, server, upstream, downstream) = tokio::join!(
        run_endpoint(client_io, client, client_script),
        run_endpoint(server_io, server, server_script),
        forward_frames(from_client, to_server, upstream),
        forward_frames(from_server, to_client, Tamper::none()),
    );
    downstream?;

    Ok(DemoOutcome { client: client?, server: server?, tampered: upstream?.applied() })
}

#[cfg(test)]
mod tests {
    use lockstep_core::{SessionError, SessionState};
    use lockstep_crypto::DomainParameters;

    use super::*;

    fn config(tamper: Option<TamperPlan>) -> DemoConfig {
        DemoConfig {
            session: SessionConfig::with_params(DomainParameters::toy()),
            messages: vec![b"one".to_vec(), b"two".to_vec()],
            tamper,
            seed: Some(99),
        }
    }

    #[tokio::test]
    async fn clean_run_delivers_everything() {
        let outcome = run_demo(config(None)).await.unwrap();

        assert!(outcome.keys_match());
        assert!(!outcome.tampered);
        assert_eq!(outcome.client.state, SessionState::Closed);
        assert_eq!(outcome.server.state, SessionState::Closed);
        assert_eq!(outcome.server.delivered, vec![b"one".to_vec(), b"two".to_vec()]);
        assert_eq!(outcome.client.delivered, vec![SERVER_GREETING.to_vec()]);
    }

    #[tokio::test]
    async fn tampered_run_rejects_one_record() {
        let outcome = run_demo(config(Some(TamperPlan::first_record()))).await.unwrap();

        assert!(outcome.tampered);
        assert_eq!(outcome.server.rejected, vec![SessionError::Integrity]);
        assert_eq!(outcome.server.delivered, vec![b"two".to_vec()]);
    }

    #[tokio::test]
    async fn system_randomness_agrees() {
        let outcome = run_demo(DemoConfig { seed: None, ..config(None) }).await.unwrap();
        assert!(outcome.keys_match());
    }
}
