//! Handshake and records over turmoil's simulated TCP.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use lockstep_core::{HandshakeSession, Role, SessionConfig, SessionState};
use lockstep_crypto::DomainParameters;
use lockstep_harness::{EndpointReport, EndpointScript, SimEnv, run_endpoint};
use turmoil::net::{TcpListener, TcpStream};

type Slot = Arc<Mutex<Option<EndpointReport>>>;

// Both ends run as turmoil clients so the simulation waits for each report
fn run_pair(
    config: &SessionConfig,
    builder: &turmoil::Builder,
) -> (EndpointReport, EndpointReport) {
    let mut sim = builder.build();
    let client_slot: Slot = Arc::default();
    let server_slot: Slot = Arc::default();

    let server_config = config.clone();
    let server_out = Arc::clone(&server_slot);
    sim.client("server", async move {
        let listener = TcpListener::bind("0.0.0.0:443").await?;
        let (stream, _) = listener.accept().await?;

        let session = HandshakeSession::new(SimEnv::with_seed(200), Role::Server, server_config);
        let script = EndpointScript { outbound: vec![b"welcome".to_vec()], expect_inbound: 2 };
        let report = run_endpoint(stream, session, script).await?;

        *server_out.lock().unwrap() = Some(report);
        Ok(())
    });

    let client_config = config.clone();
    let client_out = Arc::clone(&client_slot);
    sim.client("client", async move {
        let stream = TcpStream::connect("server:443").await?;

        let session = HandshakeSession::new(SimEnv::with_seed(100), Role::Client, client_config);
        let script = EndpointScript {
            outbound: vec![b"hello".to_vec(), b"goodbye".to_vec()],
            expect_inbound: 1,
        };
        let report = run_endpoint(stream, session, script).await?;

        *client_out.lock().unwrap() = Some(report);
        Ok(())
    });

    sim.run().expect("simulation failed");

    let client = client_slot.lock().unwrap().take().expect("client finished");
    let server = server_slot.lock().unwrap().take().expect("server finished");
    (client, server)
}

fn assert_clean_exchange(client: &EndpointReport, server: &EndpointReport) {
    assert_eq!(client.state, SessionState::Closed);
    assert_eq!(server.state, SessionState::Closed);
    assert!(client.session_keys.is_some());
    assert_eq!(client.session_keys, server.session_keys);
    assert_eq!(client.delivered, vec![b"welcome".to_vec()]);
    assert_eq!(server.delivered, vec![b"hello".to_vec(), b"goodbye".to_vec()]);
    assert!(client.rejected.is_empty());
    assert!(server.rejected.is_empty());
}

#[test]
fn toy_group_handshake_over_tcp() {
    let config = SessionConfig::with_params(DomainParameters::toy());
    let (client, server) = run_pair(&config, &turmoil::Builder::new());
    assert_clean_exchange(&client, &server);
}

#[test]
fn modp_handshake_over_tcp() {
    let (client, server) = run_pair(&SessionConfig::default(), &turmoil::Builder::new());
    assert_clean_exchange(&client, &server);
}

#[test]
fn handshake_survives_network_latency() {
    let mut builder = turmoil::Builder::new();
    builder
        .min_message_latency(Duration::from_millis(5))
        .max_message_latency(Duration::from_millis(50));

    let config = SessionConfig::with_params(DomainParameters::toy());
    let (client, server) = run_pair(&config, &builder);
    assert_clean_exchange(&client, &server);
}
