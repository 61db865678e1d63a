//! Lockstep demo binary.
//!
//! # Usage
//!
//! ```bash
//! # Handshake over the 2048-bit group and send one message
//! lockstep-demo --message "hello"
//!
//! # Toy group, AES-256, corrupt the first record in flight
//! lockstep-demo --group toy --key-size 256 --message one --message two --tamper
//!
//! # Watch every state transition
//! RUST_LOG=lockstep_core=debug lockstep-demo --seed 7
//! ```

use clap::{Parser, ValueEnum};
use lockstep_core::SessionConfig;
use lockstep_crypto::{DomainParameters, KeySize};
use lockstep_demo::{DemoConfig, run_demo};
use lockstep_harness::TamperPlan;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Diffie-Hellman group to run over
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Group {
    /// p = 23, g = 5
    Toy,
    /// RFC 3526 group 14
    Modp2048,
}

/// Lockstep handshake demo
#[derive(Parser, Debug)]
#[command(name = "lockstep-demo")]
#[command(about = "Run a Lockstep handshake and record exchange between two local endpoints")]
#[command(version)]
struct Args {
    /// Diffie-Hellman group
    #[arg(long, value_enum, default_value = "modp2048")]
    group: Group,

    /// Block cipher key size in bits
    #[arg(
        long,
        default_value = "128",
        value_parser = clap::builder::PossibleValuesParser::new(["128", "192", "256"])
    )]
    key_size: String,

    /// Message for the client to send (repeatable)
    #[arg(short, long = "message", default_value = "hello, lockstep")]
    messages: Vec<String>,

    /// Flip one bit of the first client record in transit
    #[arg(long)]
    tamper: bool,

    /// Seed both endpoints for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Abort the server session on the first bad record
    #[arg(long)]
    strict: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let params = match args.group {
        Group::Toy => DomainParameters::toy(),
        Group::Modp2048 => DomainParameters::modp_2048(),
    };
    let key_size = KeySize::from_bits(args.key_size.parse()?)?;

    let config = DemoConfig {
        session: SessionConfig::with_params(params)
            .key_size(key_size)
            .abort_on_integrity_failure(args.strict),
        messages: args.messages.into_iter().map(String::into_bytes).collect(),
        tamper: args.tamper.then(TamperPlan::first_record),
        seed: args.seed,
    };

    tracing::info!(group = ?args.group, ?key_size, "Lockstep demo starting");

    let outcome = run_demo(config).await?;

    tracing::info!(
        keys_match = outcome.keys_match(),
        tampered = outcome.tampered,
        "handshake complete"
    );
    for message in &outcome.server.delivered {
        tracing::info!(text = %String::from_utf8_lossy(message), "server received");
    }
    for error in &outcome.server.rejected {
        tracing::warn!(%error, "server rejected a record");
    }
    for message in &outcome.client.delivered {
        tracing::info!(text = %String::from_utf8_lossy(message), "client received");
    }
    tracing::info!(
        client = ?outcome.client.state,
        server = ?outcome.server.state,
        reason = outcome.server.close_reason.as_deref().unwrap_or("-"),
        "sessions finished"
    );

    Ok(())
}
