//! Production Environment implementation using the OS random number generator.
//!
//! Output is not reproducible. Use a seeded simulation environment for
//! deterministic tests.

use crate::env::Environment;

/// Production environment backed by `getrandom`.
///
/// # Security
///
/// `getrandom` provides OS-level cryptographic randomness (e.g.
/// `/dev/urandom` on Linux, `BCryptGenRandom` on Windows). Suitable for
/// secret scalars and handshake nonces.
///
/// # Panics
///
/// Panics if the OS RNG fails. An endpoint without working cryptographic
/// randomness cannot generate key material at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - no key material without it");
    }
}
