//! Seeded simulation environment.

use std::sync::{Arc, Mutex, PoisonError};

use lockstep_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Environment drawing from a seeded ChaCha20 stream.
///
/// Clones share the stream, so a session and its driver see one sequence.
/// Two environments built from the same seed produce identical bytes, which
/// makes every handshake in a test reproducible from its seed alone.
///
/// Never use outside tests: the seed is the whole secret.
#[derive(Clone)]
pub struct SimEnv {
    rng: Arc<Mutex<ChaCha20Rng>>,
}

impl SimEnv {
    /// Environment seeded with `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))) }
    }
}

impl std::fmt::Debug for SimEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimEnv").finish_non_exhaustive()
    }
}

impl Environment for SimEnv {
    fn random_bytes(&self, buffer: &mut [u8]) {
        // A panic while holding the lock cannot leave the stream half-updated
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}
