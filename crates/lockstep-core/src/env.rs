//! Environment abstraction for deterministic testing.
//!
//! Decouples protocol logic from the source of randomness. Production uses
//! the OS generator ([`crate::SystemEnv`]); simulation uses a seeded
//! generator so every handshake can be replayed bit for bit.

use rand::{CryptoRng, RngCore};

/// Abstract environment providing randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - Given the same seed, a simulation environment produces the same bytes
pub trait Environment: Clone + Send + Sync + 'static {
    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}

/// `rand` adapter over an [`Environment`].
///
/// Lets the key-exchange code, which is written against
/// `RngCore + CryptoRng`, draw from the injected environment.
pub struct EnvRng<'a, E: Environment> {
    env: &'a E,
}

impl<'a, E: Environment> EnvRng<'a, E> {
    /// Borrow `env` as a random number generator.
    pub fn new(env: &'a E) -> Self {
        Self { env }
    }
}

impl<E: Environment> RngCore for EnvRng<'_, E> {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.env.random_bytes(&mut bytes);
        u32::from_le_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.env.random_bytes(&mut bytes);
        u64::from_le_bytes(bytes)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.env.random_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.env.random_bytes(dest);
        Ok(())
    }
}

// The Environment contract requires a cryptographic source
impl<E: Environment> CryptoRng for EnvRng<'_, E> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct CountingEnv;

    impl Environment for CountingEnv {
        fn random_bytes(&self, buffer: &mut [u8]) {
            for (i, byte) in buffer.iter_mut().enumerate() {
                *byte = i as u8;
            }
        }
    }

    #[test]
    fn rng_draws_from_environment() {
        let env = CountingEnv;
        let mut rng = EnvRng::new(&env);

        let mut buf = [0xffu8; 5];
        rng.fill_bytes(&mut buf);
        assert_eq!(buf, [0, 1, 2, 3, 4]);

        assert_eq!(rng.next_u32(), u32::from_le_bytes([0, 1, 2, 3]));
        assert_eq!(env.random_u64(), u64::from_be_bytes([0, 1, 2, 3, 4, 5, 6, 7]));
    }
}
