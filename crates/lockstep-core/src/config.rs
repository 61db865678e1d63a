//! Session configuration

use lockstep_crypto::{DomainParameters, KeySize};

/// Tunables for one [`crate::HandshakeSession`].
///
/// Both endpoints must agree on `params`; a peer offering different
/// parameters is refused. `key_size` must match too, otherwise the derived
/// keys differ and every record fails verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Group used for key agreement
    pub params: DomainParameters,

    /// Cipher key width
    pub key_size: KeySize,

    /// Abort the whole session on the first record that fails verification.
    ///
    /// When `false` the bad record is dropped and later records are still
    /// accepted.
    pub abort_on_integrity_failure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            params: DomainParameters::modp_2048(),
            key_size: KeySize::Aes128,
            abort_on_integrity_failure: false,
        }
    }
}

impl SessionConfig {
    /// Default configuration over the given group.
    pub fn with_params(params: DomainParameters) -> Self {
        Self { params, ..Self::default() }
    }

    /// Set the cipher key width.
    #[must_use]
    pub fn key_size(mut self, key_size: KeySize) -> Self {
        self.key_size = key_size;
        self
    }

    /// Set the integrity-failure policy.
    #[must_use]
    pub fn abort_on_integrity_failure(mut self, abort: bool) -> Self {
        self.abort_on_integrity_failure = abort;
        self
    }
}
