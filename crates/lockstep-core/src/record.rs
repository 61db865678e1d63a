//! Record protection: encrypt-then-MAC over derived session keys.
//!
//! Each direction keeps its own sequence counter. The counter selects the
//! record's IV and is bound into its tag, so records cannot be replayed,
//! reordered or reflected back to their sender without failing verification.

use lockstep_crypto::{
    CryptoError, MAC_KEY_SIZE, RoundKeySchedule, SessionKeys, compute_tag, decrypt_cbc,
    derive_record_iv, encrypt_cbc, expand_round_keys, verify_tag,
};
use lockstep_proto::{Frame, Payload, ProtocolError, Record};
use zeroize::Zeroize;

use crate::error::SessionError;

/// Which way a record travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Sent by the client, read by the server
    ClientToServer,
    /// Sent by the server, read by the client
    ServerToClient,
}

impl Direction {
    /// Byte mixed into IVs and tags.
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::ClientToServer => 0x01,
            Self::ServerToClient => 0x02,
        }
    }

    /// The opposite direction.
    pub const fn reverse(self) -> Self {
        match self {
            Self::ClientToServer => Self::ServerToClient,
            Self::ServerToClient => Self::ClientToServer,
        }
    }
}

fn mac_input(direction: Direction, sequence: u64, ciphertext: &[u8]) -> Vec<u8> {
    let mut input = Vec::with_capacity(9 + ciphertext.len());
    input.push(direction.as_byte());
    input.extend_from_slice(&sequence.to_be_bytes());
    input.extend_from_slice(ciphertext);
    input
}

/// Per-session record protection state.
///
/// # Invariants
///
/// - A record is only decrypted after its tag verifies
/// - `recv_sequence` advances for every record presented to
///   [`RecordLayer::open`], accepted or not, so the receiver stays aligned
///   with a sender on a reliable ordered channel
pub struct RecordLayer {
    schedule: RoundKeySchedule,
    iv_seed: [u8; 16],
    mac_key: [u8; MAC_KEY_SIZE],
    outbound: Direction,
    send_sequence: u64,
    recv_sequence: u64,
}

impl RecordLayer {
    /// Set up record protection from derived keys.
    ///
    /// # Errors
    ///
    /// - `WeakKey` / `InvalidKeyLength` if the cipher key cannot be expanded
    pub fn new(keys: &SessionKeys, outbound: Direction) -> Result<Self, CryptoError> {
        Ok(Self {
            schedule: expand_round_keys(keys.cipher_key())?,
            iv_seed: *keys.iv(),
            mac_key: *keys.mac_key(),
            outbound,
            send_sequence: 0,
            recv_sequence: 0,
        })
    }

    /// Records sealed so far.
    pub fn sent(&self) -> u64 {
        self.send_sequence
    }

    /// Records presented to [`RecordLayer::open`] so far.
    pub fn attempted(&self) -> u64 {
        self.recv_sequence
    }

    /// Encrypt then tag `plaintext` as the next outbound record frame.
    ///
    /// The send sequence only advances once the frame is built, so a
    /// plaintext too large for one frame consumes no sequence number.
    ///
    /// # Errors
    ///
    /// - `PayloadTooLarge` if the record does not fit in one frame
    pub fn seal(&mut self, plaintext: &[u8]) -> Result<Frame, ProtocolError> {
        let sequence = self.send_sequence;

        let iv = derive_record_iv(&self.iv_seed, self.outbound.as_byte(), sequence);
        let ciphertext = encrypt_cbc(plaintext, &self.schedule, &iv);
        let tag = compute_tag(&self.mac_key, &mac_input(self.outbound, sequence, &ciphertext));

        let frame = Payload::Record(Record { ciphertext, tag }).into_frame()?;
        self.send_sequence += 1;
        Ok(frame)
    }

    /// Verify then decrypt the next inbound record.
    ///
    /// # Errors
    ///
    /// - `Integrity` if the tag does not verify; nothing is decrypted
    /// - `Padding` if the authenticated plaintext has malformed padding
    /// - `Crypto` if the authenticated ciphertext is not block-aligned
    pub fn open(&mut self, record: &Record) -> Result<Vec<u8>, SessionError> {
        let inbound = self.outbound.reverse();
        let sequence = self.recv_sequence;
        self.recv_sequence += 1;

        if !verify_tag(&self.mac_key, &mac_input(inbound, sequence, &record.ciphertext), &record.tag)
        {
            return Err(SessionError::Integrity);
        }

        let iv = derive_record_iv(&self.iv_seed, inbound.as_byte(), sequence);
        Ok(decrypt_cbc(&record.ciphertext, &self.schedule, &iv)?)
    }
}

impl std::fmt::Debug for RecordLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordLayer")
            .field("outbound", &self.outbound)
            .field("send_sequence", &self.send_sequence)
            .field("recv_sequence", &self.recv_sequence)
            .finish_non_exhaustive()
    }
}

impl Drop for RecordLayer {
    fn drop(&mut self) {
        self.iv_seed.zeroize();
        self.mac_key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use lockstep_crypto::{DomainParameters, KeyPair, KeySize, compute_shared_secret, derive_session_keys};
    use num_bigint::BigUint;

    use super::*;

    fn keys(key_size: KeySize) -> SessionKeys {
        let params = DomainParameters::toy();
        let a = KeyPair::from_secret(&params, BigUint::from(6u8)).unwrap();
        let b = KeyPair::from_secret(&params, BigUint::from(15u8)).unwrap();
        let shared = compute_shared_secret(a.secret(), b.public(), params.modulus()).unwrap();
        derive_session_keys(&shared, &[1; 32], &[2; 32], key_size)
    }

    fn seal(layer: &mut RecordLayer, plaintext: &[u8]) -> Record {
        match Payload::from_frame(&layer.seal(plaintext).unwrap()).unwrap() {
            Payload::Record(record) => record,
            other => panic!("expected record, got {other:?}"),
        }
    }

    fn pair(key_size: KeySize) -> (RecordLayer, RecordLayer) {
        let k = keys(key_size);
        (
            RecordLayer::new(&k, Direction::ClientToServer).unwrap(),
            RecordLayer::new(&k, Direction::ServerToClient).unwrap(),
        )
    }

    #[test]
    fn sealed_records_open_in_order() {
        for key_size in [KeySize::Aes128, KeySize::Aes192, KeySize::Aes256] {
            let (mut client, mut server) = pair(key_size);

            for msg in [&b"first"[..], b"", b"a somewhat longer third message"] {
                let record = seal(&mut client, msg);
                assert_eq!(server.open(&record).unwrap(), msg);
            }

            let reply = seal(&mut server, b"pong");
            assert_eq!(client.open(&reply).unwrap(), b"pong");
        }
    }

    #[test]
    fn same_plaintext_twice_gives_different_ciphertext() {
        let (mut client, _) = pair(KeySize::Aes128);
        let a = seal(&mut client, b"hello");
        let b = seal(&mut client, b"hello");
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn tampered_ciphertext_is_rejected_then_session_continues() {
        let (mut client, mut server) = pair(KeySize::Aes128);

        let mut bad = seal(&mut client, b"attack at dawn");
        bad.ciphertext[3] ^= 0x01;
        assert_eq!(server.open(&bad), Err(SessionError::Integrity));

        let good = seal(&mut client, b"attack at dusk");
        assert_eq!(server.open(&good).unwrap(), b"attack at dusk");
    }

    #[test]
    fn tampered_tag_is_rejected() {
        let (mut client, mut server) = pair(KeySize::Aes128);
        let mut bad = seal(&mut client, b"x");
        bad.tag[31] ^= 0x80;
        assert_eq!(server.open(&bad), Err(SessionError::Integrity));
    }

    #[test]
    fn replayed_record_is_rejected() {
        let (mut client, mut server) = pair(KeySize::Aes128);
        let record = seal(&mut client, b"once");
        assert!(server.open(&record).is_ok());
        assert_eq!(server.open(&record), Err(SessionError::Integrity));
    }

    #[test]
    fn reflected_record_is_rejected() {
        let (mut client, _) = pair(KeySize::Aes128);
        let record = seal(&mut client, b"echo");
        assert_eq!(client.open(&record), Err(SessionError::Integrity));
    }

    #[test]
    fn oversized_plaintext_consumes_no_sequence_number() {
        let (mut client, mut server) = pair(KeySize::Aes128);

        let too_big = vec![0xff; 600_000];
        assert!(matches!(client.seal(&too_big), Err(ProtocolError::PayloadTooLarge { .. })));
        assert_eq!(client.sent(), 0);

        let record = seal(&mut client, b"still in step");
        assert_eq!(server.open(&record).unwrap(), b"still in step");
    }

    #[test]
    fn debug_output_hides_keys() {
        let (client, _) = pair(KeySize::Aes128);
        let rendered = format!("{client:?}");
        assert!(rendered.contains("send_sequence"));
        assert!(!rendered.contains("mac_key"));
    }
}
