//! Handshake drivers for the two pairing roles.
//!
//! `tether-crypto` provides the symmetric handshake state; this module
//! supplies the message flow on top of it — who sends which ephemeral,
//! which Diffie-Hellman results get mixed, in what order. The flow is
//! the known-initiator-static one used by the hybrid transport
//! (`KNpsk0`, wire mode 3): the responder learned the initiator's
//! static public key out of band (QR code), and both sides mixed the
//! QR-derived pre-shared key before any ephemeral material.
//!
//! Each driver is a single-owner handle consumed by its final step;
//! there is no way to rerun a message against the same state. A failed
//! handshake is abandoned wholesale and the pairing attempt restarts
//! from discovery.

use crate::error::PairingError;
use rand_core::{CryptoRng, RngCore};
use tether_crypto::ec::EcKeyPair;
use tether_crypto::noise::{HandshakePattern, HandshakeState};
use tether_crypto::transport::SessionTransport;
use tether_crypto::{AEAD_TAG_SIZE, P256_PUBLIC_KEY_SIZE};

/// Wire size of each handshake message: an uncompressed P-256 point
/// followed by the AEAD tag of an empty payload.
pub const HELLO_SIZE: usize = P256_PUBLIC_KEY_SIZE + AEAD_TAG_SIZE;

/// Initiator-side handshake, between hello sent and reply received.
pub struct InitiatorHandshake {
    state: HandshakeState,
    ephemeral: EcKeyPair,
    static_keys: EcKeyPair,
}

impl InitiatorHandshake {
    /// Start a handshake: returns the driver and the hello message to
    /// send (ephemeral public key followed by an empty-payload AEAD
    /// ciphertext).
    ///
    /// `psk` is mixed only for `*psk0` patterns.
    ///
    /// # Errors
    ///
    /// Propagates AEAD failures from the handshake state.
    pub fn start<R: RngCore + CryptoRng>(
        pattern: HandshakePattern,
        static_keys: EcKeyPair,
        psk: &[u8],
        rng: &mut R,
    ) -> Result<(Self, Vec<u8>), PairingError> {
        let mut state = HandshakeState::new(pattern);
        state.mix_hash(&[1]);
        state.mix_hash(static_keys.public_key());
        if pattern.uses_psk() {
            state.mix_key_and_hash(psk);
        }

        let ephemeral = EcKeyPair::generate(rng);
        state.mix_hash(ephemeral.public_key());
        state.mix_key(ephemeral.public_key());

        let ciphertext = state.encrypt_and_hash(&[])?;

        let mut hello = Vec::with_capacity(HELLO_SIZE);
        hello.extend_from_slice(ephemeral.public_key());
        hello.extend_from_slice(&ciphertext);
        tracing::debug!(pattern = pattern.protocol_name(), "hello sent");

        Ok((
            Self {
                state,
                ephemeral,
                static_keys,
            },
            hello,
        ))
    }

    /// Process the responder's reply and derive the session transport.
    ///
    /// Decrypting the reply's trailing ciphertext authenticates the
    /// responder; failure is fatal and the attempt restarts from
    /// discovery.
    ///
    /// # Errors
    ///
    /// [`PairingError::TruncatedHandshake`] for short replies, crypto
    /// errors for invalid points or AEAD authentication failure.
    pub fn finish(mut self, reply: &[u8]) -> Result<SessionTransport, PairingError> {
        if reply.len() < HELLO_SIZE {
            return Err(PairingError::TruncatedHandshake(reply.len()));
        }
        let (peer_ephemeral, ciphertext) = reply.split_at(P256_PUBLIC_KEY_SIZE);

        self.state.mix_hash(peer_ephemeral);
        self.state.mix_key(peer_ephemeral);
        self.state
            .mix_key(&self.ephemeral.diffie_hellman(peer_ephemeral)?);
        self.state
            .mix_key(&self.static_keys.diffie_hellman(peer_ephemeral)?);

        let payload = self.state.decrypt_and_hash(ciphertext)?;
        if !payload.is_empty() {
            tracing::warn!(len = payload.len(), "reply carried unexpected payload");
        }

        let (write_key, read_key) = self.state.split_session_keys();
        tracing::debug!("handshake complete");
        Ok(SessionTransport::new(read_key, write_key))
    }
}

/// Responder-side handshake, constructed before the initiator's hello
/// arrives.
pub struct ResponderHandshake {
    state: HandshakeState,
    peer_static: [u8; P256_PUBLIC_KEY_SIZE],
}

impl ResponderHandshake {
    /// Prepare the responder state from the out-of-band material: the
    /// initiator's static public key and, for `*psk0` patterns, the
    /// pre-shared key.
    #[must_use]
    pub fn new(
        pattern: HandshakePattern,
        peer_static: &[u8; P256_PUBLIC_KEY_SIZE],
        psk: &[u8],
    ) -> Self {
        let mut state = HandshakeState::new(pattern);
        state.mix_hash(&[1]);
        state.mix_hash(peer_static);
        if pattern.uses_psk() {
            state.mix_key_and_hash(psk);
        }
        Self {
            state,
            peer_static: *peer_static,
        }
    }

    /// Process the initiator's hello and produce the reply plus the
    /// session transport.
    ///
    /// Decrypting the hello's trailing ciphertext is the pre-shared-key
    /// check: an initiator without the QR secret fails here.
    ///
    /// # Errors
    ///
    /// [`PairingError::TruncatedHandshake`] for short hellos, crypto
    /// errors for invalid points or AEAD authentication failure.
    pub fn respond<R: RngCore + CryptoRng>(
        mut self,
        hello: &[u8],
        rng: &mut R,
    ) -> Result<(Vec<u8>, SessionTransport), PairingError> {
        if hello.len() < HELLO_SIZE {
            return Err(PairingError::TruncatedHandshake(hello.len()));
        }
        let (peer_ephemeral, ciphertext) = hello.split_at(P256_PUBLIC_KEY_SIZE);

        self.state.mix_hash(peer_ephemeral);
        self.state.mix_key(peer_ephemeral);
        let payload = self.state.decrypt_and_hash(ciphertext)?;
        if !payload.is_empty() {
            tracing::warn!(len = payload.len(), "hello carried unexpected payload");
        }

        let ephemeral = EcKeyPair::generate(rng);
        self.state.mix_hash(ephemeral.public_key());
        self.state.mix_key(ephemeral.public_key());
        self.state
            .mix_key(&ephemeral.diffie_hellman(peer_ephemeral)?);
        self.state
            .mix_key(&ephemeral.diffie_hellman(&self.peer_static)?);

        let reply_ciphertext = self.state.encrypt_and_hash(&[])?;
        let mut reply = Vec::with_capacity(HELLO_SIZE);
        reply.extend_from_slice(ephemeral.public_key());
        reply.extend_from_slice(&reply_ciphertext);

        let (read_key, write_key) = self.state.split_session_keys();
        tracing::debug!("handshake complete, reply ready");
        Ok((reply, SessionTransport::new(read_key, write_key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;

    fn run_handshake(psk_a: &[u8], psk_b: &[u8]) -> Result<(SessionTransport, SessionTransport), PairingError> {
        let initiator_static = EcKeyPair::generate(&mut OsRng);
        let responder = ResponderHandshake::new(
            HandshakePattern::KnPsk0,
            initiator_static.public_key(),
            psk_b,
        );

        let (initiator, hello) = InitiatorHandshake::start(
            HandshakePattern::KnPsk0,
            initiator_static,
            psk_a,
            &mut OsRng,
        )?;
        assert_eq!(hello.len(), HELLO_SIZE);

        let (reply, responder_transport) = responder.respond(&hello, &mut OsRng)?;
        assert_eq!(reply.len(), HELLO_SIZE);
        let initiator_transport = initiator.finish(&reply)?;
        Ok((initiator_transport, responder_transport))
    }

    #[test]
    fn test_end_to_end_session() {
        let psk = [0x5a; 32];
        let (mut initiator, mut responder) = run_handshake(&psk, &psk).unwrap();

        let ct = initiator.encrypt(b"ping").unwrap();
        assert_eq!(responder.decrypt(&ct).unwrap(), b"ping");

        let ct = responder.encrypt(b"pong").unwrap();
        assert_eq!(initiator.decrypt(&ct).unwrap(), b"pong");
    }

    #[test]
    fn test_wrong_psk_fails_at_responder() {
        let err = run_handshake(&[1u8; 32], &[2u8; 32]).unwrap_err();
        assert!(matches!(err, PairingError::Crypto(_)));
    }

    #[test]
    fn test_short_messages_rejected() {
        let static_keys = EcKeyPair::generate(&mut OsRng);
        let responder =
            ResponderHandshake::new(HandshakePattern::KnPsk0, static_keys.public_key(), &[0; 32]);
        assert!(matches!(
            responder.respond(&[0u8; 80], &mut OsRng),
            Err(PairingError::TruncatedHandshake(80))
        ));

        let (initiator, _) = InitiatorHandshake::start(
            HandshakePattern::KnPsk0,
            EcKeyPair::generate(&mut OsRng),
            &[0; 32],
            &mut OsRng,
        )
        .unwrap();
        assert!(matches!(
            initiator.finish(&[]),
            Err(PairingError::TruncatedHandshake(0))
        ));
    }

    #[test]
    fn test_tampered_reply_is_fatal() {
        let static_keys = EcKeyPair::generate(&mut OsRng);
        let responder =
            ResponderHandshake::new(HandshakePattern::KnPsk0, static_keys.public_key(), &[7; 32]);
        let (initiator, hello) =
            InitiatorHandshake::start(HandshakePattern::KnPsk0, static_keys, &[7; 32], &mut OsRng)
                .unwrap();

        let (mut reply, _) = responder.respond(&hello, &mut OsRng).unwrap();
        let last = reply.len() - 1;
        reply[last] ^= 0x01;
        assert!(initiator.finish(&reply).is_err());
    }

    #[test]
    fn test_ephemerals_give_fresh_keys() {
        // Same PSK and same static key, two runs: the session keys must
        // differ because each run draws fresh ephemerals
        let psk = [9u8; 32];
        let (mut a1, _) = run_handshake(&psk, &psk).unwrap();
        let (mut a2, _) = run_handshake(&psk, &psk).unwrap();

        let c1 = a1.encrypt(b"same plaintext").unwrap();
        let c2 = a2.encrypt(b"same plaintext").unwrap();
        assert_ne!(c1, c2);
    }
}
