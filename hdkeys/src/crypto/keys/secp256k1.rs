//! secp256k1 keys and signatures
//!
//! Curve arithmetic, RFC 6979 nonces and DER handling come from libsecp256k1
//! through the `secp256k1` crate. This module adds strict key validation and
//! the canonical low-S signature convention on top of it.

use std::fmt;

use ::secp256k1::{ecdsa, Message, Secp256k1, SecretKey};
use tracing::debug;

use super::derivation::{derive_path, Slip0010Curve};
use super::path::DerivationPath;
use crate::crypto::hash::sha256;
use crate::error::{Error, Result};

/// A private key in `[1, n - 1]`
#[derive(Clone, Copy)]
pub struct PrivateKey(SecretKey);

impl PrivateKey {
    /// Validate 32 big-endian bytes as a private key
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        SecretKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| Error::InvalidPrivateKey)
    }

    /// Get the raw private key bytes
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.secret_bytes()
    }

    /// Compute the matching public key
    pub fn public_key(&self) -> PublicKey {
        let secp = Secp256k1::signing_only();
        PublicKey(::secp256k1::PublicKey::from_secret_key(&secp, &self.0))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// A secp256k1 public key
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(::secp256k1::PublicKey);

impl PublicKey {
    /// Parse a SEC1 encoded point, compressed (33 bytes) or uncompressed (65 bytes)
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        ::secp256k1::PublicKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| Error::InvalidPublicKey)
    }

    /// Compressed SEC1 encoding
    pub fn serialize(&self) -> [u8; 33] {
        self.0.serialize()
    }

    /// Uncompressed SEC1 encoding
    pub fn serialize_uncompressed(&self) -> [u8; 65] {
        self.0.serialize_uncompressed()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.serialize()))
    }
}

/// A private key together with its public key
#[derive(Debug, Clone, Copy)]
pub struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Get the private key
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Get the public key
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

/// A DER encoded ECDSA signature, always in low-S form
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    inner: ecdsa::Signature,
    der: Vec<u8>,
}

impl Signature {
    fn from_inner(mut inner: ecdsa::Signature) -> Self {
        inner.normalize_s();
        let der = inner.serialize_der().to_vec();
        Self { inner, der }
    }

    /// Parse a strict DER signature, normalizing S if needed
    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        ecdsa::Signature::from_der(bytes)
            .map(Self::from_inner)
            .map_err(|_| Error::InvalidSignature)
    }

    /// The DER encoding
    pub fn as_bytes(&self) -> &[u8] {
        &self.der
    }

    /// An owned copy of the DER encoding
    pub fn to_vec(&self) -> Vec<u8> {
        self.der.clone()
    }

    /// 64-byte `R || S` encoding
    pub fn to_compact(&self) -> [u8; 64] {
        self.inner.serialize_compact()
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.der
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(&self.der))
    }
}

/// Validate `privkey` and pair it with its public key
pub fn make_keypair(privkey: &[u8]) -> Result<KeyPair> {
    let private_key = PrivateKey::from_slice(privkey)?;
    let public_key = private_key.public_key();
    Ok(KeyPair {
        private_key,
        public_key,
    })
}

fn message_digest(message: &[u8]) -> Message {
    Message::from_digest(sha256(message))
}

/// Sign the SHA-256 digest of `message` with an RFC 6979 nonce
///
/// The same inputs always produce the same bytes.
pub fn create_signature(message: &[u8], privkey: &PrivateKey) -> Signature {
    let secp = Secp256k1::signing_only();
    let signature = secp.sign_ecdsa(&message_digest(message), &privkey.0);
    Signature::from_inner(signature)
}

/// Check a DER signature over `message` against `pubkey`
///
/// High-S signatures are accepted. Unparseable DER is reported as `false`.
pub fn verify_signature(signature: &[u8], message: &[u8], pubkey: &PublicKey) -> bool {
    let mut signature = match ecdsa::Signature::from_der(signature) {
        Ok(signature) => signature,
        Err(e) => {
            debug!("Rejecting malformed DER signature: {}", e);
            return false;
        }
    };
    signature.normalize_s();

    let secp = Secp256k1::verification_only();
    secp.verify_ecdsa(&message_digest(message), &signature, &pubkey.0)
        .is_ok()
}

/// Derive a secp256k1 key pair from a seed and derivation path
pub fn derive_secp256k1_key_pair(seed: &[u8], path: &str) -> Result<KeyPair> {
    let path: DerivationPath = path.parse()?;
    derive_path(Slip0010Curve::Secp256k1, seed, path.as_ref())?.to_secp256k1_key_pair()
}
