//! Ed25519 key pairs from SLIP-0010 nodes

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use super::derivation::{derive_path, Slip0010Curve, Slip0010Result};
use super::path::DerivationPath;
use crate::error::Result;

/// An ed25519 signing key and its verifying key
#[derive(Debug, Clone)]
pub struct Ed25519KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl Ed25519KeyPair {
    /// Use 32 bytes as an ed25519 secret key
    pub fn from_bytes(secret_key: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(secret_key);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// The secret half of the key pair
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// The public half of the key pair
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Sign `message` (ed25519 signatures are deterministic)
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Check `signature` over `message`
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.verifying_key.verify(message, signature).is_ok()
    }
}

impl Slip0010Result {
    /// Use the private key of this node as an ed25519 secret key
    pub fn to_ed25519_key_pair(&self) -> Ed25519KeyPair {
        Ed25519KeyPair::from_bytes(&self.privkey)
    }
}

/// Derive an ed25519 key pair from a seed and derivation path
///
/// Every path component must be hardened.
pub fn derive_ed25519_key_pair(seed: &[u8], path: &str) -> Result<Ed25519KeyPair> {
    let path: DerivationPath = path.parse()?;
    Ok(derive_path(Slip0010Curve::Ed25519, seed, path.as_ref())?.to_ed25519_key_pair())
}
