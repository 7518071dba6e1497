//! Hash and MAC primitives
//!
//! Thin wrappers over the RustCrypto `sha2` and `hmac` crates with fixed-size
//! outputs, so callers never have to deal with generic arrays.

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};

use crate::error::{Error, Result};

/// SHA-256 digest of `data`
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-512 digest of `data`
pub fn sha512(data: &[u8]) -> [u8; 64] {
    let mut hasher = Sha512::new();
    hasher.update(data);

    let mut digest = [0u8; 64];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// HMAC-SHA512 keyed with `key` over the concatenation of `parts`
pub fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> Result<[u8; 64]> {
    let mut hmac = <Hmac<Sha512> as KeyInit>::new_from_slice(key)
        .map_err(|_| Error::KeyDerivation("HMAC error".to_string()))?;

    for part in parts {
        hmac.update(part);
    }

    let mut mac = [0u8; 64];
    mac.copy_from_slice(&hmac.finalize().into_bytes());
    Ok(mac)
}
