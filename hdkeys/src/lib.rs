//! hdkeys - secp256k1 signing and SLIP-0010 key derivation
//!
//! This library provides the key material layer used by the wallet and RPC
//! clients: strict secp256k1 private key validation, deterministic low-S ECDSA
//! signatures, and SLIP-0010 hierarchical deterministic derivation for the
//! secp256k1 and ed25519 curves.
//!
//! ```
//! use hdkeys::crypto::keys::{derive_path, DerivationPath, Slip0010Curve};
//!
//! let seed = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
//! let path: DerivationPath = "m/0'".parse().unwrap();
//! let node = derive_path(Slip0010Curve::Secp256k1, &seed, path.as_ref()).unwrap();
//!
//! let key_pair = node.to_secp256k1_key_pair().unwrap();
//! let signature = hdkeys::crypto::keys::create_signature(b"hello", key_pair.private_key());
//! assert!(hdkeys::crypto::keys::verify_signature(
//!     signature.as_bytes(),
//!     b"hello",
//!     key_pair.public_key(),
//! ));
//! ```

pub mod error;
pub mod crypto;

// Re-export commonly used types for convenience
pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
