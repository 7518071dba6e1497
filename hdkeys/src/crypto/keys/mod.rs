//! Key derivation and management
//!
//! This module provides functionality for validating, deriving and using keys
//! on the curves supported by SLIP-0010.

pub mod secp256k1;
#[cfg(feature = "ed25519")]
pub mod ed25519;
mod derivation;
mod path;

pub use self::secp256k1::{
    create_signature, derive_secp256k1_key_pair, make_keypair, verify_signature, KeyPair,
    PrivateKey, PublicKey, Signature,
};
#[cfg(feature = "ed25519")]
pub use self::ed25519::{derive_ed25519_key_pair, Ed25519KeyPair};
pub use derivation::*;
pub use path::*;
