//! Cryptographic primitives and operations
//!
//! This module provides the hash and MAC capabilities, secp256k1 keys and
//! signatures, and SLIP-0010 key derivation.

pub mod hash;
pub mod keys;

pub use keys::*;
