//! Error types for the hdkeys library

use thiserror::Error;

/// Custom error type for key handling and derivation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid private key: not a valid secp256k1 private key")]
    InvalidPrivateKey,

    #[error("Invalid public key: not a valid secp256k1 public key")]
    InvalidPublicKey,

    #[error("Invalid signature: not a valid DER encoded ECDSA signature")]
    InvalidSignature,

    #[error("Unsupported derivation: {0}")]
    UnsupportedDerivation(String),

    #[error("Invalid index: {0}")]
    InvalidIndex(String),

    #[error("Invalid derivation path: {0}")]
    InvalidPath(String),

    #[error("Key derivation error: {0}")]
    KeyDerivation(String),
}

/// Result type for hdkeys operations
pub type Result<T> = std::result::Result<T, Error>;
