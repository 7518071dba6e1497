//! SLIP-0010 hierarchical deterministic key derivation
//!
//! [SLIP-0010](https://github.com/satoshilabs/slips/blob/master/slip-0010.md)
//! generalizes BIP-32 to several curves. A seed produces a master node, and
//! every path index produces a child node from its parent. Each node is a
//! `(private key, chain code)` pair.
//!
//! Curve differences are handled by matching on [`Slip0010Curve`] at every
//! decision point:
//! * secp256k1 rejects candidate keys that are zero or not below the group
//!   order and retries with a fresh HMAC input
//! * ed25519 accepts every candidate, but only supports hardened indices

use std::fmt;

use ::secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::secp256k1::KeyPair;
use crate::crypto::hash::hmac_sha512;
use crate::error::{Error, Result};

/// HMAC key used for secp256k1 master key generation
pub const SECP256K1_SEED: &[u8] = b"Bitcoin seed";

/// HMAC key used for ed25519 master key generation
pub const ED25519_SEED: &[u8] = b"ed25519 seed";

/// Offset added to an index to mark it hardened
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Upper bound on master/child regeneration attempts.
///
/// A single retry happens with probability around 2^-128, so reaching this
/// bound means the implementation is broken.
pub const MAX_DERIVATION_ATTEMPTS: usize = 1000;

/// Curves supported by SLIP-0010 derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slip0010Curve {
    /// secp256k1, as used by Bitcoin and Ethereum
    Secp256k1,
    /// ed25519, hardened derivation only
    Ed25519,
}

impl Slip0010Curve {
    /// The personalization string used as the HMAC key for the master node
    pub fn seed_key(&self) -> &'static [u8] {
        match self {
            Self::Secp256k1 => SECP256K1_SEED,
            Self::Ed25519 => ED25519_SEED,
        }
    }
}

impl fmt::Display for Slip0010Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Secp256k1 => f.write_str("secp256k1"),
            Self::Ed25519 => f.write_str("ed25519"),
        }
    }
}

/// A 32-bit path segment; bit 31 set means hardened
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slip0010RawIndex(u32);

impl Slip0010RawIndex {
    /// A normal index, `index` must be below 2^31
    pub fn normal(index: u32) -> Result<Self> {
        if index >= HARDENED_OFFSET {
            return Err(Error::InvalidIndex(format!(
                "normal index {} must be below 2^31",
                index
            )));
        }
        Ok(Self(index))
    }

    /// A hardened index, stored as `index + 2^31`
    pub fn hardened(index: u32) -> Result<Self> {
        index
            .checked_add(HARDENED_OFFSET)
            .map(Self)
            .ok_or_else(|| {
                Error::InvalidIndex(format!("hardened index {} overflows 32 bits", index))
            })
    }

    /// Wrap an already encoded index
    pub fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// The encoded value, including the hardened bit
    pub fn value(&self) -> u32 {
        self.0
    }

    /// The index without the hardened bit
    pub fn index(&self) -> u32 {
        self.0 & !HARDENED_OFFSET
    }

    /// Whether bit 31 is set
    pub fn is_hardened(&self) -> bool {
        self.0 & HARDENED_OFFSET != 0
    }
}

impl fmt::Display for Slip0010RawIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_hardened() {
            write!(f, "{}'", self.index())
        } else {
            write!(f, "{}", self.index())
        }
    }
}

/// One node of the derivation tree
#[derive(Clone, PartialEq, Eq)]
pub struct Slip0010Result {
    /// Chain code used to derive children of this node
    pub chain_code: [u8; 32],
    /// Private key of this node, big-endian
    pub privkey: [u8; 32],
}

impl Slip0010Result {
    /// Split an HMAC-SHA512 output into `IL` (private key) and `IR` (chain code)
    fn from_hmac(i: &[u8; 64]) -> Self {
        let (privkey, chain_code) = split_hmac(i);
        Self {
            chain_code,
            privkey,
        }
    }

    /// Derive the child of this node at `index`
    pub fn child(&self, curve: Slip0010Curve, index: Slip0010RawIndex) -> Result<Self> {
        child(curve, &self.privkey, &self.chain_code, index)
    }

    /// Validate the private key of this node as a secp256k1 key pair
    pub fn to_secp256k1_key_pair(&self) -> Result<KeyPair> {
        super::secp256k1::make_keypair(&self.privkey)
    }
}

impl fmt::Debug for Slip0010Result {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slip0010Result")
            .field("chain_code", &hex::encode(self.chain_code))
            .field("privkey", &"<redacted>")
            .finish()
    }
}

fn split_hmac(i: &[u8; 64]) -> ([u8; 32], [u8; 32]) {
    let mut left = [0u8; 32];
    let mut right = [0u8; 32];
    left.copy_from_slice(&i[..32]);
    right.copy_from_slice(&i[32..]);
    (left, right)
}

/// Run `attempt` until it yields a value.
///
/// Panics after [`MAX_DERIVATION_ATTEMPTS`] attempts.
fn bounded_retry<T>(what: &str, mut attempt: impl FnMut() -> Result<Option<T>>) -> Result<T> {
    for attempts in 1..=MAX_DERIVATION_ATTEMPTS {
        if let Some(value) = attempt()? {
            return Ok(value);
        }
        warn!(attempts, "{} is out of range, retrying", what);
    }

    panic!(
        "{} did not converge after {} attempts",
        what, MAX_DERIVATION_ATTEMPTS
    );
}

/// Outcome of checking one secp256k1 HMAC output
#[derive(Debug, PartialEq, Eq)]
enum Attempt {
    /// The candidate is a valid node
    Accept(Slip0010Result),
    /// The candidate is out of range; retry with this HMAC output
    Retry([u8; 64]),
}

/// Check a secp256k1 master candidate `I`.
///
/// An `IL` of zero or not below the group order is rejected, and the next
/// candidate is `HMAC-SHA512(seed key, I)`.
fn secp256k1_master_attempt(i: &[u8; 64]) -> Result<Attempt> {
    if SecretKey::from_slice(&i[..32]).is_ok() {
        return Ok(Attempt::Accept(Slip0010Result::from_hmac(i)));
    }
    Ok(Attempt::Retry(hmac_sha512(SECP256K1_SEED, &[&i[..]])?))
}

/// Check a secp256k1 child candidate `I` for `parent`.
///
/// The child key is `IL + k mod n`. When `IL` is not below the group order or
/// the sum is zero, the next candidate is `HMAC-SHA512(c, 0x01 || IR || ser32(i))`.
fn secp256k1_child_attempt(
    parent: &SecretKey,
    chain_code: &[u8; 32],
    ser_index: &[u8; 4],
    i: &[u8; 64],
) -> Result<Attempt> {
    let (il, ir) = split_hmac(i);
    // IL >= n fails the scalar conversion, a zero sum fails the tweak
    let child_key = Scalar::from_be_bytes(il)
        .ok()
        .and_then(|tweak| parent.add_tweak(&tweak).ok());

    match child_key {
        Some(key) => Ok(Attempt::Accept(Slip0010Result {
            chain_code: ir,
            privkey: key.secret_bytes(),
        })),
        None => Ok(Attempt::Retry(hmac_sha512(
            chain_code,
            &[&[0x01][..], &ir[..], &ser_index[..]],
        )?)),
    }
}

/// Feed `attempt` successive candidates starting from `i` until one is accepted
fn retry_secp256k1(
    what: &str,
    mut i: [u8; 64],
    mut attempt: impl FnMut(&[u8; 64]) -> Result<Attempt>,
) -> Result<Slip0010Result> {
    bounded_retry(what, || match attempt(&i)? {
        Attempt::Accept(node) => Ok(Some(node)),
        Attempt::Retry(next) => {
            i = next;
            Ok(None)
        }
    })
}

/// Derive the master node for `curve` from `seed`
pub fn master(curve: Slip0010Curve, seed: &[u8]) -> Result<Slip0010Result> {
    debug!(%curve, seed_len = seed.len(), "Deriving master key");

    let i = hmac_sha512(curve.seed_key(), &[seed])?;

    match curve {
        Slip0010Curve::Ed25519 => Ok(Slip0010Result::from_hmac(&i)),
        Slip0010Curve::Secp256k1 => retry_secp256k1("master key", i, secp256k1_master_attempt),
    }
}

/// Derive the child at `index` from a parent private key and chain code
pub fn child(
    curve: Slip0010Curve,
    parent_privkey: &[u8; 32],
    parent_chain_code: &[u8; 32],
    index: Slip0010RawIndex,
) -> Result<Slip0010Result> {
    trace!(%curve, %index, "Deriving child key");

    let ser_index = index.value().to_be_bytes();

    match curve {
        Slip0010Curve::Ed25519 => {
            if !index.is_hardened() {
                return Err(Error::UnsupportedDerivation(
                    "Normal keys are not allowed with ed25519".to_string(),
                ));
            }
            let i = hmac_sha512(
                parent_chain_code,
                &[&[0x00][..], &parent_privkey[..], &ser_index[..]],
            )?;
            Ok(Slip0010Result::from_hmac(&i))
        }
        Slip0010Curve::Secp256k1 => {
            let parent = SecretKey::from_slice(parent_privkey)
                .map_err(|_| Error::InvalidPrivateKey)?;

            let i = if index.is_hardened() {
                hmac_sha512(
                    parent_chain_code,
                    &[&[0x00][..], &parent_privkey[..], &ser_index[..]],
                )?
            } else {
                let secp = Secp256k1::signing_only();
                let point = PublicKey::from_secret_key(&secp, &parent).serialize();
                hmac_sha512(parent_chain_code, &[&point[..], &ser_index[..]])?
            };

            retry_secp256k1("child key", i, |i| {
                secp256k1_child_attempt(&parent, parent_chain_code, &ser_index, i)
            })
        }
    }
}

/// Derive the node at `path` below the master node of `seed`
///
/// Indices are applied from root to leaf. An empty path returns the master node.
pub fn derive_path(
    curve: Slip0010Curve,
    seed: &[u8],
    path: &[Slip0010RawIndex],
) -> Result<Slip0010Result> {
    path.iter()
        .try_fold(master(curve, seed)?, |node, &index| node.child(curve, index))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = "000102030405060708090a0b0c0d0e0f";

    fn seed() -> Vec<u8> {
        hex::decode(SEED).unwrap()
    }

    #[test]
    fn test_hardened_index_encoding() {
        let index = Slip0010RawIndex::hardened(0).unwrap();
        assert!(index.is_hardened());
        assert_eq!(index.value(), 1 << 31);
        assert_eq!(index.index(), 0);

        let index = Slip0010RawIndex::normal(5).unwrap();
        assert!(!index.is_hardened());
        assert_eq!(index.value(), 5);
    }

    #[test]
    fn test_index_bounds() {
        assert!(Slip0010RawIndex::normal(HARDENED_OFFSET - 1).is_ok());
        assert!(matches!(
            Slip0010RawIndex::normal(HARDENED_OFFSET),
            Err(Error::InvalidIndex(_))
        ));

        let max = Slip0010RawIndex::hardened(HARDENED_OFFSET - 1).unwrap();
        assert_eq!(max.value(), u32::MAX);
        assert!(matches!(
            Slip0010RawIndex::hardened(HARDENED_OFFSET),
            Err(Error::InvalidIndex(_))
        ));
    }

    #[test]
    fn test_index_display() {
        assert_eq!(Slip0010RawIndex::hardened(44).unwrap().to_string(), "44'");
        assert_eq!(Slip0010RawIndex::normal(7).unwrap().to_string(), "7");
    }

    #[test]
    fn test_seed_keys() {
        assert_eq!(Slip0010Curve::Secp256k1.seed_key(), b"Bitcoin seed");
        assert_eq!(Slip0010Curve::Ed25519.seed_key(), b"ed25519 seed");
    }

    #[test]
    fn test_secp256k1_master() {
        let node = master(Slip0010Curve::Secp256k1, &seed()).unwrap();
        assert_eq!(
            hex::encode(node.chain_code),
            "873dff81c02f525623fd1fe5167eac3a55a049de3d314bb42ee227ffed37d508"
        );
        assert_eq!(
            hex::encode(node.privkey),
            "e8f32e723decf4051aefac8e2c93c9c5b214313817cdb01a1494b917c8436b35"
        );
    }

    #[test]
    fn test_ed25519_master() {
        let node = master(Slip0010Curve::Ed25519, &seed()).unwrap();
        assert_eq!(
            hex::encode(node.chain_code),
            "90046a93de5380a72b5e45010748567d5ea02bbf6522f979e05c0d8d8ca9fffb"
        );
        assert_eq!(
            hex::encode(node.privkey),
            "2b4be7f19ee27bbf30c667b642d5f4aa69fd169872f8fc3059c08ebae2eb19e7"
        );
    }

    #[test]
    fn test_ed25519_rejects_normal_index() {
        let node = master(Slip0010Curve::Ed25519, &seed()).unwrap();
        let err = node
            .child(Slip0010Curve::Ed25519, Slip0010RawIndex::normal(0).unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            Error::UnsupportedDerivation("Normal keys are not allowed with ed25519".to_string())
        );
    }

    #[test]
    fn test_secp256k1_child_rejects_invalid_parent() {
        let result = child(
            Slip0010Curve::Secp256k1,
            &[0u8; 32],
            &[0u8; 32],
            Slip0010RawIndex::hardened(0).unwrap(),
        );
        assert_eq!(result, Err(Error::InvalidPrivateKey));
    }

    #[test]
    fn test_empty_path_is_master() {
        let seed = seed();
        for curve in [Slip0010Curve::Secp256k1, Slip0010Curve::Ed25519] {
            assert_eq!(
                derive_path(curve, &seed, &[]).unwrap(),
                master(curve, &seed).unwrap()
            );
        }
    }

    #[test]
    fn test_bounded_retry_converges() {
        let mut calls = 0;
        let value = bounded_retry("test value", || {
            calls += 1;
            Ok((calls == 3).then_some(calls))
        })
        .unwrap();
        assert_eq!(value, 3);
    }

    #[test]
    fn test_bounded_retry_propagates_errors() {
        let result: Result<()> =
            bounded_retry("test value", || Err(Error::KeyDerivation("boom".to_string())));
        assert_eq!(result, Err(Error::KeyDerivation("boom".to_string())));
    }

    #[test]
    #[should_panic(expected = "did not converge after 1000 attempts")]
    fn test_bounded_retry_panics_at_cap() {
        let _: Result<()> = bounded_retry("test value", || Ok(None));
    }

    #[test]
    fn test_index_from_raw() {
        assert_eq!(
            Slip0010RawIndex::from_raw(0x8000_0005),
            Slip0010RawIndex::hardened(5).unwrap()
        );
        assert_eq!(
            Slip0010RawIndex::from_raw(5),
            Slip0010RawIndex::normal(5).unwrap()
        );
        assert_eq!(Slip0010RawIndex::from_raw(u32::MAX).to_string(), "2147483647'");
    }

    const ORDER: &str = "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141";
    const ORDER_MINUS_ONE: &str =
        "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364140";

    fn bytes32(hex_str: &str) -> [u8; 32] {
        hex::decode(hex_str).unwrap().try_into().unwrap()
    }

    fn candidate(il: [u8; 32], ir: [u8; 32]) -> [u8; 64] {
        let mut i = [0u8; 64];
        i[..32].copy_from_slice(&il);
        i[32..].copy_from_slice(&ir);
        i
    }

    #[test]
    fn test_secp256k1_master_rehashes_out_of_range_candidate() {
        for il in [[0u8; 32], bytes32(ORDER), [0xff; 32]] {
            let i = candidate(il, [0x42; 32]);
            let next = hmac_sha512(b"Bitcoin seed", &[&i[..]]).unwrap();
            assert_eq!(secp256k1_master_attempt(&i).unwrap(), Attempt::Retry(next));
        }
    }

    #[test]
    fn test_secp256k1_master_accepts_largest_key() {
        let i = candidate(bytes32(ORDER_MINUS_ONE), [0x42; 32]);
        assert_eq!(
            secp256k1_master_attempt(&i).unwrap(),
            Attempt::Accept(Slip0010Result {
                chain_code: [0x42; 32],
                privkey: bytes32(ORDER_MINUS_ONE),
            })
        );
    }

    #[test]
    fn test_secp256k1_child_rehashes_out_of_range_candidate() {
        let mut one = [0u8; 32];
        one[31] = 1;
        let parent = SecretKey::from_slice(&one).unwrap();
        let chain_code = [0x11; 32];
        let ser_index = Slip0010RawIndex::hardened(0).unwrap().value().to_be_bytes();
        let ir = [0x42; 32];

        // IL = n and IL = 2^256 - 1 are not below the order, IL = n - 1 sums to zero
        for il in [bytes32(ORDER), [0xff; 32], bytes32(ORDER_MINUS_ONE)] {
            let i = candidate(il, ir);
            let next =
                hmac_sha512(&chain_code, &[&[0x01][..], &ir[..], &ser_index[..]]).unwrap();
            assert_eq!(
                secp256k1_child_attempt(&parent, &chain_code, &ser_index, &i).unwrap(),
                Attempt::Retry(next)
            );
        }
    }

    #[test]
    fn test_secp256k1_child_adds_tweak_to_parent() {
        let mut one = [0u8; 32];
        one[31] = 1;
        let parent = SecretKey::from_slice(&one).unwrap();
        let ser_index = 7u32.to_be_bytes();

        let i = candidate(one, [0x42; 32]);
        let mut two = [0u8; 32];
        two[31] = 2;
        assert_eq!(
            secp256k1_child_attempt(&parent, &[0x11; 32], &ser_index, &i).unwrap(),
            Attempt::Accept(Slip0010Result {
                chain_code: [0x42; 32],
                privkey: two,
            })
        );
    }

    #[test]
    fn test_retry_feeds_next_candidate() {
        let first = [0x01; 64];
        let second = [0x02; 64];
        let mut seen = Vec::new();

        let node = retry_secp256k1("test key", first, |i| {
            seen.push(*i);
            if *i == first {
                Ok(Attempt::Retry(second))
            } else {
                Ok(Attempt::Accept(Slip0010Result::from_hmac(i)))
            }
        })
        .unwrap();

        assert_eq!(seen, vec![first, second]);
        assert_eq!(node, Slip0010Result::from_hmac(&second));
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let node = master(Slip0010Curve::Secp256k1, &seed()).unwrap();
        let debug = format!("{:?}", node);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains(&hex::encode(node.privkey)));
    }

    #[test]
    fn test_curve_serde() {
        assert_eq!(
            serde_json::to_string(&Slip0010Curve::Secp256k1).unwrap(),
            "\"secp256k1\""
        );
        let curve: Slip0010Curve = serde_json::from_str("\"ed25519\"").unwrap();
        assert_eq!(curve, Slip0010Curve::Ed25519);
        assert_eq!(
            serde_json::to_string(&Slip0010RawIndex::hardened(1).unwrap()).unwrap(),
            "2147483649"
        );
    }
}
