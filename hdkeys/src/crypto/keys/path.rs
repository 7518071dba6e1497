//! Textual derivation paths

use std::fmt;
use std::str::FromStr;

use super::derivation::Slip0010RawIndex;
use crate::error::{Error, Result};

/// An ordered list of indices from the master node down to a leaf
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DerivationPath(Vec<Slip0010RawIndex>);

impl DerivationPath {
    /// The empty path, addressing the master node
    pub fn master() -> Self {
        Self::default()
    }

    /// Extend the path by one index
    pub fn child(&self, index: Slip0010RawIndex) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Iterate over the indices from root to leaf
    pub fn iter(&self) -> std::slice::Iter<'_, Slip0010RawIndex> {
        self.0.iter()
    }

    /// Number of indices below the master node
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this path addresses the master node
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[Slip0010RawIndex]> for DerivationPath {
    fn as_ref(&self) -> &[Slip0010RawIndex] {
        &self.0
    }
}

impl From<Vec<Slip0010RawIndex>> for DerivationPath {
    fn from(indices: Vec<Slip0010RawIndex>) -> Self {
        Self(indices)
    }
}

impl FromIterator<Slip0010RawIndex> for DerivationPath {
    fn from_iter<I: IntoIterator<Item = Slip0010RawIndex>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DerivationPath {
    type Item = &'a Slip0010RawIndex;
    type IntoIter = std::slice::Iter<'a, Slip0010RawIndex>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Parses `m/44'/0'/0'/0/0`; `'`, `h` and `H` all mark a hardened index
impl FromStr for DerivationPath {
    type Err = Error;

    fn from_str(path: &str) -> Result<Self> {
        let rest = path
            .strip_prefix('m')
            .ok_or_else(|| Error::InvalidPath(format!("Invalid derivation path: {}", path)))?;

        if rest.is_empty() {
            return Ok(Self::master());
        }

        let rest = rest
            .strip_prefix('/')
            .ok_or_else(|| Error::InvalidPath(format!("Invalid derivation path: {}", path)))?;

        rest.split('/').map(parse_component).collect()
    }
}

fn parse_component(component: &str) -> Result<Slip0010RawIndex> {
    let invalid =
        || Error::InvalidPath(format!("Invalid derivation path component: {}", component));

    let (digits, hardened) = match component.strip_suffix(['\'', 'h', 'H']) {
        Some(digits) => (digits, true),
        None => (component, false),
    };

    // u32::from_str accepts a leading '+'
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let index = digits.parse::<u32>().map_err(|_| invalid())?;

    if hardened {
        Slip0010RawIndex::hardened(index)
    } else {
        Slip0010RawIndex::normal(index)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for index in &self.0 {
            write!(f, "/{}", index)?;
        }
        Ok(())
    }
}
