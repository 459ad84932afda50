//! 32-byte content hashes and the deterministic codec used to produce them.
//!
//! Every hash in the system is SHA-256 over the canonical JSON encoding of
//! the entity — never over a binary codec. The JSON shape is normative (see
//! [`crate::types`]): field order is fixed by declaration order, so a
//! `#[derive(Serialize)]` struct already produces byte-stable output without
//! a hand-rolled canonicalizer.

use std::fmt;

use serde::{Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};

use crate::error::HashDecodeError;

/// A 32-byte content hash, displayed and parsed as lower-case hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hash([u8; 32]);

impl Hash {
    /// The zero hash, used to mark "before genesis" and as a null parent.
    pub const ZERO: Hash = Hash([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// True if the first [`crate::constants::DIFFICULTY`] bytes are zero.
    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        self.0[..difficulty].iter().all(|b| *b == 0)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, HashDecodeError> {
        if s.len() != 64 {
            return Err(HashDecodeError::WrongLength(s.len()));
        }
        let bytes = hex::decode(s).map_err(|e| HashDecodeError::InvalidHex(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| HashDecodeError::InvalidHex("wrong byte length".to_string()))?;
        Ok(Hash(arr))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<String> for Hash {
    type Error = HashDecodeError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Hash::from_hex(&s)
    }
}

impl From<Hash> for String {
    fn from(h: Hash) -> Self {
        h.to_hex()
    }
}

/// Serialize `entity` to its canonical JSON bytes and return the SHA-256
/// hash of those bytes.
///
/// Panics only if `T`'s `Serialize` impl fails, which does not happen for
/// the plain-data types in this crate.
pub fn hash_of<T: Serialize>(entity: &T) -> Hash {
    let bytes = canonical_bytes(entity);
    let digest = Sha256::digest(&bytes);
    Hash(digest.into())
}

/// The canonical JSON byte representation of `entity`.
pub fn canonical_bytes<T: Serialize>(entity: &T) -> Vec<u8> {
    serde_json::to_vec(entity).expect("canonical types are always serializable")
}

/// Decode a value previously produced by [`canonical_bytes`].
pub fn from_canonical_bytes<T: DeserializeOwned>(bytes: &[u8]) -> serde_json::Result<T> {
    serde_json::from_slice(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_zero() {
        assert!(Hash::ZERO.is_zero());
    }

    #[test]
    fn nonzero_is_not_zero() {
        assert!(!Hash::from_bytes([1u8; 32]).is_zero());
    }

    #[test]
    fn hex_round_trip() {
        let h = Hash::from_bytes([7u8; 32]);
        assert_eq!(Hash::from_hex(&h.to_hex()).unwrap(), h);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        assert!(matches!(
            Hash::from_hex("abcd"),
            Err(HashDecodeError::WrongLength(4))
        ));
    }

    #[test]
    fn from_hex_rejects_invalid_hex() {
        let bad = "z".repeat(64);
        assert!(matches!(
            Hash::from_hex(&bad),
            Err(HashDecodeError::InvalidHex(_))
        ));
    }

    #[test]
    fn hash_of_is_deterministic() {
        let a = hash_of(&"same input");
        let b = hash_of(&"same input");
        assert_eq!(a, b);
    }

    #[test]
    fn hash_of_differs_for_different_input() {
        assert_ne!(hash_of(&"a"), hash_of(&"b"));
    }

    #[test]
    fn meets_difficulty_checks_leading_zero_bytes() {
        let mut bytes = [0xffu8; 32];
        bytes[0] = 0;
        bytes[1] = 0;
        let h = Hash::from_bytes(bytes);
        assert!(h.meets_difficulty(2));
        assert!(!h.meets_difficulty(3));
    }

    #[test]
    fn display_matches_to_hex() {
        let h = Hash::from_bytes([0xab; 32]);
        assert_eq!(h.to_string(), h.to_hex());
    }
}
