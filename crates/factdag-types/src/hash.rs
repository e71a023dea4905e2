use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Content-addressed identifier of a DAG node.
///
/// A `Hash` is the digest of a node's serialized content. Identical content
/// always produces the same `Hash`, which makes nodes deduplicatable and
/// verifiable on every read. The digest itself is computed by
/// `factdag-crypto`; this type only carries the bytes.
#[derive(Clone, Copy, PartialEq, Eq, std::hash::Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash([u8; 32]);

impl Hash {
    /// Length of a hash in bytes.
    pub const LEN: usize = 32;

    /// Create a `Hash` from a pre-computed digest.
    pub const fn from_digest(digest: [u8; 32]) -> Self {
        Self(digest)
    }

    /// Create a `Hash` from a byte slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| TypeError::InvalidLength {
            expected: Self::LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.short_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Hash> for [u8; 32] {
    fn from(hash: Hash) -> Self {
        hash.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let hash = Hash::from_digest([0xab; 32]);
        let parsed = Hash::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(hash, parsed);
    }

    #[test]
    fn from_slice_rejects_wrong_length() {
        let err = Hash::from_slice(&[1, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 32,
                actual: 3
            }
        );
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(matches!(
            Hash::from_hex("not-hex"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn short_hex_is_8_chars() {
        let hash = Hash::from_digest([7; 32]);
        assert_eq!(hash.short_hex(), "07070707");
    }

    #[test]
    fn display_is_full_hex() {
        let hash = Hash::from_digest([1; 32]);
        let display = format!("{hash}");
        assert_eq!(display.len(), 64);
        assert_eq!(display, hash.to_hex());
    }

    #[test]
    fn equality_is_byte_equality() {
        let mut bytes = [0u8; 32];
        let a = Hash::from_digest(bytes);
        bytes[31] = 1;
        let b = Hash::from_digest(bytes);
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn serde_roundtrip() {
        let hash = Hash::from_digest([42; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        let parsed: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, parsed);
    }
}
