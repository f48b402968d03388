//! Content identity for graph vertices.
//!
//! Every vertex in a [`Graph`](crate::graph::Graph) is identified purely by
//! what it contains: a Value-vertex by its value, a Junction by its ordered
//! input edges. Identities are blake3 digests over a domain-separated
//! encoding, so structurally identical sub-graphs hash-cons to the same
//! record without any caller bookkeeping.
//!
//! # Encoding
//!
//! Each component writes a short tag followed by length-prefixed content.
//! Tags keep a name `"1"` distinct from the number `1`; length prefixes keep
//! `("ab", "c")` distinct from `("a", "bc")`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A 32-byte blake3 content identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentId(pub [u8; 32]);

impl ContentId {
    /// Returns the first eight hex digits, enough to tell ids apart in logs.
    pub fn short(&self) -> String {
        self.0[..4].iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl From<blake3::Hash> for ContentId {
    fn from(hash: blake3::Hash) -> Self {
        ContentId(*hash.as_bytes())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// Implemented by anything that has a content identity.
pub trait Identify {
    /// Feeds this value's canonical encoding into `hasher`.
    fn identify(&self, hasher: &mut blake3::Hasher);

    /// Computes the content identity of this value.
    fn content_id(&self) -> ContentId {
        let mut hasher = blake3::Hasher::new();
        self.identify(&mut hasher);
        hasher.finalize().into()
    }
}

/// Writes a tag and a length prefix. Shared by all `Identify` impls.
pub(crate) fn write_header(hasher: &mut blake3::Hasher, tag: &[u8], len: usize) {
    hasher.update(tag);
    hasher.update(&(len as u64).to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Raw(&'static [u8]);

    impl Identify for Raw {
        fn identify(&self, hasher: &mut blake3::Hasher) {
            write_header(hasher, b"raw", self.0.len());
            hasher.update(self.0);
        }
    }

    #[test]
    fn content_id_deterministic() {
        assert_eq!(Raw(b"abc").content_id(), Raw(b"abc").content_id());
    }

    #[test]
    fn content_id_differs_on_content() {
        assert_ne!(Raw(b"abc").content_id(), Raw(b"abd").content_id());
    }

    #[test]
    fn display_is_full_hex() {
        let id = Raw(b"abc").content_id();
        let hex = id.to_string();
        assert_eq!(hex.len(), 64);
        assert!(hex.starts_with(&id.short()));
        assert_eq!(id.short().len(), 8);
    }

    #[test]
    fn serde_roundtrip() {
        let id = Raw(b"xyz").content_id();
        let json = serde_json::to_string(&id).unwrap();
        let back: ContentId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
