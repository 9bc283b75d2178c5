use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use thiserror::Error;

/// Length of a rendered identity hash in hex characters.
pub const IDENTITY_HEX_LEN: usize = 128;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("expected 128 hex characters, got {0}")]
    InvalidLength(usize),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

/// A SHA-512 digest identifying a client by network address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityHash([u8; 64]);

impl IdentityHash {
    /// Parse a hex-encoded identity hash. Either letter case is accepted.
    pub fn from_hex(s: &str) -> Result<Self, IdentityError> {
        if s.len() != IDENTITY_HEX_LEN {
            return Err(IdentityError::InvalidLength(s.len()));
        }

        let bytes = hex::decode(s).map_err(|e| IdentityError::InvalidHex(e.to_string()))?;
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| IdentityError::InvalidHex("decoded to wrong length".into()))?;

        Ok(Self(arr))
    }

    /// Return the hash as a 128-character lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl fmt::Debug for IdentityHash {
    // Only a prefix: enough to correlate log lines.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityHash({}..)", hex::encode(&self.0[..6]))
    }
}

impl fmt::Display for IdentityHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for IdentityHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for IdentityHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Derives pseudonymous identities from client addresses.
///
/// The digest is `SHA-512(address || pepper)`. There is no per-call salt, so the
/// same address and pepper always produce the same identity.
#[derive(Clone)]
pub struct IdentityHasher {
    pepper: String,
}

impl IdentityHasher {
    pub fn new(pepper: impl Into<String>) -> Self {
        Self {
            pepper: pepper.into(),
        }
    }

    pub fn hash(&self, address: &str) -> IdentityHash {
        let mut hasher = Sha512::new();
        hasher.update(address.as_bytes());
        hasher.update(self.pepper.as_bytes());

        let mut digest = [0u8; 64];
        digest.copy_from_slice(&hasher.finalize());
        IdentityHash(digest)
    }
}

impl fmt::Debug for IdentityHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityHasher")
            .field("pepper", &"<redacted>")
            .finish()
    }
}
