//! Fingerprint: identity + content signature, the unit of change detection
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, comparable content signature.
///
/// Either a host-supplied revision token or a `blake3:` digest of content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Signature(String);

impl Signature {
    /// Wrap a revision token supplied by the host.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Digest raw bytes.
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(format!("blake3:{}", blake3::hash(data)))
    }

    pub fn of_str(text: &str) -> Self {
        Self::of_bytes(text.as_bytes())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Two fingerprints are equal iff identity and signature are both equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    identity: String,
    signature: Signature,
}

impl Fingerprint {
    pub fn new(identity: impl Into<String>, signature: Signature) -> Self {
        Self {
            identity: identity.into(),
            signature,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

/// Digest an ordered sequence of fingerprints. Used for run reporting.
pub fn digest<'a>(fingerprints: impl IntoIterator<Item = &'a Fingerprint>) -> String {
    let mut hasher = blake3::Hasher::new();
    for fp in fingerprints {
        hasher.update(fp.identity.as_bytes());
        hasher.update(&[0]);
        hasher.update(fp.signature.0.as_bytes());
        hasher.update(&[0]);
    }
    format!("blake3:{}", hasher.finalize())
}
