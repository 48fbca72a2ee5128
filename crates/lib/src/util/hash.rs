//! Content digests for deployable payloads.
//!
//! The digest is `base64(sha256(bytes))`, the same encoding the function
//! service reports for uploaded code, so local and remote values can be
//! compared directly.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Base64-encoded SHA-256 of a payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(pub String);

impl ContentDigest {
  /// Compare against a digest reported by a remote service.
  ///
  /// Surrounding whitespace is ignored; the comparison is otherwise exact and
  /// case-sensitive. This is the only digest comparison used anywhere.
  pub fn matches(&self, remote: &str) -> bool {
    self.0.trim() == remote.trim()
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for ContentDigest {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Hash arbitrary bytes.
pub fn digest_bytes(data: &[u8]) -> ContentDigest {
  let mut hasher = Sha256::new();
  hasher.update(data);
  ContentDigest(STANDARD.encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn digest_is_base64_sha256() {
    // sha256("") in base64
    assert_eq!(
      digest_bytes(b"").0,
      "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
    );
  }

  #[test]
  fn digest_is_deterministic() {
    assert_eq!(digest_bytes(b"hello world"), digest_bytes(b"hello world"));
  }

  #[test]
  fn digest_changes_with_content() {
    assert_ne!(digest_bytes(b"hello world"), digest_bytes(b"hello worle"));
  }

  #[test]
  fn matches_ignores_surrounding_whitespace() {
    let digest = digest_bytes(b"payload");
    assert!(digest.matches(&format!("  {}\n", digest.0)));
  }

  #[test]
  fn matches_is_case_sensitive() {
    let digest = digest_bytes(b"payload");
    assert!(!digest.matches(&digest.0.to_lowercase()));
  }
}
