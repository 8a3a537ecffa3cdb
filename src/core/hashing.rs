//! Canonical JSON serialization and the `build_hash_v1` content digest.
//!
//! Mirrors the teacher's Merkle-tree hashing idiom (sorted children, SHA-256
//! over a deterministic byte sequence) but flattened to a single digest over
//! the sorted layer payloads rather than a tree: `build_hash_v1` has no
//! incremental-update requirement, so one pass suffices.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::core::errors::{DspError, Result};

/// Serialize `value` as canonical JSON: compact separators, and — because
/// `serde_json::Map` is BTreeMap-backed whenever the `preserve_order`
/// feature is not enabled (it is not, in this crate) — object keys in
/// strictly ascending order at every nesting level.
///
/// # Errors
/// Propagates any `serde_json` serialization failure.
pub fn canonical_json(value: &impl Serialize) -> Result<String> {
    serde_json::to_string(value).map_err(DspError::from)
}

/// Compute the lowercase-hex SHA-256 digest of a canonical-JSON-serialized
/// value. Used both for `build_hash_v1` (over the sorted layer payloads plus
/// pipeline version pins) and for verifying curated-pack checksums.
///
/// # Errors
/// Propagates any `serde_json` serialization failure.
pub fn sha256_of_canonical_json(value: &impl Serialize) -> Result<String> {
    let bytes = canonical_json(value)?;
    Ok(sha256_hex(bytes.as_bytes()))
}

/// Lowercase-hex SHA-256 digest of raw bytes (used for pack-file checksum
/// verification against the curated manifest).
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Whether `candidate` is a well-formed 64-hex-lowercase SHA-256 string, as
/// required of every curated manifest entry.
#[must_use]
pub fn is_valid_sha256_hex(candidate: &str) -> bool {
    candidate.len() == 64
        && candidate
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::{is_valid_sha256_hex, sha256_hex, sha256_of_canonical_json};
    use serde_json::json;

    #[test]
    fn sha256_hex_is_deterministic_and_lowercase() {
        let a = sha256_hex(b"hello");
        let b = sha256_hex(b"hello");
        assert_eq!(a, b);
        assert!(is_valid_sha256_hex(&a));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn canonical_json_sorts_object_keys() {
        let value = json!({"z": 1, "a": 2, "m": 3});
        let text = super::canonical_json(&value).unwrap();
        assert_eq!(text, r#"{"a":2,"m":3,"z":1}"#);
    }

    #[test]
    fn sha256_of_canonical_json_is_order_insensitive_at_construction() {
        let a = json!({"z": 1, "a": 2});
        let b = json!({"a": 2, "z": 1});
        assert_eq!(
            sha256_of_canonical_json(&a).unwrap(),
            sha256_of_canonical_json(&b).unwrap()
        );
    }

    #[test]
    fn invalid_sha256_hex_rejected() {
        assert!(!is_valid_sha256_hex("not-hex"));
        assert!(!is_valid_sha256_hex("ABCDEF"));
        assert!(!is_valid_sha256_hex(&"a".repeat(63)));
    }
}
