//! blake3 digests over canonical JSON.

use blake3::Hasher;
use serde_json::Value;

use super::to_canonical_json;

/// Hashes a string and returns the hex digest.
pub fn hash_str(input: &str) -> String {
    let mut h = Hasher::new();
    h.update(input.as_bytes());
    h.finalize().to_hex().to_string()
}

/// Hashes the canonical form of a JSON value.
pub fn hash_value(value: &Value) -> String {
    hash_str(&to_canonical_json(value))
}
