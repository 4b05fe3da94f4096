// hasher.rs — Fingerprints for chain links and client identifiers.
//
// JSONL records link to their predecessor by the SHA-256 of its raw line,
// and hosts hash client IPs and user agents before putting them in a
// request context. Both use the lowercase hex digest produced here.

use sha2::{Digest, Sha256};

pub fn hash_bytes(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Hex SHA-256 of a string's UTF-8 bytes.
pub fn hash_str(s: &str) -> String {
    hash_bytes(s.as_bytes())
}
