//! Hashing - SHA-256 Fingerprints
//!
//! A catalog fingerprint tells a refresh whether anything actually changed;
//! exports record the hash of the text they delivered.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::catalog::Catalog;

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Compact JSON with object keys in sorted order. `serde_json::Map` is
/// key-ordered, so going through `Value` is enough.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_value(value).and_then(|v| serde_json::to_string(&v))
}

/// Fingerprint of both catalog documents. Each document is hashed under its
/// own label so content cannot shift from one to the other unnoticed.
pub fn catalog_fingerprint(catalog: &Catalog) -> Result<String, serde_json::Error> {
    let documents = [
        ("scripts", canonical_json(catalog.scripts())?),
        ("templates", canonical_json(catalog.template_catalog())?),
    ];

    let mut hasher = Sha256::new();
    for (label, json) in &documents {
        hasher.update(label.as_bytes());
        hasher.update([0u8]);
        hasher.update(json.as_bytes());
        hasher.update([0u8]);
    }
    Ok(hex::encode(hasher.finalize()))
}
