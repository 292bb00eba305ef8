// provenance.rs — Fingerprints of composition runs
//
// Two runs with the same expression over the same tiles, starting from the
// same namespace, produce the same tile fingerprint. The tile fingerprint
// is a SHA-256 over a canonical field-by-field encoding of the tile, so it
// does not depend on any serialisation format.

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::tile::{Role, Tile};

/// Provenance metadata for reproducibility checks.
///
/// `expression_hash`: SHA-256 of the raw composition expression.
/// `tile_fingerprint`: SHA-256 of the canonical encoding of the result.
/// `tool_version`: crate version from `Cargo.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    #[serde(serialize_with = "hex_bytes")]
    pub expression_hash: [u8; 32],
    #[serde(serialize_with = "hex_bytes")]
    pub tile_fingerprint: [u8; 32],
    pub tool_version: &'static str,
}

impl Provenance {
    pub fn compute(expression: &str, tile: &Tile) -> Self {
        Self {
            expression_hash: Sha256::digest(expression.as_bytes()).into(),
            tile_fingerprint: fingerprint(tile),
            tool_version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Hex string of the expression hash (64 characters).
    pub fn expression_hash_hex(&self) -> String {
        bytes_to_hex(&self.expression_hash)
    }

    /// Hex string of the tile fingerprint (64 characters).
    pub fn tile_fingerprint_hex(&self) -> String {
        bytes_to_hex(&self.tile_fingerprint)
    }
}

fn bytes_to_hex(bytes: &[u8; 32]) -> String {
    let mut s = String::with_capacity(64);
    for b in bytes {
        use std::fmt::Write;
        let _ = write!(s, "{:02x}", b);
    }
    s
}

fn hex_bytes<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&bytes_to_hex(bytes))
}

/// Length-prefixed text field.
fn field(hasher: &mut Sha256, text: &str) {
    hasher.update((text.len() as u64).to_le_bytes());
    hasher.update(text.as_bytes());
}

/// SHA-256 over every field of `tile`, in order.
pub fn fingerprint(tile: &Tile) -> [u8; 32] {
    let mut hasher = Sha256::new();
    let opt = |o: &Option<String>| o.clone().unwrap_or_default();

    field(&mut hasher, &tile.name);
    field(&mut hasher, &tile.declaration);
    field(&mut hasher, &opt(&tile.parameter_bounds));
    hasher.update((tile.locations.len() as u64).to_le_bytes());
    for loc in &tile.locations {
        field(&mut hasher, &loc.id);
        field(&mut hasher, &opt(&loc.invariant));
        field(&mut hasher, &opt(&loc.comment));
        let role = match loc.role {
            None => 0u8,
            Some(Role::In) => 1,
            Some(Role::Out) => 2,
        };
        hasher.update([u8::from(loc.is_final), role]);
    }
    hasher.update((tile.transitions.len() as u64).to_le_bytes());
    for t in &tile.transitions {
        field(&mut hasher, &t.id);
        field(&mut hasher, &t.source);
        field(&mut hasher, &t.target);
        field(&mut hasher, &opt(&t.guard));
        field(&mut hasher, &opt(&t.assignment));
    }
    hasher.finalize().into()
}
