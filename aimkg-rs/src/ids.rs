//! Deterministic item identifiers.
//!
//! An [`ItemId`] is the cross-source merge key: SHA-1 of a canonical string,
//! read as a big-endian integer and reduced to [`ID_WIDTH`] decimal digits.
//! Two records merge into one node if and only if their canonical strings are
//! byte-identical, so normalization happens before hashing (see
//! [`crate::utils::canonical_name`]). Collisions are not detected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha1::{Digest, Sha1};

use crate::errors::AimkgError;
use crate::nodes::EntityKind;
use crate::utils::canonical_name;

/// Number of decimal digits in a rendered [`ItemId`].
pub const ID_WIDTH: usize = 10;

const ID_MODULUS: u64 = 10_000_000_000;

/// Stable, hash-derived node identifier, rendered as a zero-padded
/// 10-digit decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u64);

impl ItemId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Map a canonical string to its [`ItemId`].
pub fn item_id(canonical: &str) -> ItemId {
    let digest = Sha1::digest(canonical.as_bytes());
    // Horner reduction over the 160-bit digest; the accumulator stays below
    // 10^10 * 256 so u64 never overflows.
    let reduced = digest
        .iter()
        .fold(0_u64, |acc, byte| (acc * 256 + u64::from(*byte)) % ID_MODULUS);
    ItemId(reduced)
}

/// Canonical key of a single-name entity: `"{kind}:{normalized name}"`.
pub fn entity_key(kind: EntityKind, name: &str) -> String {
    format!("{}:{}", kind.key_prefix(), canonical_name(name))
}

/// [`item_id`] of [`entity_key`].
pub fn entity_id(kind: EntityKind, name: &str) -> ItemId {
    item_id(&entity_key(kind, name))
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = ID_WIDTH)
    }
}

impl FromStr for ItemId {
    type Err = AimkgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.len() > ID_WIDTH || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AimkgError::Validation(format!("invalid item id '{s}'")));
        }
        s.parse::<u64>()
            .map(ItemId)
            .map_err(|e| AimkgError::Validation(format!("invalid item id '{s}': {e}")))
    }
}

impl Serialize for ItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
