//! Content signatures for change detection
//!
//! A signature covers the fields a user would notice changing. It is never
//! used as identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

use super::types::Record;

/// Field separator that cannot appear in normalized text
const FIELD_SEP: char = '\u{1f}';

/// Hex-encoded xxh3 digest of a record's displayed content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentSignature(String);

impl ContentSignature {
    /// Signature over canonical key, title, reward and device
    #[must_use]
    pub fn of(record: &Record) -> Self {
        Self(content_hash(&[
            &record.canonical_key,
            &record.title,
            &record.reward_value.signature_text(),
            record.device.as_str(),
        ]))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentSignature {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Hash a sequence of text parts into a 16-char hex digest
#[must_use]
pub fn content_hash(parts: &[&str]) -> String {
    let mut buf = String::with_capacity(parts.iter().map(|p| p.len() + 1).sum());
    for part in parts {
        buf.push_str(part);
        buf.push(FIELD_SEP);
    }
    hex::encode(xxh3_64(buf.as_bytes()).to_be_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_boundaries_matter() {
        assert_ne!(content_hash(&["ab", "c"]), content_hash(&["a", "bc"]));
        assert_eq!(content_hash(&["ab", "c"]), content_hash(&["ab", "c"]));
        assert_eq!(content_hash(&["x"]).len(), 16);
    }
}
