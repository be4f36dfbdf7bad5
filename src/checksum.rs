use std::fmt;
use thiserror::Error;

/// An 8-digit uppercase hexadecimal CRC-32, used to key the patch database.
///
/// The database stores keys as free text, so matching is plain substring
/// search against the normalized form. The invariant is exactly eight hex
/// digits; anything else never constructs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChecksumKey(String);

#[derive(Error, Debug)]
pub enum ChecksumError {
    #[error("malformed CRC-32 {0:?} (expected exactly 8 hex digits)")]
    Malformed(String),
}

impl ChecksumKey {
    /// Build a key from a raw CRC-32 value, zero-padded to 8 digits.
    pub fn from_value(value: u32) -> Self {
        Self(format!("{value:08X}"))
    }

    /// CRC-32 (IEEE) of the given bytes.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self::from_value(crc32fast::hash(bytes))
    }

    /// Normalize a user-supplied checksum string.
    ///
    /// Strips an optional `0x`/`0X` prefix and uppercases. After that the
    /// value must be exactly 8 hex digits; a malformed value is fatal to
    /// the run, never silently recomputed from the file.
    pub fn normalize(raw: &str) -> Result<Self, ChecksumError> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ChecksumError::Malformed(raw.to_string()));
        }

        Ok(Self(digits.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChecksumKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
