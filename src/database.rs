use crate::checksum::ChecksumKey;
use thiserror::Error;

/// Field separator between the expected and replacement byte strings on an
/// edit line. A line containing this glyph is part of the current record.
const ARROW: char = '→';

/// One unit of a patch: a verified in-place byte substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOp {
    /// Byte position in the target file.
    pub offset: u64,
    /// Bytes that must currently occupy the span before writing.
    pub expected: Vec<u8>,
    /// Bytes written at `offset` once verification succeeds.
    pub replacement: Vec<u8>,
}

impl EditOp {
    /// Hex rendering of the expected bytes, for progress reporting.
    pub fn expected_hex(&self) -> String {
        hex_string(&self.expected)
    }

    /// Hex rendering of the replacement bytes, for progress reporting.
    pub fn replacement_hex(&self) -> String {
        hex_string(&self.replacement)
    }
}

/// The ordered edits for one target file, keyed by its CRC-32.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRecord {
    pub key: ChecksumKey,
    pub edits: Vec<EditOp>,
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("no patch available for CRC-32 {0}")]
    NoMatchingPatch(ChecksumKey),

    #[error("malformed edit on line {line}: {reason}")]
    MalformedEdit { line: usize, reason: String },
}

/// Scanner state for [`select_patch`].
///
/// A record is one key line followed by a contiguous run of edit lines;
/// the first non-edit line after the run closes the record for good.
enum ScanState {
    /// Looking for a line containing the key as a substring.
    Searching,
    /// Inside the record, decoding edit lines until one lacks the arrow.
    Consuming,
}

/// Extract the patch record for `key` from the database text.
///
/// The scan is sequential and first-match-wins: only the first line
/// containing the key starts a record, and only the contiguous edit lines
/// after it are consumed. Later occurrences of the same key are never
/// considered. A key with no edit lines behind it counts as no patch.
pub fn select_patch(database: &str, key: &ChecksumKey) -> Result<PatchRecord, DatabaseError> {
    let mut state = ScanState::Searching;
    let mut edits = Vec::new();

    for (idx, line) in database.lines().enumerate() {
        match state {
            ScanState::Searching => {
                if line.contains(key.as_str()) {
                    state = ScanState::Consuming;
                }
            }
            ScanState::Consuming => {
                if line.contains(ARROW) {
                    edits.push(parse_edit_line(line, idx + 1)?);
                } else {
                    break;
                }
            }
        }
    }

    if edits.is_empty() {
        return Err(DatabaseError::NoMatchingPatch(key.clone()));
    }

    Ok(PatchRecord {
        key: key.clone(),
        edits,
    })
}

/// Decode `<offsetHex>:<expectedHex>→<replacementHex>` into an [`EditOp`].
///
/// Whitespace anywhere on the line is ignored. Any decode failure is fatal
/// to the run; a half-understood edit must never be applied or skipped.
fn parse_edit_line(line: &str, line_no: usize) -> Result<EditOp, DatabaseError> {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();

    let (offset_part, rest) = compact
        .split_once(':')
        .ok_or_else(|| malformed(line_no, "missing ':' between offset and bytes"))?;
    let (expected_part, replacement_part) = rest
        .split_once(ARROW)
        .ok_or_else(|| malformed(line_no, "missing '→' between expected and replacement"))?;

    let offset = u64::from_str_radix(offset_part, 16)
        .map_err(|_| malformed(line_no, format!("invalid offset {offset_part:?}")))?;

    Ok(EditOp {
        offset,
        expected: decode_hex(expected_part, line_no)?,
        replacement: decode_hex(replacement_part, line_no)?,
    })
}

/// Decode an even-length hex string into bytes.
fn decode_hex(s: &str, line_no: usize) -> Result<Vec<u8>, DatabaseError> {
    if !s.is_ascii() || s.len() % 2 != 0 {
        return Err(malformed(
            line_no,
            format!("invalid hex byte string {s:?}"),
        ));
    }

    s.as_bytes()
        .chunks(2)
        .map(|pair| match (hex_digit(pair[0]), hex_digit(pair[1])) {
            (Some(hi), Some(lo)) => Ok(hi << 4 | lo),
            _ => Err(malformed(
                line_no,
                format!("invalid hex byte string {s:?}"),
            )),
        })
        .collect()
}

fn hex_digit(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

fn malformed(line: usize, reason: impl Into<String>) -> DatabaseError {
    DatabaseError::MalformedEdit {
        line,
        reason: reason.into(),
    }
}

pub(crate) fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
