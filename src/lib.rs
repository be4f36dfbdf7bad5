//! Hershel: NDS ROM patcher for OpenPatch's text patch format
//!
//! Applies text-encoded binary patches to ROM images, verifying every edit
//! against the bytes expected on disk before writing.
//!
//! # Architecture
//!
//! The patch database is free text keyed by the CRC-32 of the original ROM.
//! [`select_patch`] runs a two-state line scanner over it and produces a
//! [`PatchRecord`]: an ordered list of [`EditOp`] byte substitutions.
//! [`apply_patch`] then applies the record, verifying each span before
//! overwriting it.
//!
//! # Safety
//!
//! - Every edit verifies its expected bytes before any write
//! - The first mismatch aborts the run; no later edit is applied
//! - A destination copy is removed on verification failure
//! - In-place mode documents, rather than hides, its partial-failure risk
//!
//! # Example
//!
//! ```no_run
//! use hershel::{apply_patch, select_patch, ChecksumKey};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let rom = std::fs::read("game.nds")?;
//! let database = std::fs::read_to_string("patches.txt")?;
//!
//! let key = ChecksumKey::of_bytes(&rom);
//! let record = select_patch(&database, &key)?;
//!
//! apply_patch(
//!     Path::new("game.nds"),
//!     Path::new("game (Patched).nds"),
//!     &record,
//!     |edit| {
//!         println!(
//!             "0x{:08x}: {} -> {}",
//!             edit.offset,
//!             edit.expected_hex(),
//!             edit.replacement_hex()
//!         );
//!     },
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod checksum;
pub mod database;
pub mod patcher;

// Re-exports
pub use checksum::{ChecksumError, ChecksumKey};
pub use database::{select_patch, DatabaseError, EditOp, PatchRecord};
pub use patcher::{apply_patch, PatchError};
