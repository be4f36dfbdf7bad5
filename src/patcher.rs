use crate::database::{hex_string, EditOp, PatchRecord};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatchError {
    /// The bytes on disk did not match the record's expectation. Nothing at
    /// or after this offset was written; strictly earlier edits already were.
    #[error(
        "verification failed at 0x{offset:08x}: expected {}, found {}",
        hex_string(.expected),
        hex_string(.found)
    )]
    Verification {
        offset: u64,
        expected: Vec<u8>,
        found: Vec<u8>,
    },

    /// Verification failed and the corrupt destination copy could not be
    /// removed, so the artifact is still on disk.
    #[error("failed to remove corrupt copy {}: {source} (after {cause})", .path.display())]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
        cause: Box<PatchError>,
    },

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Apply `record` to `source`, writing the result at `dest`.
///
/// When the destination resolves to a different file, `source` is first
/// copied to `dest` and only the copy is ever written; a failed
/// verification removes the copy so no corrupt artifact is left behind.
/// When both paths name the same file — byte-identical or not, e.g.
/// `rom.nds` versus `sub/../rom.nds` — the file is patched in place, and a
/// failure leaves it partially patched: the documented risk of in-place
/// mode. Copying a file onto itself would truncate it, so the comparison
/// uses canonical paths, never the raw spellings.
///
/// `on_edit` is invoked once per applied edit, in record order, after the
/// bytes are written. Edits are verified one at a time: each span is read
/// back and compared against the expected bytes before its replacement is
/// written, and the first mismatch aborts the run without touching that
/// span or any later one.
pub fn apply_patch(
    source: &Path,
    dest: &Path,
    record: &PatchRecord,
    mut on_edit: impl FnMut(&EditOp),
) -> Result<(), PatchError> {
    let made_copy = !is_same_file(source, dest)?;
    if made_copy {
        fs::copy(source, dest)?;
    }

    match apply_edits(dest, record, &mut on_edit) {
        Err(err @ PatchError::Verification { .. }) if made_copy => {
            match fs::remove_file(dest) {
                Ok(()) => Err(err),
                Err(remove_err) => Err(PatchError::Cleanup {
                    path: dest.to_path_buf(),
                    source: remove_err,
                    cause: Box::new(err),
                }),
            }
        }
        other => other,
    }
}

/// Whether the two paths name the same existing file.
///
/// Canonicalization resolves `.`/`..` components and symlinks, so aliased
/// spellings of the source are recognized and handled as in-place mode. A
/// destination that does not exist yet is by definition a different file.
fn is_same_file(source: &Path, dest: &Path) -> std::io::Result<bool> {
    if !dest.exists() {
        return Ok(false);
    }
    Ok(source.canonicalize()? == dest.canonicalize()?)
}

fn apply_edits(
    dest: &Path,
    record: &PatchRecord,
    on_edit: &mut dyn FnMut(&EditOp),
) -> Result<(), PatchError> {
    let mut file = OpenOptions::new().read(true).write(true).open(dest)?;

    for edit in &record.edits {
        file.seek(SeekFrom::Start(edit.offset))?;

        let mut found = vec![0u8; edit.expected.len()];
        let filled = read_up_to(&mut file, &mut found)?;
        found.truncate(filled);

        // A short read (offset past EOF) is a mismatch, not an I/O fault.
        if found != edit.expected {
            return Err(PatchError::Verification {
                offset: edit.offset,
                expected: edit.expected.clone(),
                found,
            });
        }

        file.seek(SeekFrom::Start(edit.offset))?;
        file.write_all(&edit.replacement)?;

        on_edit(edit);
    }

    file.flush()?;
    Ok(())
}

/// Read until the buffer is full or EOF, returning the bytes filled.
fn read_up_to(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
