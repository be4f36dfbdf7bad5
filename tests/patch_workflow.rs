//! End-to-end workflow test
//!
//! Tests the complete pipeline:
//! 1. Compute the ROM's CRC-32
//! 2. Select the matching record from a database
//! 3. Apply the record to a copy
//! 4. Verify the patched bytes and failure cleanup

use hershel::{apply_patch, select_patch, ChecksumKey, DatabaseError, PatchError};
use std::fs;
use tempfile::TempDir;

/// A 64-byte ROM with a recognizable pattern at offset 0x10.
fn sample_rom() -> Vec<u8> {
    let mut rom = vec![0u8; 64];
    rom[0x10] = 0x01;
    rom[0x11] = 0x02;
    rom[0x20] = 0x55;
    rom
}

/// Build a database whose only record is keyed by the CRC-32 of `rom`.
fn sample_database(rom: &[u8]) -> String {
    let key = ChecksumKey::of_bytes(rom);
    format!(
        "Some Game (Europe) [{key}]\n\
         00000010:0102→AAFF\n\
         00000020:55→66\n\
         \n\
         Another Game 00000000\n"
    )
}

#[test]
fn test_full_pipeline_copy_mode() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("rom.nds");
    let dst = dir.path().join("rom (Patched).nds");
    let rom = sample_rom();
    fs::write(&src, &rom).unwrap();

    let key = ChecksumKey::of_bytes(&rom);
    let database = sample_database(&rom);
    let record = select_patch(&database, &key).unwrap();
    assert_eq!(record.edits.len(), 2);

    let mut reported = Vec::new();
    apply_patch(&src, &dst, &record, |edit| {
        reported.push((edit.offset, edit.replacement.clone()));
    })
    .unwrap();

    // Every edit reported in record order.
    assert_eq!(
        reported,
        vec![(0x10, vec![0xAA, 0xFF]), (0x20, vec![0x66])]
    );

    // Patched bytes in place, everything else untouched.
    let mut want = rom.clone();
    want[0x10] = 0xAA;
    want[0x11] = 0xFF;
    want[0x20] = 0x66;
    assert_eq!(fs::read(&dst).unwrap(), want);
    assert_eq!(fs::read(&src).unwrap(), rom);
}

#[test]
fn test_unknown_checksum_aborts_before_touching_the_rom() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("rom.nds");
    let rom = sample_rom();
    fs::write(&src, &rom).unwrap();

    let database = sample_database(&rom);
    let absent = ChecksumKey::normalize("00000001").unwrap();
    let result = select_patch(&database, &absent);
    assert!(matches!(result, Err(DatabaseError::NoMatchingPatch(_))));

    // Selection failed, so nothing ever opened the ROM for writing.
    assert_eq!(fs::read(&src).unwrap(), rom);
}

#[test]
fn test_mismatched_rom_leaves_no_artifact() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("rom.nds");
    let dst = dir.path().join("rom (Patched).nds");
    let rom = sample_rom();
    fs::write(&src, &rom).unwrap();

    // A record claiming different expected bytes at 0x10.
    let key = ChecksumKey::of_bytes(&rom);
    let database = format!("{key}\n00000010:0304→AAFF\n");
    let record = select_patch(&database, &key).unwrap();

    let err = apply_patch(&src, &dst, &record, |_| {}).unwrap_err();
    assert!(matches!(
        err,
        PatchError::Verification { offset: 0x10, .. }
    ));
    assert!(!dst.exists());
    assert_eq!(fs::read(&src).unwrap(), rom);
}

#[test]
fn test_inverse_record_restores_original() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("rom.nds");
    let rom = sample_rom();
    fs::write(&src, &rom).unwrap();

    let key = ChecksumKey::of_bytes(&rom);
    let forward = select_patch(&format!("{key}\n10:0102→AAFF\n"), &key).unwrap();
    let inverse = select_patch(&format!("{key}\n10:AAFF→0102\n"), &key).unwrap();

    apply_patch(&src, &src, &forward, |_| {}).unwrap();
    assert_ne!(fs::read(&src).unwrap(), rom);

    apply_patch(&src, &src, &inverse, |_| {}).unwrap();
    assert_eq!(fs::read(&src).unwrap(), rom);
}
