//! Integration tests for `fat-combine`.
//!
//! Inputs are synthetic Mach-O dylib headers padded with zeroes, which is all
//! the combiner looks at. Outputs are checked with `object`'s fat reader.

use fatpub::combiner::combine_files;
use fatpub::error::CombineError;
use object::macho;
use object::read::macho::{FatArch, MachOFatFile32};
use object::FileKind;
use std::path::{Path, PathBuf};

/// A 64-bit little-endian Mach-O dylib header padded to `len` bytes.
fn dylib64(cputype: u32, cpusubtype: u32, len: usize, fill: u8) -> Vec<u8> {
    let mut data = Vec::new();
    for word in [macho::MH_MAGIC_64, cputype, cpusubtype, macho::MH_DYLIB, 0, 0, 0, 0] {
        data.extend_from_slice(&word.to_le_bytes());
    }
    data.resize(len, fill);
    data
}

/// A 32-bit little-endian Mach-O dylib header padded to `len` bytes.
fn dylib32(cputype: u32, cpusubtype: u32, len: usize, fill: u8) -> Vec<u8> {
    let mut data = Vec::new();
    for word in [macho::MH_MAGIC, cputype, cpusubtype, macho::MH_DYLIB, 0, 0, 0] {
        data.extend_from_slice(&word.to_le_bytes());
    }
    data.resize(len, fill);
    data
}

fn write_input(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

/// Returns (cputype, slice bytes) for every slice in a fat32 container.
fn read_slices(bytes: &[u8]) -> Vec<(u32, Vec<u8>)> {
    let fat = MachOFatFile32::parse(bytes).expect("output should be a fat binary");
    fat.arches()
        .iter()
        .map(|arch| (arch.cputype(), arch.data(bytes).unwrap().to_vec()))
        .collect()
}

#[test]
fn two_100_byte_inputs_make_a_valid_universal_binary() {
    let dir = tempfile::tempdir().unwrap();
    let arm = dylib64(macho::CPU_TYPE_ARM64, 0, 100, 0xaa);
    let x86 = dylib64(macho::CPU_TYPE_X86_64, 3, 100, 0xbb);
    let inputs = vec![
        write_input(dir.path(), "arm64.dylib", &arm),
        write_input(dir.path(), "x86_64.dylib", &x86),
    ];
    let output = dir.path().join("lib.dylib");

    let report = combine_files(&inputs, &output).unwrap();
    let bytes = std::fs::read(&output).unwrap();

    assert_eq!(FileKind::parse(&*bytes).unwrap(), FileKind::MachOFat32);
    // Header, then arm64 at 16 KiB, then x86_64 at the next 4 KiB boundary.
    let overhead = 20480 - 100;
    assert_eq!(bytes.len(), arm.len() + x86.len() + overhead);
    assert_eq!(report.layout.total_size, bytes.len() as u64);

    let slices = read_slices(&bytes);
    assert_eq!(
        slices,
        vec![(macho::CPU_TYPE_ARM64, arm), (macho::CPU_TYPE_X86_64, x86)]
    );
}

#[test]
fn slices_follow_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let x86 = dylib64(macho::CPU_TYPE_X86_64, 3, 300, 1);
    let i386 = dylib32(macho::CPU_TYPE_X86, 3, 200, 2);
    let arm = dylib64(macho::CPU_TYPE_ARM64, 0, 100, 3);
    let inputs = vec![
        write_input(dir.path(), "x86_64.dylib", &x86),
        write_input(dir.path(), "i386.dylib", &i386),
        write_input(dir.path(), "arm64.dylib", &arm),
    ];
    let output = dir.path().join("out.dylib");

    combine_files(&inputs, &output).unwrap();
    let slices = read_slices(&std::fs::read(&output).unwrap());

    let types: Vec<_> = slices.iter().map(|(t, _)| *t).collect();
    assert_eq!(
        types,
        [macho::CPU_TYPE_X86_64, macho::CPU_TYPE_X86, macho::CPU_TYPE_ARM64]
    );
    assert_eq!(slices[0].1, x86);
    assert_eq!(slices[1].1, i386);
    assert_eq!(slices[2].1, arm);
}

#[test]
fn single_input_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let arm = dylib64(macho::CPU_TYPE_ARM64, 0, 64, 0);
    let inputs = vec![write_input(dir.path(), "arm64.dylib", &arm)];
    let output = dir.path().join("out.dylib");

    combine_files(&inputs, &output).unwrap();
    let slices = read_slices(&std::fs::read(&output).unwrap());
    assert_eq!(slices, vec![(macho::CPU_TYPE_ARM64, arm)]);
}

#[test]
fn rerunning_produces_identical_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = vec![
        write_input(dir.path(), "a.dylib", &dylib64(macho::CPU_TYPE_ARM64, 0, 150, 7)),
        write_input(dir.path(), "b.dylib", &dylib64(macho::CPU_TYPE_X86_64, 3, 150, 8)),
    ];
    let output = dir.path().join("out.dylib");

    combine_files(&inputs, &output).unwrap();
    let first = std::fs::read(&output).unwrap();
    combine_files(&inputs, &output).unwrap();
    let second = std::fs::read(&output).unwrap();
    assert_eq!(first, second);
}

#[test]
fn existing_output_is_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.dylib");
    std::fs::write(&output, vec![0x55u8; 100_000]).unwrap();
    let inputs = vec![write_input(
        dir.path(),
        "a.dylib",
        &dylib64(macho::CPU_TYPE_X86_64, 3, 100, 0),
    )];

    let report = combine_files(&inputs, &output).unwrap();
    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(bytes.len() as u64, report.layout.total_size);
    assert_eq!(bytes.len(), 4096 + 100);
}

#[test]
fn invalid_input_leaves_existing_output_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.dylib");
    std::fs::write(&output, b"previous build").unwrap();
    let inputs = vec![
        write_input(dir.path(), "a.dylib", &dylib64(macho::CPU_TYPE_ARM64, 0, 100, 0)),
        write_input(dir.path(), "notes.txt", b"this is not a mach-o image"),
    ];

    let err = combine_files(&inputs, &output).unwrap_err();
    assert!(matches!(err, CombineError::Format { .. }), "{err}");
    assert_eq!(std::fs::read(&output).unwrap(), b"previous build");
}

#[test]
fn missing_input_leaves_existing_output_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.dylib");
    std::fs::write(&output, b"previous build").unwrap();
    let inputs = vec![
        write_input(dir.path(), "a.dylib", &dylib64(macho::CPU_TYPE_ARM64, 0, 100, 0)),
        dir.path().join("missing.dylib"),
    ];

    let err = combine_files(&inputs, &output).unwrap_err();
    assert!(matches!(err, CombineError::FileAccess { .. }), "{err}");
    assert_eq!(std::fs::read(&output).unwrap(), b"previous build");
}

#[test]
fn unwritable_output_aborts_without_touching_it() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.dylib");
    std::fs::write(&output, b"previous build").unwrap();
    let mut perms = std::fs::metadata(&output).unwrap().permissions();
    perms.set_readonly(true);
    std::fs::set_permissions(&output, perms).unwrap();

    // Privileged users can write read-only files; nothing to check then.
    if std::fs::OpenOptions::new().append(true).open(&output).is_ok() {
        return;
    }

    let inputs = vec![write_input(
        dir.path(),
        "a.dylib",
        &dylib64(macho::CPU_TYPE_ARM64, 0, 100, 0),
    )];
    let err = combine_files(&inputs, &output).unwrap_err();
    match err {
        CombineError::OutputWrite { path, source } => {
            assert_eq!(path, output);
            assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(std::fs::read(&output).unwrap(), b"previous build");
}

#[test]
fn output_path_that_is_a_directory_is_a_write_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out");
    std::fs::create_dir(&output).unwrap();
    let inputs = vec![write_input(
        dir.path(),
        "a.dylib",
        &dylib64(macho::CPU_TYPE_ARM64, 0, 100, 0),
    )];

    let err = combine_files(&inputs, &output).unwrap_err();
    assert!(matches!(err, CombineError::OutputWrite { .. }), "{err}");
    assert!(output.is_dir());
}

#[test]
fn duplicate_architectures_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.dylib");
    let inputs = vec![
        write_input(dir.path(), "a.dylib", &dylib64(macho::CPU_TYPE_ARM64, 0, 100, 0)),
        write_input(dir.path(), "b.dylib", &dylib64(macho::CPU_TYPE_ARM64, 0, 120, 1)),
    ];

    let err = combine_files(&inputs, &output).unwrap_err();
    assert!(matches!(err, CombineError::DuplicateArchitecture { .. }), "{err}");
    assert!(!output.exists());
}
