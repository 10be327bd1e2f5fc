//! Fat binary writer.
//!
//! Serializes a [`Layout`] and its slice payloads into a Mach-O universal
//! container. All header fields are big-endian regardless of the slices' own
//! byte order.

use object::endian::{BigEndian, U32, U64};
use object::macho::{FatArch32, FatArch64, FatHeader};
use object::pod::bytes_of;
use std::path::Path;

use crate::error::CombineError;
use crate::layout::{FatFormat, Layout};

fn u32(v: u32) -> U32<BigEndian> {
    U32::new(BigEndian, v)
}
fn u64(v: u64) -> U64<BigEndian> {
    U64::new(BigEndian, v)
}

/// Builds the container bytes.
///
/// `payloads` must line up with `layout.slices`.
pub fn serialize(layout: &Layout, payloads: &[&[u8]]) -> Vec<u8> {
    debug_assert_eq!(layout.slices.len(), payloads.len());
    let mut buffer = Vec::with_capacity(layout.total_size as usize);

    let header = FatHeader {
        magic: u32(layout.format.magic()),
        nfat_arch: u32(layout.slices.len() as u32),
    };
    buffer.extend_from_slice(bytes_of(&header));

    for slice in &layout.slices {
        match layout.format {
            FatFormat::Fat32 => {
                let arch = FatArch32 {
                    cputype: u32(slice.arch.cputype),
                    cpusubtype: u32(slice.arch.cpusubtype),
                    offset: u32(slice.offset as u32),
                    size: u32(slice.size as u32),
                    align: u32(slice.align),
                };
                buffer.extend_from_slice(bytes_of(&arch));
            }
            FatFormat::Fat64 => {
                let arch = FatArch64 {
                    cputype: u32(slice.arch.cputype),
                    cpusubtype: u32(slice.arch.cpusubtype),
                    offset: u64(slice.offset),
                    size: u64(slice.size),
                    align: u32(slice.align),
                    reserved: u32(0),
                };
                buffer.extend_from_slice(bytes_of(&arch));
            }
        }
    }

    // Zero padding between slices
    for (slice, data) in layout.slices.iter().zip(payloads) {
        buffer.resize(slice.offset as usize, 0);
        buffer.extend_from_slice(data);
    }

    buffer
}

/// Writes the container to `output_path`, replacing any existing file.
pub fn write_output(output_path: &Path, bytes: &[u8]) -> Result<(), CombineError> {
    std::fs::write(output_path, bytes).map_err(|source| CombineError::OutputWrite {
        path: output_path.to_path_buf(),
        source,
    })
}
