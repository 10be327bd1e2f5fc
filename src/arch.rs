//! Architecture detection.
//!
//! Each slice of a fat binary is tagged with the CPU type and subtype of the
//! Mach-O image it carries. This module reads those values from an input image
//! using the `object` crate and rejects anything that is not a
//! single-architecture dynamic library.

use object::macho;
use object::read::macho::MachHeader;
use object::{Endianness, FileKind};
use std::fmt;

/// Capability bits stored in the high byte of `cpusubtype`.
const SUBTYPE_CAPABILITY_MASK: u32 = 0xff00_0000;

/// Page alignment (as a power of two) for ARM slices.
const ARM_ALIGN: u32 = 14;
/// Page alignment (as a power of two) for every other CPU.
const DEFAULT_ALIGN: u32 = 12;

/// The CPU identity of one Mach-O image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CpuArch {
    pub cputype: u32,
    pub cpusubtype: u32,
}

impl CpuArch {
    pub fn new(cputype: u32, cpusubtype: u32) -> Self {
        Self { cputype, cpusubtype }
    }

    /// The subtype without capability bits. Two slices with the same
    /// `cputype` and family are indistinguishable to the loader.
    pub fn family(&self) -> u32 {
        self.cpusubtype & !SUBTYPE_CAPABILITY_MASK
    }

    /// Alignment of this slice inside the container, as a power of two.
    pub fn align_log2(&self) -> u32 {
        match self.cputype {
            macho::CPU_TYPE_ARM | macho::CPU_TYPE_ARM64 | macho::CPU_TYPE_ARM64_32 => ARM_ALIGN,
            _ => DEFAULT_ALIGN,
        }
    }

    pub fn name(&self) -> String {
        match (self.cputype, self.family()) {
            (macho::CPU_TYPE_ARM64, macho::CPU_SUBTYPE_ARM64E) => "arm64e".into(),
            (macho::CPU_TYPE_ARM64, _) => "arm64".into(),
            (macho::CPU_TYPE_ARM64_32, _) => "arm64_32".into(),
            (macho::CPU_TYPE_ARM, _) => "arm".into(),
            (macho::CPU_TYPE_X86_64, macho::CPU_SUBTYPE_X86_64_H) => "x86_64h".into(),
            (macho::CPU_TYPE_X86_64, _) => "x86_64".into(),
            (macho::CPU_TYPE_X86, _) => "i386".into(),
            (macho::CPU_TYPE_POWERPC, _) => "ppc".into(),
            (macho::CPU_TYPE_POWERPC64, _) => "ppc64".into(),
            (cputype, family) => format!("cpu({cputype:#x}, {family:#x})"),
        }
    }
}

impl fmt::Display for CpuArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Identifies the architecture of a single-architecture Mach-O dylib.
///
/// Returns a human-readable reason when `data` is not one.
pub fn detect(data: &[u8]) -> Result<CpuArch, String> {
    let kind = FileKind::parse(data).map_err(|e| e.to_string())?;
    match kind {
        FileKind::MachO32 => read_header::<macho::MachHeader32<Endianness>>(data),
        FileKind::MachO64 => read_header::<macho::MachHeader64<Endianness>>(data),
        FileKind::MachOFat32 | FileKind::MachOFat64 => {
            Err("input is already a fat binary".to_string())
        }
        other => Err(format!("expected a Mach-O image, found {other:?}")),
    }
}

fn read_header<Mach: MachHeader<Endian = Endianness>>(data: &[u8]) -> Result<CpuArch, String> {
    let header = Mach::parse(data, 0).map_err(|e| e.to_string())?;
    let endian = header.endian().map_err(|e| e.to_string())?;
    let filetype = header.filetype(endian);
    if filetype != macho::MH_DYLIB {
        return Err(format!("Mach-O file type {filetype} is not MH_DYLIB"));
    }
    Ok(CpuArch::new(header.cputype(endian), header.cpusubtype(endian)))
}
