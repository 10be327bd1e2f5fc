//! Fat binary layout.
//!
//! Places each architecture slice inside the output container. The header
//! (one `fat_header` followed by one `fat_arch` record per slice) comes first,
//! then every slice at the next offset that satisfies its alignment.

use object::macho;

use crate::arch::CpuArch;
use crate::utils::align_up;

/// Size of `fat_header`.
pub const FAT_HEADER_SIZE: u64 = 8;
/// Size of a 32-bit `fat_arch` record.
pub const FAT_ARCH32_SIZE: u64 = 20;
/// Size of a 64-bit `fat_arch_64` record.
pub const FAT_ARCH64_SIZE: u64 = 32;

/// Which flavour of fat header the container needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatFormat {
    Fat32,
    Fat64,
}

impl FatFormat {
    pub fn magic(self) -> u32 {
        match self {
            FatFormat::Fat32 => macho::FAT_MAGIC,
            FatFormat::Fat64 => macho::FAT_MAGIC_64,
        }
    }

    fn arch_record_size(self) -> u64 {
        match self {
            FatFormat::Fat32 => FAT_ARCH32_SIZE,
            FatFormat::Fat64 => FAT_ARCH64_SIZE,
        }
    }
}

/// Placement of one slice in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub arch: CpuArch,
    /// File offset of the slice data.
    pub offset: u64,
    /// Length of the slice data.
    pub size: u64,
    /// Alignment as a power of two.
    pub align: u32,
}

/// The complete container layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub format: FatFormat,
    pub slices: Vec<Slice>,
    /// Total file size.
    pub total_size: u64,
}

impl Layout {
    /// Computes offsets for `(arch, size)` pairs, preserving their order.
    ///
    /// The 32-bit format is used unless some offset or size does not fit in a
    /// `u32`. Returns `None` if the layout overflows `u64`.
    pub fn plan(members: &[(CpuArch, u64)]) -> Option<Layout> {
        let fat32 = Self::plan_with(FatFormat::Fat32, members)?;
        let fits = fat32
            .slices
            .iter()
            .all(|s| u32::try_from(s.offset).is_ok() && u32::try_from(s.size).is_ok());
        if fits {
            Some(fat32)
        } else {
            tracing::debug!("slice offsets exceed 32 bits, switching to fat64 layout");
            Self::plan_with(FatFormat::Fat64, members)
        }
    }

    fn plan_with(format: FatFormat, members: &[(CpuArch, u64)]) -> Option<Layout> {
        let header_size = FAT_HEADER_SIZE + format.arch_record_size() * members.len() as u64;
        let mut cursor = header_size;
        let mut slices = Vec::with_capacity(members.len());
        for &(arch, size) in members {
            let align = arch.align_log2();
            let offset = align_up(cursor, align)?;
            cursor = offset.checked_add(size)?;
            slices.push(Slice { arch, offset, size, align });
        }
        Some(Layout { format, slices, total_size: cursor })
    }

    /// Size of the header region (fat header plus arch records).
    pub fn header_size(&self) -> u64 {
        FAT_HEADER_SIZE + self.format.arch_record_size() * self.slices.len() as u64
    }
}
