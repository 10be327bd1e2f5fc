//! Utility functions.

/// Aligns an offset up to the next multiple of `2^align_log2`.
///
/// Returns `None` on overflow.
pub fn align_up(offset: u64, align_log2: u32) -> Option<u64> {
    let align = 1u64.checked_shl(align_log2)?;
    let mask = align - 1;
    offset.checked_add(mask).map(|v| v & !mask)
}

/// Returns the final path component for display, falling back to the whole path.
pub fn file_name_lossy(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn align_up_rounds_to_power_of_two() {
        assert_eq!(align_up(0, 12), Some(0));
        assert_eq!(align_up(1, 12), Some(4096));
        assert_eq!(align_up(4096, 12), Some(4096));
        assert_eq!(align_up(4097, 14), Some(16384));
    }

    #[test]
    fn align_up_detects_overflow() {
        assert_eq!(align_up(u64::MAX, 12), None);
        assert_eq!(align_up(1, 64), None);
    }

    #[test]
    fn file_name_uses_last_component() {
        assert_eq!(file_name_lossy(Path::new("a/b/libx.so")), "libx.so");
        assert_eq!(file_name_lossy(Path::new("/")), "/");
    }
}
