//! Marker search over downloaded chunks.

/// Returns the absolute offset of the first `marker` byte in `chunk`.
///
/// `base_offset` is the absolute position of `chunk[0]` within the file, so
/// the result can be compared directly against offsets found in other files.
///
/// # Examples
///
/// ```
/// use earliest_core::find_marker;
///
/// assert_eq!(find_marker(b"xxAx", 100, b'A'), Some(102));
/// assert_eq!(find_marker(b"xxxx", 100, b'A'), None);
/// ```
#[must_use]
pub fn find_marker(chunk: &[u8], base_offset: u64, marker: u8) -> Option<u64> {
    chunk
        .iter()
        .position(|&byte| byte == marker)
        .map(|index| base_offset + index as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_marker_first_byte() {
        assert_eq!(find_marker(b"Abc", 0, b'A'), Some(0));
    }

    #[test]
    fn test_find_marker_reports_first_of_many() {
        assert_eq!(find_marker(b"xAyAz", 0, b'A'), Some(1));
    }

    #[test]
    fn test_find_marker_adds_base_offset() {
        assert_eq!(find_marker(b"....A", 65_536, b'A'), Some(65_540));
    }

    #[test]
    fn test_find_marker_absent() {
        assert_eq!(find_marker(b"aaaa", 12, b'A'), None);
    }

    #[test]
    fn test_find_marker_empty_chunk() {
        assert_eq!(find_marker(b"", 7, b'A'), None);
    }

    #[test]
    fn test_find_marker_non_ascii_marker() {
        assert_eq!(find_marker(&[0x00, 0xff, 0x10], 3, 0xff), Some(4));
    }
}
