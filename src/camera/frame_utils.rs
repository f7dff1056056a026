//! Pixel format conversion for captured frames.

/// Convert packed RGB to luma using the ITU-R BT.601 weights.
///
/// Integer math: coefficients are scaled by 1000 (299 + 587 + 114).
pub fn rgb_to_luma(rgb: &[u8]) -> Vec<u8> {
    let mut luma = Vec::with_capacity(rgb.len() / 3);
    rgb_to_luma_into(rgb, &mut luma);
    luma
}

/// Allocation-free variant of [`rgb_to_luma`] for the capture hot path.
pub fn rgb_to_luma_into(rgb: &[u8], buffer: &mut Vec<u8>) -> usize {
    buffer.clear();
    buffer.reserve(rgb.len() / 3);
    for px in rgb.chunks_exact(3) {
        let r = px[0] as u32;
        let g = px[1] as u32;
        let b = px[2] as u32;
        buffer.push(((299 * r + 587 * g + 114 * b) / 1000) as u8);
    }
    buffer.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_colors() {
        assert_eq!(rgb_to_luma(&[255, 0, 0]), vec![76]);
        assert_eq!(rgb_to_luma(&[0, 255, 0]), vec![149]);
        assert_eq!(rgb_to_luma(&[0, 0, 255]), vec![29]);
    }

    #[test]
    fn test_black_and_white() {
        assert_eq!(rgb_to_luma(&[0, 0, 0, 255, 255, 255]), vec![0, 255]);
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        assert_eq!(rgb_to_luma(&[255, 255, 255, 9, 9]), vec![255]);
    }

    #[test]
    fn test_into_reuses_buffer() {
        let mut buffer = vec![1, 2, 3, 4, 5];
        let n = rgb_to_luma_into(&[0, 0, 0], &mut buffer);
        assert_eq!(n, 1);
        assert_eq!(buffer, vec![0]);
    }
}
