/// Utility functions for corner detection algorithms

/// Pack a 16-entry circle test into a bitmask, bit `i` set when `pixels[i]` is.
pub fn circle_mask(pixels: &[bool; 16]) -> u16 {
    pixels
        .iter()
        .enumerate()
        .fold(0u16, |mask, (i, &pixel)| mask | ((pixel as u16) << i))
}

/// Check if there are at least `min_count` consecutive set bits in the
/// circular 16-bit mask.
///
/// A run of length n survives `mask & rotl(mask, 1) & ... & rotl(mask, n-1)`.
pub fn has_consecutive_pixels(mask: u16, min_count: usize) -> bool {
    if min_count > 16 || min_count == 0 {
        return false;
    }

    let mut test_mask = mask;
    for i in 1..min_count {
        test_mask &= mask.rotate_left(i as u32);
        if test_mask == 0 {
            return false;
        }
    }

    test_mask != 0
}
