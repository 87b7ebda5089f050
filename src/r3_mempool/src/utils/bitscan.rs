//! Bit scan over a single bitmap byte
//!
//! Small microcontrollers usually have a low-latency memory system and a
//! single-issue in-order pipeline, and many of them (e.g., Armv6-M, MSP430,
//! AVR) lack a count-trailing-zeros instruction. An array-based look-up table
//! is the fastest option there, so this module uses one unconditionally. The
//! table is 256 bytes long and lives in `.rodata`.

/// `LUT[x]` is the number of trailing zeros in `x`. `LUT[0]` is `8`.
static LUT: [u8; 256] = {
    let mut array = [0u8; 256];
    // `for` is unusable in `const`
    let mut i = 0;
    while i < array.len() {
        array[i] = (i as u8).trailing_zeros() as u8;
        i += 1;
    }
    array
};

/// Get the position of the least significant zero bit in `mask`.
///
/// `mask` must not be `0xff`. The result is unspecified (but memory-safe) in
/// that case; it's `8` in the current implementation.
#[inline]
pub fn first_zero_bit(mask: u8) -> u32 {
    debug_assert_ne!(mask, 0xff, "no zero bit in {mask:#04x}");
    LUT[usize::from(!mask)] as u32
}

/// Get the position of the least significant set bit in `mask`.
///
/// `mask` must not be `0`. This is `first_zero_bit(!mask)`.
#[inline]
pub fn first_set_bit(mask: u8) -> u32 {
    debug_assert_ne!(mask, 0, "no set bit in {mask:#04x}");
    first_zero_bit(!mask)
}

/// Iterate over the positions of the set bits in `mask` in ascending order.
#[inline]
pub fn set_bits(mut mask: u8) -> impl Iterator<Item = u32> {
    core::iter::from_fn(move || {
        if mask == 0 {
            None
        } else {
            let i = first_set_bit(mask);
            mask &= mask - 1;
            Some(i)
        }
    })
}
