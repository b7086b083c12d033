//! Fixed-width bit-pattern helpers
//!
//! Values are carried as raw two's-complement patterns in a `u128`, which
//! leaves headroom for the one-bit growth of a 64-bit addition.

/// All-ones mask for `width` bits
pub fn mask(width: usize) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

/// Keep the low `width` bits of a pattern
pub fn truncate(bits: u128, width: usize) -> u128 {
    bits & mask(width)
}

/// Encode a signed value as a `width`-bit pattern
pub fn from_signed(value: i128, width: usize) -> u128 {
    truncate(value as u128, width)
}

/// Interpret a `width`-bit pattern as two's complement
pub fn sign_extend(bits: u128, width: usize) -> i128 {
    if width == 0 {
        return 0;
    }
    let bits = truncate(bits, width);
    if width < 128 && (bits >> (width - 1)) & 1 == 1 {
        (bits | !mask(width)) as i128
    } else {
        bits as i128
    }
}

/// Resize a pattern, sign-extending when `signed`
pub fn resize(bits: u128, from_width: usize, to_width: usize, signed: bool) -> u128 {
    if signed {
        from_signed(sign_extend(bits, from_width), to_width)
    } else {
        truncate(truncate(bits, from_width), to_width)
    }
}
