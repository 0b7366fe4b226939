//! Low-level primitives shared by the parsers and the embedded patch tables.
//!
//! The hexadecimal decoders are `const fn`s: patch payloads and module ids are
//! authored as hex text and decoded during constant evaluation, so a malformed
//! string fails the build instead of reaching a running loader.

use std::io::Read;

use crate::{Error, Result};

/// Decode one hexadecimal digit.
///
/// # Panics
/// Panics (at compile time when const-evaluated) if `c` is not in
/// `[0-9A-Fa-f]`.
pub(crate) const fn parse_nybble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'A'..=b'F' => c - b'A' + 0xA,
        b'a'..=b'f' => c - b'a' + 0xa,
        _ => panic!("invalid hexadecimal digit"),
    }
}

/// Decode exactly `2 * N` hexadecimal digits into `N` bytes, high nibble first.
///
/// # Panics
/// Panics if the length is wrong or a character is outside the hex alphabet.
pub(crate) const fn decode_hex<const N: usize>(s: &str) -> [u8; N] {
    let s = s.as_bytes();
    assert!(s.len() == N * 2, "hexadecimal string has the wrong length");

    let mut out = [0u8; N];
    let mut i = 0;
    while i < N {
        out[i] = (parse_nybble(s[2 * i]) << 4) | parse_nybble(s[2 * i + 1]);
        i += 1;
    }
    out
}

/// Turn a hex string literal into a `&'static [u8]` during constant evaluation.
macro_rules! hex {
    ($s:literal) => {{
        const S: &str = $s;
        const OUT: [u8; S.len() / 2] = $crate::utils::decode_hex(S);
        &OUT
    }};
}
pub(crate) use hex;

/// Read a little-endian `u32`.
#[inline]
pub(crate) fn le_u32<R: Read>(r: &mut R) -> Result<u32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(u32::from_le_bytes(b))
}

/// Read exactly `N` bytes into a fixed-size array.
#[inline]
pub(crate) fn bytesa<const N: usize>(r: &mut impl Read) -> Result<[u8; N]> {
    let mut b = [0u8; N];
    r.read_exact(&mut b)?;
    Ok(b)
}

/// Verify that the next `N` bytes in the stream match `expected`.
///
/// Returns [`Error::BadMagic`] on mismatch.
#[inline]
pub(crate) fn magic<R: Read, const N: usize>(r: &mut R, expected: &[u8; N]) -> Result<()> {
    let got = bytesa::<N>(r)?;
    if &got != expected {
        return Err(Error::BadMagic);
    }
    Ok(())
}

/// Round `value` up to the next multiple of `align` (a power of two).
#[inline]
pub(crate) const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}
