//! Module identity.
//!
//! Every executable module carries a build id in its header. The loader hands
//! the leading [`MODULE_ID_SIZE`] bytes of it to the patcher, and every patch
//! table is keyed by that value. Matching is byte-exact; there is no prefix or
//! partial matching.

use std::fmt;

use crate::utils::decode_hex;

/// Size in bytes of a [`ModuleId`].
pub const MODULE_ID_SIZE: usize = 0x10;

/// Fixed-width identity of an executable module.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ModuleId(pub [u8; MODULE_ID_SIZE]);

impl ModuleId {
    /// Wrap raw identity bytes.
    pub const fn new(data: [u8; MODULE_ID_SIZE]) -> Self {
        Self(data)
    }

    /// Build an id from the leading bytes of a longer build id.
    ///
    /// Returns [`None`] if `data` is shorter than [`MODULE_ID_SIZE`].
    pub fn from_slice(data: &[u8]) -> Option<Self> {
        let head = data.get(..MODULE_ID_SIZE)?;
        let mut id = [0u8; MODULE_ID_SIZE];
        id.copy_from_slice(head);
        Some(Self(id))
    }

    /// Parse an id from exactly 32 hexadecimal characters.
    ///
    /// Intended for constant tables; an invalid string is a build error there.
    pub const fn from_hex(s: &str) -> Self {
        Self(decode_hex::<MODULE_ID_SIZE>(s))
    }

    /// Raw identity bytes.
    pub const fn as_bytes(&self) -> &[u8; MODULE_ID_SIZE] {
        &self.0
    }
}

impl From<[u8; MODULE_ID_SIZE]> for ModuleId {
    fn from(data: [u8; MODULE_ID_SIZE]) -> Self {
        Self(data)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleId({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: ModuleId = ModuleId::from_hex("0123456789ABCDEFFEDCBA9876543210");

    #[test]
    fn from_hex_matches_bytes() {
        assert_eq!(
            ID.as_bytes(),
            &[
                0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0xFE, 0xDC, 0xBA, 0x98, 0x76, 0x54,
                0x32, 0x10
            ]
        );
    }

    #[test]
    fn single_byte_difference_is_not_equal() {
        let mut raw = *ID.as_bytes();
        raw[15] ^= 1;
        assert_ne!(ModuleId::new(raw), ID);
    }

    #[test]
    fn from_slice_takes_leading_bytes() {
        let mut build_id = [0u8; 0x20];
        build_id[..MODULE_ID_SIZE].copy_from_slice(ID.as_bytes());
        build_id[0x1F] = 0xFF;
        assert_eq!(ModuleId::from_slice(&build_id), Some(ID));
        assert_eq!(ModuleId::from_slice(&build_id[..4]), None);
    }

    #[test]
    fn displays_as_upper_hex() {
        assert_eq!(ID.to_string(), "0123456789ABCDEFFEDCBA9876543210");
    }
}
