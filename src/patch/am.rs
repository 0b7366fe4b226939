//! Vendor string patch for the `am` (applet manager) module.
//!
//! The module ids and offsets below are illustrative placeholders, not taken
//! from any firmware build. Replace them with values for the `am` builds being
//! targeted before shipping.

use super::{PatchEntry, PatchSet};
use crate::module_id::ModuleId;
use crate::utils::hex;

/// UTF-8 `"©Nintendo / OC Loader"`.
pub const AM_COPYRIGHT_PATCH: &[u8] = hex!("C2A94E696E74656E646F202F204F43204C6F61646572");

pub const AM_COPYRIGHT_PATCHES: &[PatchSet] = &[
    PatchSet {
        module_id: ModuleId::from_hex("8BD3A0CFC8E5A0A3B4F71D0D9E4C2F11"),
        entries: &[PatchEntry::new(0x1B4D30, AM_COPYRIGHT_PATCH)],
    },
    PatchSet {
        module_id: ModuleId::from_hex("46A1F7C0E2B39D584A6C0F1B2E3D4C5A"),
        entries: &[PatchEntry::new(0x1B8F10, AM_COPYRIGHT_PATCH)],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_is_the_expected_string() {
        assert_eq!(
            std::str::from_utf8(AM_COPYRIGHT_PATCH).unwrap(),
            "\u{a9}Nintendo / OC Loader"
        );
    }
}
