//! USB 3.0 force-enable patches for the `usb` system module.
//!
//! Each patch replaces the body of the routine that reports USB 3.0 support
//! with `mov w0, #1; ret`. Applied only when the persisted force-enable setting
//! is on (see [`crate::platform::Platform::is_usb30_force_enabled`]).
//!
//! The module ids and offsets below are illustrative placeholders, not taken
//! from any firmware build.

use super::{PatchEntry, PatchSet};
use crate::module_id::ModuleId;
use crate::utils::hex;

/// `mov w0, #1` / `ret`
const RETURN_TRUE: &[u8] = hex!("20008052C0035FD6");

const USB_9_0_0: &[PatchEntry] = &[
    PatchEntry::new(0x6DCC, RETURN_TRUE),
    PatchEntry::new(0x6E60, RETURN_TRUE),
];

const USB_10_0_0: &[PatchEntry] = &[
    PatchEntry::new(0x6E2C, RETURN_TRUE),
    PatchEntry::new(0x6EC0, RETURN_TRUE),
];

const USB_11_0_0: &[PatchEntry] = &[
    PatchEntry::new(0x6EE0, RETURN_TRUE),
    PatchEntry::new(0x6F74, RETURN_TRUE),
];

const USB_12_0_0: &[PatchEntry] = &[
    PatchEntry::new(0x70B4, RETURN_TRUE),
    PatchEntry::new(0x7148, RETURN_TRUE),
];

const USB_13_0_0: &[PatchEntry] = &[
    PatchEntry::new(0x7228, RETURN_TRUE),
    PatchEntry::new(0x72BC, RETURN_TRUE),
];

/// Force-enable patches keyed by `usb` module id.
pub const USB30_FORCE_ENABLE_PATCHES: &[PatchSet] = &[
    PatchSet {
        module_id: ModuleId::from_hex("C0D3F4E87E8B0FE9BBE9F1968A20767F"),
        entries: USB_9_0_0,
    },
    PatchSet {
        module_id: ModuleId::from_hex("B9C700CA8335F8BAA0D2041D8D09F772"),
        entries: USB_10_0_0,
    },
    PatchSet {
        module_id: ModuleId::from_hex("95BAF47EE4EFA15FFD1F9D0F8AF1E3AF"),
        entries: USB_11_0_0,
    },
    PatchSet {
        module_id: ModuleId::from_hex("EB1BE3DA2E4E7E7BB6B0BD71E06AD96A"),
        entries: USB_12_0_0,
    },
    PatchSet {
        module_id: ModuleId::from_hex("3D3C4F8E6A5AFC3F8D0EC16E1DEE2B57"),
        entries: USB_13_0_0,
    },
];
