//! Embedded patch tables and the bounded write primitive.
//!
//! Embedded patches are compiled into the loader. Every table is a small
//! constant slice keyed by [`ModuleId`] and searched linearly; a module may match
//! entries in several tables and every match is applied.
//!
//! All writes go through [`apply::apply_entry`], which refuses any entry that
//! does not lie entirely inside the mapped image.
//!
//! | Module  | Family | Condition |
//! |---------|--------|-----------|
//! | [`usb`] | USB 3.0 force-enable | persisted setting enabled |
//! | [`oc`]  | pcv clock/voltage tables, ptm clocks | Mariko SoC, memory clock set |
//! | [`am`]  | Vendor string | always |

pub mod am;
pub mod apply;
pub mod oc;
pub mod usb;

use crate::module_id::ModuleId;

pub use apply::{Outcome, Tally, apply_entries, apply_entry};

/// One contiguous write into a mapped image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchEntry {
    /// Offset from the start of the mapped image.
    pub offset: usize,
    /// Bytes to write.
    pub data: &'static [u8],
}

impl PatchEntry {
    pub const fn new(offset: usize, data: &'static [u8]) -> Self {
        Self { offset, data }
    }

    /// Number of bytes written.
    #[inline]
    pub const fn size(&self) -> usize {
        self.data.len()
    }
}

/// Ordered writes for one module.
#[derive(Debug, Clone, Copy)]
pub struct PatchSet {
    pub module_id: ModuleId,
    pub entries: &'static [PatchEntry],
}

/// Every set in `table` whose module id equals `module_id`, in table order.
pub fn matching<'t>(
    table: &'t [PatchSet],
    module_id: &ModuleId,
) -> impl Iterator<Item = &'t PatchSet> {
    table.iter().filter(move |set| set.module_id == *module_id)
}
