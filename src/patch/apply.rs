//! Bounded writes into a mapped image.
//!
//! A write is performed only when `[offset, offset + size)` lies entirely inside
//! the image. Anything else is skipped without touching a single byte and
//! without aborting sibling entries. Skips are not errors; the
//! [`Outcome`] exists for logging.

use log::{debug, trace};

use super::PatchEntry;

/// Result of a single write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Skipped,
}

/// Running count of write outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub applied: usize,
    pub skipped: usize,
}

impl Tally {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Applied => self.applied += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }

    pub fn merge(&mut self, other: Tally) {
        self.applied += other.applied;
        self.skipped += other.skipped;
    }
}

/// Copy `data` into `image` at `offset` if it fits.
pub fn write_bytes(image: &mut [u8], offset: usize, data: &[u8]) -> Outcome {
    let Some(end) = offset.checked_add(data.len()) else {
        debug!("patch at {offset:#x} overflows the address space, skipped");
        return Outcome::Skipped;
    };
    match image.get_mut(offset..end) {
        Some(dst) => {
            dst.copy_from_slice(data);
            trace!("patched {:#x} bytes at {offset:#x}", data.len());
            Outcome::Applied
        }
        None => {
            debug!(
                "patch {offset:#x}..{end:#x} exceeds image size {:#x}, skipped",
                image.len()
            );
            Outcome::Skipped
        }
    }
}

/// Apply one entry.
#[inline]
pub fn apply_entry(entry: &PatchEntry, image: &mut [u8]) -> Outcome {
    write_bytes(image, entry.offset, entry.data)
}

/// Apply `entries` in order.
pub fn apply_entries(entries: &[PatchEntry], image: &mut [u8]) -> Tally {
    let mut tally = Tally::default();
    for entry in entries {
        tally.record(apply_entry(entry, image));
    }
    tally
}
