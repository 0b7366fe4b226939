//! LZ4 decompression (requires the `compression` feature).
//!
//! NSO segments are stored as **raw LZ4 blocks**: no frame header and no
//! size prefix. The decompressed size comes from the segment descriptor, so
//! the block is decoded straight into its slot in the mapped image.

#![cfg(feature = "compression")]

use crate::{Error, Result};

/// Decompress a raw LZ4 block into `dst`, which must be exactly the
/// decompressed size.
///
/// Returns [`Error::Lz4`] on any decompression failure or if the block
/// decodes to fewer bytes than `dst` holds.
pub fn decompress_lz4_block(src: &[u8], dst: &mut [u8]) -> Result<()> {
    let written = lz4_flex::block::decompress_into(src, dst).map_err(|_| Error::Lz4)?;
    if written != dst.len() {
        return Err(Error::Lz4);
    }
    Ok(())
}
