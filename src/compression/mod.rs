//! Decompression helpers (requires the `compression` feature).
//!
//! Gated behind the `compression` Cargo feature so that the patch engine
//! itself compiles without it. Enable it to map compressed NSO files:
//!
//! ```toml
//! [dependencies]
//! ldrpatch = { version = "0.1", features = ["compression"] }
//! ```
//!
//! | Module | Algorithm | Use |
//! |--------|-----------|-----|
//! | [`lz4`] | LZ4 block | NSO text/ro/data segments, see [`crate::formats::nso`] |

#[cfg(feature = "compression")]
pub mod lz4;
