//! Parsers for the executable formats the loader hands to the patcher.
//!
//! Parsers are generic over [`std::io::Read`] + [`std::io::Seek`] and read
//! only what they describe. Decompression lives in [`crate::compression`].
//!
//! | Module   | Format | Description |
//! |----------|--------|-------------|
//! | [`nso`]  | NSO    | System module / game executable; header, build id and segment mapping |

pub mod nso;
