//! **ldrpatch** - module patch engine for Nintendo Switch custom firmware
//! loaders.
//!
//! After the loader maps an executable module, [`patcher::Patcher`] decides
//! which bytes of the mapped image to overwrite:
//!
//! * **External patches** from the SD card, handed to a
//!   [`platform::PatchFileEngine`] together with the module id and the header
//!   region it must not touch.
//! * **Embedded patches** compiled into the library, selected by module id and
//!   SoC revision.
//!
//! Every embedded write is bounds-checked against the mapped size; anything
//! out of range is skipped. Neither entry point can fail.
//!
//! # Modules
//! | Module | Contents |
//! |--------|----------|
//! | [`patcher`]   | Entry points and the lazily initialised SD mount / setting caches |
//! | [`patch`]     | Embedded tables (USB 3.0, clocks, vendor string) and the bounded applier |
//! | [`module_id`] | Fixed-width module identity |
//! | [`cache`]     | Mutex-guarded get-or-compute cell |
//! | [`platform`]  | Collaborator traits: SoC/settings/SD services, patch-file engine |
//! | [`config`]    | Clock targets |
//! | [`formats::nso`] | NSO header parsing and image mapping |

pub mod cache;
pub mod compression;
pub mod config;
pub mod error;
pub mod formats;
pub mod module_id;
pub mod patch;
pub mod patcher;
pub mod platform;
pub mod utils;

pub use error::{Error, Result};
pub use module_id::{MODULE_ID_SIZE, ModuleId};
pub use patcher::Patcher;
