//! Interfaces to the services the patcher depends on but does not implement.
//!
//! * [`Platform`] - SoC identification, the persisted USB 3.0 setting and the
//!   SD card mount service.
//! * [`PatchFileEngine`] - discovery and application of patch files stored on
//!   the SD card. Patch file formats are entirely its business.

use crate::Result;
use crate::module_id::ModuleId;

/// System-on-chip revision of the running console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocType {
    /// Original Tegra X1 (T210).
    Erista,
    /// Die-shrunk Tegra X1+ (T210B01).
    Mariko,
}

/// Platform queries and the SD card mount service.
///
/// Implementations are called from whichever loader thread is patching a
/// module; the patcher itself serialises the calls that need it.
pub trait Platform {
    /// SoC revision of the running console.
    fn soc_type(&self) -> SocType;

    /// Whether the persisted setting forcing USB 3.0 on is enabled.
    fn is_usb30_force_enabled(&self) -> bool;

    /// Whether the SD card driver has finished initialising. No mount is
    /// attempted before it has.
    fn is_sd_card_initialized(&self) -> bool;

    /// Mount the SD card under `mount_name`.
    fn mount_sd_card(&self, mount_name: &str) -> Result<()>;
}

/// Parameters handed to a [`PatchFileEngine`] for one module.
#[derive(Debug, Clone, Copy)]
pub struct PatchFileRequest<'a> {
    /// Mount the SD card was attached under.
    pub mount_name: &'a str,
    /// Directory (relative to the mount root) holding per-module patch folders.
    pub patch_dir: &'a str,
    /// Leading bytes of the image the engine must never write.
    pub protected_size: usize,
    /// Bias subtracted from patch offsets authored against the file layout.
    pub protected_offset: usize,
    /// Identity of the module being patched.
    pub module_id: &'a ModuleId,
}

/// External patch-file engine.
pub trait PatchFileEngine {
    /// Locate patches for `request.module_id` and apply them to `image`.
    ///
    /// Best effort: the engine absorbs its own failures.
    fn locate_and_apply(&self, request: &PatchFileRequest<'_>, image: &mut [u8]);
}
