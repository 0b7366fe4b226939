//! The loader-facing patch engine.
//!
//! A [`Patcher`] is created once per loader process and shared by every thread
//! that maps modules. Each mapped module goes through two independent entry
//! points:
//!
//! * [`Patcher::locate_and_apply_external_patches`] - patch files from the SD
//!   card, delegated to a [`PatchFileEngine`].
//! * [`Patcher::apply_embedded_patches`] - the tables in [`crate::patch`].
//!
//! Neither returns anything. Patching is opportunistic: an unavailable SD card,
//! an unknown module or an out-of-range entry all degrade to doing less, never
//! to a failed load.
//!
//! The only mutable shared state is two [`LazyValue`] caches: the SD card mount
//! (retried until it succeeds) and the USB 3.0 setting (queried once).

use log::debug;

use crate::cache::LazyValue;
use crate::config::PatchConfig;
use crate::formats::nso::NSO_HEADER_SIZE;
use crate::module_id::{MODULE_ID_SIZE, ModuleId};
use crate::patch::{self, Tally, am, oc, usb};
use crate::platform::{PatchFileEngine, PatchFileRequest, Platform, SocType};
use crate::{Error, Result};

/// Directory on the SD card holding per-module patch folders.
pub const PATCH_DIRECTORY: &str = "exefs_patches";

/// Reserved mount name for the patcher's private SD card mount.
pub const SD_MOUNT_NAME: &str = "#ldrpatch-sd";

/// Longest mount name the filesystem service accepts.
pub const MOUNT_NAME_LENGTH_MAX: usize = 15;

const _: () = assert!(SD_MOUNT_NAME.len() <= MOUNT_NAME_LENGTH_MAX);

/// Patch files must not touch the module header, and their offsets are
/// relative to the mapped image rather than the file.
pub const PROTECTED_SIZE: usize = NSO_HEADER_SIZE;
pub const PROTECTED_OFFSET: usize = NSO_HEADER_SIZE;

/// SoC revision the clock tables were authored for.
pub const CLOCK_PATCH_SOC: SocType = SocType::Mariko;

/// Module patch engine.
#[derive(Debug)]
pub struct Patcher<P, E> {
    platform: P,
    engine: E,
    config: PatchConfig,
    sd_mounted: LazyValue<()>,
    usb30_force_enabled: LazyValue<bool>,
}

impl<P: Platform, E: PatchFileEngine> Patcher<P, E> {
    /// Create a patcher with the default clock targets.
    pub fn new(platform: P, engine: E) -> Self {
        Self::with_config(platform, engine, PatchConfig::default())
    }

    pub fn with_config(platform: P, engine: E, config: PatchConfig) -> Self {
        Self {
            platform,
            engine,
            config,
            sd_mounted: LazyValue::new(),
            usb30_force_enabled: LazyValue::new(),
        }
    }

    pub fn config(&self) -> &PatchConfig {
        &self.config
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mount the SD card if it is not mounted yet.
    ///
    /// A failed attempt is not remembered; the next call tries again.
    pub fn ensure_sd_card_mounted(&self) -> bool {
        let mounted = self.sd_mounted.get_or_try_compute(|| -> Result<()> {
            if !self.platform.is_sd_card_initialized() {
                return Err(Error::Unavailable("sd card not initialized"));
            }
            self.platform.mount_sd_card(SD_MOUNT_NAME)?;
            debug!("mounted sd card as {SD_MOUNT_NAME}");
            Ok(())
        });
        match mounted {
            Ok(()) => true,
            Err(e) => {
                debug!("sd card mount failed: {e}");
                false
            }
        }
    }

    /// Persisted USB 3.0 force-enable setting, queried once.
    pub fn is_usb30_force_enabled(&self) -> bool {
        self.usb30_force_enabled.get_or_compute(|| {
            let enabled = self.platform.is_usb30_force_enabled();
            debug!("usb 3.0 force-enable setting: {enabled}");
            enabled
        })
    }

    /// Hand the module to the external patch-file engine.
    ///
    /// No-op while the SD card cannot be mounted.
    pub fn locate_and_apply_external_patches(
        &self,
        module_id_data: &[u8; MODULE_ID_SIZE],
        image: &mut [u8],
    ) {
        if !self.ensure_sd_card_mounted() {
            return;
        }

        let module_id = ModuleId::new(*module_id_data);
        let request = PatchFileRequest {
            mount_name: SD_MOUNT_NAME,
            patch_dir: PATCH_DIRECTORY,
            protected_size: PROTECTED_SIZE,
            protected_offset: PROTECTED_OFFSET,
            module_id: &module_id,
        };
        self.engine.locate_and_apply(&request, image);
    }

    /// Apply every embedded patch family matching the module.
    ///
    /// Families run in a fixed order: USB force-enable, pcv clocks, ptm clocks,
    /// vendor string.
    pub fn apply_embedded_patches(&self, module_id_data: &[u8; MODULE_ID_SIZE], image: &mut [u8]) {
        let module_id = ModuleId::new(*module_id_data);
        let mut tally = Tally::default();

        if self.is_usb30_force_enabled() {
            for set in patch::matching(usb::USB30_FORCE_ENABLE_PATCHES, &module_id) {
                debug!("{module_id}: applying usb 3.0 force-enable patch");
                tally.merge(patch::apply_entries(set.entries, image));
            }
        }

        let emc_clock_khz = self.config.emc_clock_khz;
        if self.config.clock_patches_enabled() && self.platform.soc_type() == CLOCK_PATCH_SOC {
            tally.merge(oc::apply_pcv(&module_id, image, emc_clock_khz));
            tally.merge(oc::apply_ptm(
                &module_id,
                image,
                emc_clock_khz,
                self.config.cpu_boost_clock_khz,
            ));
        }

        for set in patch::matching(am::AM_COPYRIGHT_PATCHES, &module_id) {
            debug!("{module_id}: applying vendor string patch");
            tally.merge(patch::apply_entries(set.entries, image));
        }

        if tally != Tally::default() {
            debug!(
                "{module_id}: {} embedded writes applied, {} skipped",
                tally.applied, tally.skipped
            );
        }
    }

    /// External then embedded patching, the order the loader uses.
    pub fn patch_module(&self, module_id_data: &[u8; MODULE_ID_SIZE], image: &mut [u8]) {
        self.locate_and_apply_external_patches(module_id_data, image);
        self.apply_embedded_patches(module_id_data, image);
    }
}
