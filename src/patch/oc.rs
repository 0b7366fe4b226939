//! Mariko clock and voltage patches.
//!
//! Two module families are touched:
//!
//! * **pcv** (power control): new CPU/GPU DVFS tables are written into unused
//!   space, the maximum CPU clock and GPU clock limits are raised, the CPU
//!   voltage ceiling and an old voltage-table coefficient are replaced, and
//!   every memory-clock table entry is set to the configured EMC clock (kHz).
//! * **ptm** (performance management): the memory clock words of every
//!   performance configuration and the CPU clock words of the boost
//!   configurations are rewritten (Hz).
//!
//! Offsets differ per firmware, so each family has one site description per
//! module id. The ids, offsets, DVFS blobs and register encodings in this file
//! are illustrative placeholders, not taken from any firmware build; they
//! exercise the patch paths and must be replaced with real per-firmware data.
//!
//! All values are little-endian and unconditionally overwrite what is in the
//! image.

use log::debug;

use super::PatchEntry;
use super::apply::{Tally, write_bytes};
use crate::module_id::ModuleId;
use crate::utils::hex;

/// New CPU DVFS entries (2193 / 2295 / 2397 MHz): `u32` kHz followed by five
/// `i32` coefficients each.
pub const NEW_CPU_TABLES: &[u8] = hex!(
    "68762100E63D1A00F065FFFF1B0000000000000000000000\
     D8042300C04E1B00B95FFFFF1C0000000000000000000000\
     489324009A5F1C008259FFFF1D0000000000000000000000"
);

/// New GPU DVFS entries (1305.6 / 1344 / 1382.4 MHz), same layout as
/// [`NEW_CPU_TABLES`].
pub const NEW_GPU_TABLES: &[u8] = hex!(
    "00EC13003074150068C5FFFF000000000000000000000000\
     008214004018160074C3FFFF000000000000000000000000\
     0018150050BC160080C1FFFF000000000000000000000000"
);

pub const NEW_MAX_CPU_CLOCK_KHZ: u32 = 2_397_000;
pub const NEW_CPU_VOLTAGE_LIMIT_MV: u32 = 1235;
pub const NEW_CPU_VOLTAGE_COEFF: u32 = 1_235_000;

// GPU limit 1382400 kHz = 0x00151800, loaded as movz/movk pairs.
const MOVZ_W8_GPU_LO: &[u8] = hex!("08008352");
const MOVK_W8_GPU_HI: &[u8] = hex!("A802A072");
const MOVZ_W9_GPU_LO: &[u8] = hex!("09008352");
const MOVK_W9_GPU_HI: &[u8] = hex!("A902A072");

/// Patch locations inside one pcv build.
#[derive(Debug, Clone, Copy)]
pub struct PcvPatchSite {
    pub module_id: ModuleId,
    /// Unused space receiving [`NEW_CPU_TABLES`].
    pub cpu_tables_free_space: usize,
    /// Unused space receiving [`NEW_GPU_TABLES`].
    pub gpu_tables_free_space: usize,
    pub max_cpu_clock: usize,
    /// Instruction pair loading the maximum GPU clock.
    pub max_gpu_clock: [PatchEntry; 2],
    pub cpu_voltage_limit: &'static [usize],
    pub cpu_voltage_coeff: &'static [usize],
    pub emc_freq: &'static [usize],
}

pub const PCV_PATCH_SITES: &[PcvPatchSite] = &[
    PcvPatchSite {
        module_id: ModuleId::from_hex("3C9D4D0F1D3E1A6B0A8E2A5F87C3B0E1"),
        cpu_tables_free_space: 0xE1B10,
        gpu_tables_free_space: 0xE2A40,
        max_cpu_clock: 0x53E70,
        max_gpu_clock: [
            PatchEntry::new(0x5DA08, MOVZ_W8_GPU_LO),
            PatchEntry::new(0x5DA0C, MOVK_W8_GPU_HI),
        ],
        cpu_voltage_limit: &[0xDB0C8, 0xDB0F8, 0xDB128],
        cpu_voltage_coeff: &[0xDA2D0, 0xDA310],
        emc_freq: &[0xE0CF0, 0xE1B00, 0xE60A0],
    },
    PcvPatchSite {
        module_id: ModuleId::from_hex("7E7A2B3F0A4C5D1E9B8C6A2F10D3E4C5"),
        cpu_tables_free_space: 0xE4C20,
        gpu_tables_free_space: 0xE5B50,
        max_cpu_clock: 0x54F80,
        max_gpu_clock: [
            PatchEntry::new(0x5EB18, MOVZ_W8_GPU_LO),
            PatchEntry::new(0x5EB1C, MOVK_W8_GPU_HI),
        ],
        cpu_voltage_limit: &[0xDE1D8, 0xDE208, 0xDE238],
        cpu_voltage_coeff: &[0xDD3E0, 0xDD420],
        emc_freq: &[0xE3E00, 0xE4C10, 0xE91B0],
    },
    PcvPatchSite {
        module_id: ModuleId::from_hex("A1F08E4D2C6B3957E0D4C3B2A1908F7E"),
        cpu_tables_free_space: 0xE6D30,
        gpu_tables_free_space: 0xE7C60,
        max_cpu_clock: 0x55A90,
        max_gpu_clock: [
            PatchEntry::new(0x5F628, MOVZ_W9_GPU_LO),
            PatchEntry::new(0x5F62C, MOVK_W9_GPU_HI),
        ],
        cpu_voltage_limit: &[0xE02E8, 0xE0318, 0xE0348],
        cpu_voltage_coeff: &[0xDF4F0, 0xDF530],
        emc_freq: &[0xE5F10, 0xE6D20, 0xEB2C0],
    },
];

/// Distance between consecutive ptm performance configurations.
pub const PTM_OFFSET_INTERVAL: usize = 0x20;
/// Distance from the first memory clock word to the first boost CPU clock word.
pub const PTM_CPU_BOOST_OFFSET: usize = 0x200;
pub const PTM_EMC_CONFIG_COUNT: usize = 16;
pub const PTM_BOOST_CONFIG_COUNT: usize = 2;

/// Patch location inside one ptm build.
#[derive(Debug, Clone, Copy)]
pub struct PtmPatchSite {
    pub module_id: ModuleId,
    /// First memory clock word of the first performance configuration.
    pub emc_offset_start: usize,
}

pub const PTM_PATCH_SITES: &[PtmPatchSite] = &[
    PtmPatchSite {
        module_id: ModuleId::from_hex("D3B6E1A05C4F2E8D7A9B1C3E5F60718A"),
        emc_offset_start: 0x39A54,
    },
    PtmPatchSite {
        module_id: ModuleId::from_hex("0F1E2D3C4B5A69788796A5B4C3D2E1F0"),
        emc_offset_start: 0x3A0C4,
    },
];

fn write_u32(image: &mut [u8], offset: usize, value: u32) -> Tally {
    let mut tally = Tally::default();
    tally.record(write_bytes(image, offset, &value.to_le_bytes()));
    tally
}

fn write_u32_at(image: &mut [u8], offsets: &[usize], value: u32) -> Tally {
    let mut tally = Tally::default();
    for &offset in offsets {
        tally.merge(write_u32(image, offset, value));
    }
    tally
}

/// Apply every pcv site matching `module_id`.
pub fn apply_pcv(module_id: &ModuleId, image: &mut [u8], emc_clock_khz: u32) -> Tally {
    let mut tally = Tally::default();
    for site in PCV_PATCH_SITES.iter().filter(|s| s.module_id == *module_id) {
        tally.record(write_bytes(image, site.cpu_tables_free_space, NEW_CPU_TABLES));
        tally.record(write_bytes(image, site.gpu_tables_free_space, NEW_GPU_TABLES));

        tally.merge(write_u32(image, site.max_cpu_clock, NEW_MAX_CPU_CLOCK_KHZ));
        for entry in &site.max_gpu_clock {
            tally.record(super::apply_entry(entry, image));
        }

        tally.merge(write_u32_at(image, site.cpu_voltage_limit, NEW_CPU_VOLTAGE_LIMIT_MV));
        tally.merge(write_u32_at(image, site.cpu_voltage_coeff, NEW_CPU_VOLTAGE_COEFF));

        tally.merge(write_u32_at(image, site.emc_freq, emc_clock_khz));
    }
    tally
}

/// Apply every ptm site matching `module_id`.
pub fn apply_ptm(
    module_id: &ModuleId,
    image: &mut [u8],
    emc_clock_khz: u32,
    cpu_boost_clock_khz: u32,
) -> Tally {
    let mut tally = Tally::default();
    let (Some(emc_hz), Some(boost_hz)) = (
        emc_clock_khz.checked_mul(1000),
        cpu_boost_clock_khz.checked_mul(1000),
    ) else {
        debug!("ptm clocks {emc_clock_khz} / {cpu_boost_clock_khz} kHz overflow Hz, skipped");
        return tally;
    };

    for site in PTM_PATCH_SITES.iter().filter(|s| s.module_id == *module_id) {
        for j in 0..PTM_EMC_CONFIG_COUNT {
            let offset = site.emc_offset_start + PTM_OFFSET_INTERVAL * j;
            tally.merge(write_u32(image, offset, emc_hz));
            tally.merge(write_u32(image, offset + 4, emc_hz));
        }
        for j in 0..PTM_BOOST_CONFIG_COUNT {
            let offset = site.emc_offset_start + PTM_CPU_BOOST_OFFSET + PTM_OFFSET_INTERVAL * j;
            tally.merge(write_u32(image, offset, boost_hz));
            tally.merge(write_u32(image, offset + 4, boost_hz));
        }
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_u32(image: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(image[offset..offset + 4].try_into().unwrap())
    }

    fn pcv_image_size(site: &PcvPatchSite) -> usize {
        let mut end = site.cpu_tables_free_space + NEW_CPU_TABLES.len();
        end = end.max(site.gpu_tables_free_space + NEW_GPU_TABLES.len());
        end = end.max(site.max_cpu_clock + 4);
        for e in &site.max_gpu_clock {
            end = end.max(e.offset + e.size());
        }
        for &o in site
            .cpu_voltage_limit
            .iter()
            .chain(site.cpu_voltage_coeff)
            .chain(site.emc_freq)
        {
            end = end.max(o + 4);
        }
        end
    }

    #[test]
    fn tables_have_whole_entries() {
        assert_eq!(NEW_CPU_TABLES.len() % 0x18, 0);
        assert_eq!(NEW_GPU_TABLES.len() % 0x18, 0);
    }

    #[test]
    fn pcv_writes_every_location() {
        let site = &PCV_PATCH_SITES[1];
        let mut image = vec![0u8; pcv_image_size(site)];
        let tally = apply_pcv(&site.module_id, &mut image, 1_996_800);
        assert_eq!(tally.skipped, 0);

        let at = site.cpu_tables_free_space;
        assert_eq!(&image[at..at + NEW_CPU_TABLES.len()], NEW_CPU_TABLES);
        let at = site.gpu_tables_free_space;
        assert_eq!(&image[at..at + NEW_GPU_TABLES.len()], NEW_GPU_TABLES);
        assert_eq!(read_u32(&image, site.max_cpu_clock), NEW_MAX_CPU_CLOCK_KHZ);
        for e in &site.max_gpu_clock {
            assert_eq!(&image[e.offset..e.offset + e.size()], e.data);
        }
        for &o in site.cpu_voltage_limit {
            assert_eq!(read_u32(&image, o), NEW_CPU_VOLTAGE_LIMIT_MV);
        }
        for &o in site.cpu_voltage_coeff {
            assert_eq!(read_u32(&image, o), NEW_CPU_VOLTAGE_COEFF);
        }
        for &o in site.emc_freq {
            assert_eq!(read_u32(&image, o), 1_996_800);
        }
    }

    /// Every write a pcv site performs, as `(offset, bytes)`.
    fn pcv_writes(site: &PcvPatchSite, emc_clock_khz: u32) -> Vec<(usize, Vec<u8>)> {
        let mut writes = vec![
            (site.cpu_tables_free_space, NEW_CPU_TABLES.to_vec()),
            (site.gpu_tables_free_space, NEW_GPU_TABLES.to_vec()),
            (site.max_cpu_clock, NEW_MAX_CPU_CLOCK_KHZ.to_le_bytes().to_vec()),
        ];
        for e in &site.max_gpu_clock {
            writes.push((e.offset, e.data.to_vec()));
        }
        let words = [
            (site.cpu_voltage_limit, NEW_CPU_VOLTAGE_LIMIT_MV),
            (site.cpu_voltage_coeff, NEW_CPU_VOLTAGE_COEFF),
            (site.emc_freq, emc_clock_khz),
        ];
        for (offsets, value) in words {
            for &o in offsets {
                writes.push((o, value.to_le_bytes().to_vec()));
            }
        }
        writes
    }

    #[test]
    fn pcv_one_byte_short_skips_only_the_last_write() {
        let site = &PCV_PATCH_SITES[0];
        let size = pcv_image_size(site);
        let mut image = vec![0u8; size - 1];
        let tally = apply_pcv(&site.module_id, &mut image, 1_862_400);

        let writes = pcv_writes(site, 1_862_400);
        let (fits, past_end): (Vec<_>, Vec<_>) = writes
            .iter()
            .partition(|(o, bytes)| o + bytes.len() <= image.len());
        assert_eq!(past_end.len(), 1);
        assert_eq!(tally, Tally { applied: fits.len(), skipped: 1 });

        for (o, bytes) in fits {
            assert_eq!(&image[*o..o + bytes.len()], &bytes[..]);
        }
        let (o, _) = past_end[0];
        assert!(image[*o..].iter().all(|&b| b == 0));
    }

    #[test]
    fn ptm_writes_hz() {
        let site = &PTM_PATCH_SITES[0];
        let end = site.emc_offset_start
            + PTM_CPU_BOOST_OFFSET
            + PTM_OFFSET_INTERVAL * (PTM_BOOST_CONFIG_COUNT - 1)
            + 8;
        let mut image = vec![0u8; end];
        apply_ptm(&site.module_id, &mut image, 1_862_400, 1_963_500);

        for j in 0..PTM_EMC_CONFIG_COUNT {
            let o = site.emc_offset_start + PTM_OFFSET_INTERVAL * j;
            assert_eq!(read_u32(&image, o), 1_862_400_000);
            assert_eq!(read_u32(&image, o + 4), 1_862_400_000);
        }
        for j in 0..PTM_BOOST_CONFIG_COUNT {
            let o = site.emc_offset_start + PTM_CPU_BOOST_OFFSET + PTM_OFFSET_INTERVAL * j;
            assert_eq!(read_u32(&image, o), 1_963_500_000);
            assert_eq!(read_u32(&image, o + 4), 1_963_500_000);
        }
    }

    #[test]
    fn ptm_one_byte_short_keeps_last_boost_word() {
        let site = &PTM_PATCH_SITES[1];
        let last = site.emc_offset_start
            + PTM_CPU_BOOST_OFFSET
            + PTM_OFFSET_INTERVAL * (PTM_BOOST_CONFIG_COUNT - 1)
            + 4;
        let mut image = vec![0u8; last + 4 - 1];
        let tally = apply_ptm(&site.module_id, &mut image, 1_862_400, 1_963_500);

        let writes = PTM_EMC_CONFIG_COUNT * 2 + PTM_BOOST_CONFIG_COUNT * 2;
        assert_eq!(tally, Tally { applied: writes - 1, skipped: 1 });
        assert_eq!(read_u32(&image, last - 4), 1_963_500_000);
        assert!(image[last..].iter().all(|&b| b == 0));
    }

    #[test]
    fn ptm_overflowing_clock_is_skipped() {
        let site = &PTM_PATCH_SITES[0];
        let mut image = vec![0u8; site.emc_offset_start + 0x400];
        let tally = apply_ptm(&site.module_id, &mut image, 1_862_400, 5_000_000);
        assert_eq!(tally, Tally::default());
        assert!(image.iter().all(|&b| b == 0));

        let tally = apply_ptm(&site.module_id, &mut image, u32::MAX, 1_963_500);
        assert_eq!(tally, Tally::default());
        assert!(image.iter().all(|&b| b == 0));
    }

    #[test]
    fn other_ids_are_untouched() {
        let mut image = vec![0u8; 0x100000];
        let id = ModuleId::new([0x5A; 16]);
        assert_eq!(apply_pcv(&id, &mut image, 1_862_400), Tally::default());
        assert_eq!(apply_ptm(&id, &mut image, 1_862_400, 1_963_500), Tally::default());
        assert!(image.iter().all(|&b| b == 0));
    }
}
