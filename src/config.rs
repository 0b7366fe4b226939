//! Clock targets used by the embedded hardware-tuning patches.
//!
//! The defaults are the values the embedded tables were authored against.
//! A loader that wants different targets can read them from a small text file.
//!
//! ## File format
//! `name = value` lines, one entry per line, comments prefixed with `;`.
//! Values are decimal or `0x`-prefixed hexadecimal kHz, small enough to be
//! expressed in Hz as a `u32`.
//!
//! ```text
//! ; LPDDR4X target, kHz
//! emc_clock_khz = 1862400
//! cpu_boost_clock_khz = 1963500
//! ```
//!
//! Memory overclocking can be unstable on some RAM without a voltage bump.
//! Setting `emc_clock_khz = 0` disables every clock patch.

use std::io::{BufRead, BufReader, Read};

use crate::{Error, Result};

/// Default memory (EMC) clock, kHz.
pub const DEFAULT_EMC_CLOCK_KHZ: u32 = 1_862_400;

/// Default CPU boost clock, kHz.
pub const DEFAULT_CPU_BOOST_CLOCK_KHZ: u32 = 1_963_500;

/// Clock targets for the hardware-clock patch families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchConfig {
    /// Memory clock written into the power-control tables, kHz. Zero disables
    /// the clock families.
    pub emc_clock_khz: u32,
    /// CPU clock used for boost-mode performance configurations, kHz.
    pub cpu_boost_clock_khz: u32,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            emc_clock_khz: DEFAULT_EMC_CLOCK_KHZ,
            cpu_boost_clock_khz: DEFAULT_CPU_BOOST_CLOCK_KHZ,
        }
    }
}

impl PatchConfig {
    /// Whether the clock families should run at all.
    pub fn clock_patches_enabled(&self) -> bool {
        self.emc_clock_khz != 0
    }

    /// Load a configuration, starting from the defaults.
    ///
    /// Unknown names are skipped. A known name with an unparsable value is an
    /// error rather than a silent fallback.
    pub fn load<R: Read>(reader: R) -> Result<Self> {
        let mut config = Self::default();
        let buf = BufReader::new(reader);
        for line in buf.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            let Some((name, value)) = line.split_once('=') else {
                continue;
            };
            let slot = match name.trim() {
                "emc_clock_khz" => &mut config.emc_clock_khz,
                "cpu_boost_clock_khz" => &mut config.cpu_boost_clock_khz,
                _ => continue,
            };
            *slot = parse_khz(value.trim())?;
        }
        Ok(config)
    }
}

fn parse_khz(s: &str) -> Result<u32> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    };
    let khz = parsed.map_err(|_| Error::Parse("invalid clock value"))?;
    if khz.checked_mul(1000).is_none() {
        return Err(Error::Parse("clock value does not fit in Hz"));
    }
    Ok(khz)
}
