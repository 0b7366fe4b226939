use std::env;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use ldrpatch::config::PatchConfig;
use ldrpatch::formats::nso::Nso;
use ldrpatch::platform::{PatchFileEngine, PatchFileRequest, Platform, SocType};
use ldrpatch::{Error, Patcher, Result};

/// Host stand-in: the "SD card" is a local directory.
struct HostPlatform {
    soc: SocType,
    sd_root: &'static str,
}

impl Platform for HostPlatform {
    fn soc_type(&self) -> SocType {
        self.soc
    }

    fn is_usb30_force_enabled(&self) -> bool {
        env::var_os("FORCE_USB30").is_some()
    }

    fn is_sd_card_initialized(&self) -> bool {
        true
    }

    fn mount_sd_card(&self, _mount_name: &str) -> Result<()> {
        if Path::new(self.sd_root).is_dir() {
            Ok(())
        } else {
            Err(Error::Unavailable("sd directory missing"))
        }
    }
}

/// Lists the patch folder the engine would search, without applying anything.
struct ListingEngine;

impl PatchFileEngine for ListingEngine {
    fn locate_and_apply(&self, request: &PatchFileRequest<'_>, _image: &mut [u8]) {
        println!(
            "external patches: {}:/{}/<name>/{}.ips (header {:#x} bytes protected)",
            request.mount_name, request.patch_dir, request.module_id, request.protected_size
        );
    }
}

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "main".to_owned());
    let soc = match args.next().as_deref() {
        Some("mariko") => SocType::Mariko,
        _ => SocType::Erista,
    };

    let config = match File::open("ldrpatch.ini") {
        Ok(f) => PatchConfig::load(f)?,
        Err(_) => PatchConfig::default(),
    };

    let mut reader = BufReader::new(File::open(&path)?);
    let nso = Nso::parse(&mut reader)?;
    let mut image = nso.map(&mut reader)?;
    let original = image.clone();

    let patcher = Patcher::with_config(
        HostPlatform { soc, sd_root: "sd" },
        ListingEngine,
        config,
    );
    patcher.patch_module(&nso.module_id_bytes(), &mut image);

    let changed = image.iter().zip(&original).filter(|(a, b)| a != b).count();
    println!("module id: {}", nso.module_id());
    println!("{changed} bytes changed in {:#x}-byte image", image.len());

    fs::write(format!("{path}.patched"), &image)?;
    Ok(())
}
