//! Detection of installed legacy content packages.

use std::path::{Path, PathBuf};

/// Marker file shipped by the legacy full-viewport control bar addons.
pub const FULLVIEWPORT_DAT: &str = "fullviewport.dat";

/// Answers which legacy addons are installed.
pub trait AddonCompat {
    /// True when a full-viewport addon is installed. These addons upscale their
    /// fonts by hand and need Classic scaling.
    fn has_fullviewport_dat(&self) -> bool;
}

/// Looks for addon marker files in `<data_root>/INI`.
#[derive(Debug, Clone)]
pub struct DataDirAddons {
    ini_dir: PathBuf,
}

impl DataDirAddons {
    pub fn new(data_root: impl AsRef<Path>) -> Self {
        Self {
            ini_dir: data_root.as_ref().join("INI"),
        }
    }
}

impl AddonCompat for DataDirAddons {
    fn has_fullviewport_dat(&self) -> bool {
        let Ok(entries) = std::fs::read_dir(&self.ini_dir) else {
            return false;
        };
        entries.flatten().any(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.eq_ignore_ascii_case(FULLVIEWPORT_DAT))
        })
    }
}

/// No addons installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAddons;

impl AddonCompat for NoAddons {
    fn has_fullviewport_dat(&self) -> bool {
        false
    }
}
