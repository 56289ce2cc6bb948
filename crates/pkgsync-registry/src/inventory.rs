use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use pkgsync_core::VersionCode;
use serde::{Deserialize, Serialize};

/// What is installed on the target system.
///
/// `libraries` lists shared libraries by the version they provide, which may
/// differ from the version of the package that ships them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub installed: BTreeMap<String, VersionCode>,
    #[serde(default)]
    pub libraries: BTreeMap<String, VersionCode>,
}

impl Inventory {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed parsing inventory")
    }

    /// A missing file is an empty inventory.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content)
                .with_context(|| format!("failed loading inventory: {}", path.display())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err)
                .with_context(|| format!("failed reading inventory: {}", path.display())),
        }
    }

    pub fn installed_version(&self, package: &str) -> Option<VersionCode> {
        self.installed.get(package).copied()
    }

    /// Falls back to the installed package version when the library is not
    /// listed separately.
    pub fn library_version(&self, library: &str) -> Option<VersionCode> {
        self.libraries
            .get(library)
            .or_else(|| self.installed.get(library))
            .copied()
    }
}
