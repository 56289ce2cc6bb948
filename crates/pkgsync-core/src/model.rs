use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(transparent)]
pub struct VersionCode(pub u64);

impl fmt::Display for VersionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for VersionCode {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayloadDescriptor {
    pub name: String,
    pub sha256: Option<String>,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageVersion {
    pub version_code: VersionCode,
    pub version_name: Option<String>,
    pub payload: PayloadDescriptor,
    /// Shared library this version must not be installed ahead of.
    pub shared_library: Option<String>,
    pub min_platform: Option<u32>,
    pub max_platform: Option<u32>,
    #[serde(default)]
    pub abis: Vec<String>,
}

impl PackageVersion {
    pub fn display_name(&self) -> String {
        match &self.version_name {
            Some(name) => format!("{name} ({})", self.version_code),
            None => self.version_code.to_string(),
        }
    }
}

/// One catalog entry joined with what is currently installed on this system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub name: String,
    pub installed: Option<VersionCode>,
    pub versions: Vec<PackageVersion>,
}

impl PackageRecord {
    pub fn is_installed(&self) -> bool {
        self.installed.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub timestamp: u64,
    pub packages: Vec<PackageRecord>,
}

impl Catalog {
    pub fn new(timestamp: u64, packages: Vec<PackageRecord>) -> Self {
        Self {
            timestamp,
            packages,
        }
    }

    pub fn package(&self, name: &str) -> Option<&PackageRecord> {
        self.packages.iter().find(|record| record.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
