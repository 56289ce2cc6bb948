use pkgsync_core::{PackageVersion, UpdateSelector, VersionCode};
use serde::{Deserialize, Serialize};

/// What the target system can run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub platform_level: Option<u32>,
    #[serde(default)]
    pub abis: Vec<String>,
}

impl DeviceProfile {
    pub fn new(platform_level: u32, abis: &[&str]) -> Self {
        Self {
            platform_level: Some(platform_level),
            abis: abis.iter().map(|abi| abi.to_string()).collect(),
        }
    }

    pub fn is_compatible(&self, version: &PackageVersion) -> bool {
        if let Some(level) = self.platform_level {
            if version.min_platform.is_some_and(|min| level < min) {
                return false;
            }
            if version.max_platform.is_some_and(|max| level > max) {
                return false;
            }
        }

        // Versions without native code run anywhere; an empty profile accepts all ABIs.
        if version.abis.is_empty() || self.abis.is_empty() {
            return true;
        }
        version
            .abis
            .iter()
            .any(|abi| self.abis.iter().any(|supported| supported == abi))
    }
}

#[derive(Debug, Clone, Default)]
pub struct HighestCompatibleSelector {
    profile: DeviceProfile,
}

impl HighestCompatibleSelector {
    pub fn new(profile: DeviceProfile) -> Self {
        Self { profile }
    }
}

impl UpdateSelector for HighestCompatibleSelector {
    fn suggest<'a>(
        &self,
        installed: Option<VersionCode>,
        available: &'a [PackageVersion],
    ) -> Option<&'a PackageVersion> {
        select_highest_compatible(available, &self.profile, installed)
    }
}

pub fn select_highest_compatible<'a>(
    candidates: &'a [PackageVersion],
    profile: &DeviceProfile,
    installed: Option<VersionCode>,
) -> Option<&'a PackageVersion> {
    candidates
        .iter()
        .filter(|version| profile.is_compatible(version))
        .filter(|version| installed.map_or(true, |current| version.version_code > current))
        .max_by_key(|version| version.version_code)
}
