use std::collections::BTreeSet;

use anyhow::{Context, Result};
use pkgsync_core::PackageVersion;
use pkgsync_security::is_sha256_hex;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// On-disk catalog as published by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFile {
    pub timestamp: u64,
    #[serde(default)]
    pub packages: Vec<CatalogPackage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPackage {
    pub name: String,
    #[serde(default)]
    pub versions: Vec<PackageVersion>,
}

impl CatalogFile {
    pub fn parse(content: &str) -> Result<Self> {
        let catalog: Self = toml::from_str(content).context("failed parsing catalog")?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut names = BTreeSet::new();
        for package in &self.packages {
            if package.name.trim().is_empty() {
                return Err(CatalogError::EmptyPackageName);
            }
            if !names.insert(package.name.as_str()) {
                return Err(CatalogError::DuplicatePackage(package.name.clone()));
            }

            let mut codes = BTreeSet::new();
            for version in &package.versions {
                if !codes.insert(version.version_code) {
                    return Err(CatalogError::DuplicateVersion {
                        package: package.name.clone(),
                        version_code: version.version_code,
                    });
                }
                if version.payload.name.trim().is_empty() {
                    return Err(CatalogError::EmptyPayloadName {
                        package: package.name.clone(),
                        version_code: version.version_code,
                    });
                }
                if let Some(digest) = &version.payload.sha256 {
                    if !is_sha256_hex(digest) {
                        return Err(CatalogError::InvalidDigest {
                            package: package.name.clone(),
                            version_code: version.version_code,
                            digest: digest.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
