use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use pkgsync_core::{Catalog, CatalogProvider, LibraryInspector, PackageRecord, VersionCode};
use tracing::debug;

use crate::catalog_file::CatalogFile;
use crate::inventory::Inventory;

/// Serves a catalog file joined with an inventory file.
#[derive(Debug, Clone)]
pub struct FileCatalogProvider {
    catalog_path: PathBuf,
    inventory_path: PathBuf,
}

impl FileCatalogProvider {
    pub fn new(catalog_path: impl Into<PathBuf>, inventory_path: impl Into<PathBuf>) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            inventory_path: inventory_path.into(),
        }
    }

    pub fn inventory(&self) -> Result<Inventory> {
        Inventory::load(&self.inventory_path)
    }

    pub fn load_catalog(&self) -> Result<Catalog> {
        let content = std::fs::read_to_string(&self.catalog_path).with_context(|| {
            format!("failed reading catalog: {}", self.catalog_path.display())
        })?;
        self.build_catalog(&content)
    }

    fn build_catalog(&self, content: &str) -> Result<Catalog> {
        let file = CatalogFile::parse(content)
            .with_context(|| format!("invalid catalog: {}", self.catalog_path.display()))?;
        let inventory = self.inventory()?;
        Ok(join_catalog(file, &inventory))
    }
}

pub fn join_catalog(file: CatalogFile, inventory: &Inventory) -> Catalog {
    let packages = file
        .packages
        .into_iter()
        .map(|package| PackageRecord {
            installed: inventory.installed_version(&package.name),
            name: package.name,
            versions: package.versions,
        })
        .collect::<Vec<_>>();
    debug!(
        timestamp = file.timestamp,
        packages = packages.len(),
        "loaded catalog"
    );
    Catalog::new(file.timestamp, packages)
}

#[async_trait]
impl CatalogProvider for FileCatalogProvider {
    async fn catalog(&self) -> Result<Catalog> {
        let content = tokio::fs::read_to_string(&self.catalog_path)
            .await
            .with_context(|| {
                format!("failed reading catalog: {}", self.catalog_path.display())
            })?;
        self.build_catalog(&content)
    }
}

impl LibraryInspector for FileCatalogProvider {
    fn shared_library_version(&self, library: &str) -> Result<Option<VersionCode>> {
        Ok(self.inventory()?.library_version(library))
    }
}
