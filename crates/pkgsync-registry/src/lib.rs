mod catalog_file;
mod error;
mod inventory;
mod provider;

pub use catalog_file::{CatalogFile, CatalogPackage};
pub use error::CatalogError;
pub use inventory::Inventory;
pub use provider::{join_catalog, FileCatalogProvider};
