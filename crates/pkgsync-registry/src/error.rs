use pkgsync_core::VersionCode;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("catalog package name must not be empty")]
    EmptyPackageName,
    #[error("catalog lists package '{0}' more than once")]
    DuplicatePackage(String),
    #[error("package '{package}' lists version code {version_code} more than once")]
    DuplicateVersion {
        package: String,
        version_code: VersionCode,
    },
    #[error("package '{package}' version {version_code} has invalid sha256 '{digest}': expected 64 hex characters")]
    InvalidDigest {
        package: String,
        version_code: VersionCode,
        digest: String,
    },
    #[error("package '{package}' version {version_code} has an empty payload name")]
    EmptyPayloadName {
        package: String,
        version_code: VersionCode,
    },
}
