use std::io;
use std::path::{Path, PathBuf};

use pkgsync_core::PayloadDescriptor;
use pkgsync_security::sha256_file_hex;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("failed to fetch payload for '{package}': {reason}")]
    Fetch { package: String, reason: String },
    #[error("payload '{name}' sha256 mismatch: expected {expected}, got {actual}")]
    DigestMismatch {
        name: String,
        expected: String,
        actual: String,
    },
    #[error("payload '{name}' size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        name: String,
        expected: u64,
        actual: u64,
    },
    #[error("failed to digest payload '{name}': {reason}")]
    Digest { name: String, reason: String },
}

/// Checks the fetched file against what the catalog declared. Fields the
/// catalog leaves out are not checked.
pub(crate) async fn verify_payload(
    path: &Path,
    descriptor: &PayloadDescriptor,
) -> Result<(), PayloadError> {
    if let Some(expected) = descriptor.size {
        let actual = tokio::fs::metadata(path)
            .await
            .map_err(|err| PayloadError::Digest {
                name: descriptor.name.clone(),
                reason: err.to_string(),
            })?
            .len();
        if actual != expected {
            return Err(PayloadError::SizeMismatch {
                name: descriptor.name.clone(),
                expected,
                actual,
            });
        }
    }

    let Some(expected) = descriptor.sha256.as_deref() else {
        return Ok(());
    };

    let owned: PathBuf = path.to_path_buf();
    let actual = tokio::task::spawn_blocking(move || sha256_file_hex(&owned))
        .await
        .map_err(|err| PayloadError::Digest {
            name: descriptor.name.clone(),
            reason: err.to_string(),
        })?
        .map_err(|err| PayloadError::Digest {
            name: descriptor.name.clone(),
            reason: format!("{err:#}"),
        })?;

    if !actual.eq_ignore_ascii_case(expected) {
        return Err(PayloadError::DigestMismatch {
            name: descriptor.name.clone(),
            expected: expected.to_ascii_lowercase(),
            actual,
        });
    }
    debug!(payload = %descriptor.name, "payload digest verified");
    Ok(())
}

pub(crate) async fn discard_payload(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to remove payload file");
        }
    }
}
