use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const SETTINGS_FILE: &str = "settings.toml";

/// Markers the worker keeps between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSettings {
    #[serde(default = "settings_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked_unix: Option<u64>,
    /// Catalog timestamp of the last cycle that needed no retry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_catalog_timestamp: Option<u64>,
    #[serde(default)]
    pub consecutive_retries: u32,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            version: settings_version(),
            last_checked_unix: None,
            last_catalog_timestamp: None,
            consecutive_retries: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    state_root: PathBuf,
}

impl SettingsStore {
    pub fn new(state_root: impl Into<PathBuf>) -> Self {
        Self {
            state_root: state_root.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.state_root.join(SETTINGS_FILE)
    }

    pub fn load(&self) -> Result<UpdateSettings> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(UpdateSettings::default());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed reading settings: {}", path.display()));
            }
        };

        let settings: UpdateSettings = toml::from_str(&content)
            .with_context(|| format!("failed parsing settings: {}", path.display()))?;
        let expected = settings_version();
        if settings.version != expected {
            anyhow::bail!(
                "unsupported settings version {} (expected {}): remove {} to start over",
                settings.version,
                expected,
                path.display()
            );
        }
        Ok(settings)
    }

    pub fn save(&self, settings: &UpdateSettings) -> Result<()> {
        fs::create_dir_all(&self.state_root).with_context(|| {
            format!(
                "failed creating state directory: {}",
                self.state_root.display()
            )
        })?;
        let path = self.path();
        let content = toml::to_string_pretty(settings)
            .with_context(|| format!("failed serializing settings: {}", path.display()))?;
        fs::write(&path, content)
            .with_context(|| format!("failed writing settings: {}", path.display()))
    }
}

fn settings_version() -> u32 {
    1
}
