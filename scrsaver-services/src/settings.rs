// SPDX-License-Identifier: LGPL-3.0-only
use anyhow::Result;
use serde::Deserialize;
use smol::fs;
use std::path::{Path, PathBuf};
use xdg::BaseDirectories;

/// Name of the settings file looked up in the XDG directories.
pub const SETTINGS_FILE: &str = "scrsaver.toml";

/// The settings read from `scrsaver.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralSettings,
    /// Screensaver inhibition settings
    #[serde(default)]
    pub screensaver: ScreensaverSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralSettings {
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScreensaverSettings {
    /// Application name handed to the screensaver service.
    pub application_name: Option<String>,
    /// Human readable inhibition reason.
    pub reason: Option<String>,
    /// Keep-alive period floor used when the X11 timeout is disabled.
    pub min_timeout_secs: Option<u64>,
    /// Set to `false` to never fake key presses, even with XTest present.
    pub keepalive: Option<bool>,
}

/// Registry for the screensaver settings.
pub struct SettingsRegistry {
    config: Config,
}

impl SettingsRegistry {
    /// Create a new SettingsRegistry and load configuration from standard locations.
    pub async fn new() -> Result<Self> {
        let mut registry = Self::empty();
        registry.load().await?;
        Ok(registry)
    }

    /// A registry holding no settings at all.
    pub fn empty() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Load configuration from standard locations in precedence order.
    ///
    /// Order (later overrides earlier):
    /// 1. System Data: /usr/share/scrsaver/scrsaver.toml (and XDG_DATA_DIRS)
    /// 2. System Config: /etc/xdg/scrsaver/scrsaver.toml (and XDG_CONFIG_DIRS)
    /// 3. User Config: ~/.config/scrsaver/scrsaver.toml (XDG_CONFIG_HOME)
    pub async fn load(&mut self) -> Result<()> {
        let xdg_dirs = BaseDirectories::with_prefix("scrsaver")?;

        for path in xdg_dirs.find_data_files(SETTINGS_FILE).rev() {
            self.load_file(&path).await;
        }

        for path in xdg_dirs.find_config_files(SETTINGS_FILE).rev() {
            self.load_file(&path).await;
        }

        let user_config_path = xdg_dirs.get_config_home().join(SETTINGS_FILE);
        if user_config_path.exists() {
            self.load_file(&user_config_path).await;
        }

        Ok(())
    }

    async fn load_file(&mut self, path: &Path) {
        log::info!("Loading config from: {:?}", path);
        match fs::read_to_string(path).await {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(loaded_config) => {
                    self.merge(loaded_config);
                },
                Err(e) => {
                    log::error!("Failed to parse config file {:?}: {}", path, e);
                },
            },
            Err(e) => {
                log::warn!("Failed to read config file {:?}: {}", path, e);
            },
        }
    }

    /// Merge a loaded config into the current config.
    fn merge(&mut self, other: Config) {
        if other.general.log_level.is_some() {
            self.config.general.log_level = other.general.log_level;
        }

        let current = &mut self.config.screensaver;
        let loaded = other.screensaver;
        if loaded.application_name.is_some() {
            current.application_name = loaded.application_name;
        }
        if loaded.reason.is_some() {
            current.reason = loaded.reason;
        }
        if loaded.min_timeout_secs.is_some() {
            current.min_timeout_secs = loaded.min_timeout_secs;
        }
        if let Some(keepalive) = loaded.keepalive {
            current.keepalive = Some(keepalive);
        }
    }

    /// Get the current configuration.
    pub fn get(&self) -> &Config {
        &self.config
    }

    /// Load configuration from custom paths, in order.
    ///
    /// Every path is attempted; one result is returned per path.
    pub async fn load_from_paths_async(&mut self, paths: Vec<PathBuf>) -> Vec<Result<()>> {
        let mut results = Vec::new();

        for path in paths {
            let result = async {
                let content = fs::read_to_string(&path)
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to read config file {:?}: {}", path, e))?;

                let loaded_config: Config = toml::from_str(&content)
                    .map_err(|e| anyhow::anyhow!("Failed to parse config file {:?}: {}", path, e))?;

                self.merge(loaded_config);
                Ok(())
            }
            .await;

            results.push(result);
        }

        results
    }
}
