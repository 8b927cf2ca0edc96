// SPDX-License-Identifier: LGPL-3.0-only
use std::time::Duration;

use scrsaver_services::settings::Config as Settings;

/// Keep-alive floor used when the X11 screensaver timeout is disabled.
pub const MIN_TIMEOUT: Duration = Duration::from_secs(60);

/// Application name sent with `Inhibit` unless configured otherwise.
pub const DEFAULT_APPLICATION_NAME: &str = "Totem";

/// Reason sent with `Inhibit` unless configured otherwise.
pub const DEFAULT_REASON: &str = "Running in presentation mode";

/// scrsaver Configuration Structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrsaverConfig {
    /// Application name passed to the screensaver service.
    pub application_name: String,
    /// Reason passed to the screensaver service.
    pub reason: String,
    /// Keep-alive period floor, halved to get the tick period when the
    /// display reports a zero timeout.
    pub min_timeout: Duration,
    /// If XTest key taps may be used to keep the display awake.
    /// When `false` the X11 parameters are always switched off instead.
    pub keepalive: bool,
}

impl Default for ScrsaverConfig {
    fn default() -> Self {
        Self {
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
            reason: DEFAULT_REASON.to_string(),
            min_timeout: MIN_TIMEOUT,
            keepalive: true,
        }
    }
}

impl ScrsaverConfig {
    /// Build a configuration from loaded settings, defaulting what they leave unset.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut config = Self::default();
        config.merge_settings(settings);
        config
    }

    /// Override fields with the values present in `settings`.
    pub fn merge_settings(&mut self, settings: &Settings) {
        let screensaver = &settings.screensaver;
        if let Some(name) = &screensaver.application_name {
            self.application_name = name.clone();
        }
        if let Some(reason) = &screensaver.reason {
            self.reason = reason.clone();
        }
        if let Some(secs) = screensaver.min_timeout_secs {
            if secs == 0 {
                log::warn!("Ignoring min_timeout_secs = 0, keeping {:?}", self.min_timeout);
            } else {
                self.min_timeout = Duration::from_secs(secs);
            }
        }
        if let Some(keepalive) = screensaver.keepalive {
            self.keepalive = keepalive;
        }
    }
}
