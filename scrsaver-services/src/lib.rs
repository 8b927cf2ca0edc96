// SPDX-License-Identifier: LGPL-3.0-only
pub mod settings;

pub use settings::{Config, GeneralSettings, ScreensaverSettings, SettingsRegistry};
