// SPDX-License-Identifier: LGPL-3.0-only
#![warn(missing_docs)]

//! Keep the screen awake while media is playing.
//!
//! The [Scrsaver](core::Scrsaver) controller prefers the session screensaver
//! service and falls back to the X11 screensaver parameters when the service
//! is absent.

pub use scrsaver_core as core;
pub use scrsaver_services as services;

/// A "prelude" for users of scrsaver.
///
/// ```rust
/// use scrsaver::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::config::ScrsaverConfig;
    pub use crate::core::display::{DisplayServer, ScreensaverParams};
    pub use crate::core::error::InhibitError;
    pub use crate::core::service::{ScreensaverBus, ServicePresence};
    pub use crate::core::Scrsaver;
    pub use crate::services::settings::SettingsRegistry;
}
