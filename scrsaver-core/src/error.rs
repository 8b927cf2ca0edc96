// SPDX-License-Identifier: LGPL-3.0-only
//! Error types for screensaver inhibition.

use thiserror::Error;

/// D-Bus error name returned when the service does not implement a method.
pub const UNKNOWN_METHOD_ERROR: &str = "org.freedesktop.DBus.Error.UnknownMethod";

/// Errors that can occur while talking to a screensaver backend.
///
/// None of these ever reach the callers of [Scrsaver](crate::Scrsaver);
/// they are logged and the controller carries on.
#[derive(Error, Debug)]
pub enum InhibitError {
    /// The service does not know the called method (older API).
    #[error("Unknown method {method}: {message}")]
    UnknownMethod {
        /// The method that was called.
        method: String,
        /// The message sent back by the bus.
        message: String,
    },

    /// Any other failure of a session bus call.
    #[error("Call to {method} failed: {message}")]
    Bus {
        /// The method that was called.
        method: String,
        /// The message sent back by the bus.
        message: String,
    },

    /// The display server rejected or failed a request.
    #[error("Display error: {0}")]
    Display(String),

    /// No display connection could be opened.
    #[error("No X11 display available")]
    NoDisplay,
}

impl InhibitError {
    /// Whether a retry against the legacy API makes sense.
    pub fn is_unknown_method(&self) -> bool {
        matches!(self, InhibitError::UnknownMethod { .. })
    }
}
