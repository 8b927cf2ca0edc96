// SPDX-License-Identifier: LGPL-3.0-only
//! Inhibition through the session screensaver service.

use log::{debug, warn};
use std::sync::Arc;

use crate::config::ScrsaverConfig;
use crate::error::InhibitError;

pub mod watcher;

#[cfg(all(target_os = "linux", feature = "dbus"))]
pub mod session;

pub use watcher::{ServicePresence, WatchHandle};

#[cfg(all(target_os = "linux", feature = "dbus"))]
pub use session::SessionScreensaver;

/// Well-known bus name of the screensaver service.
pub const GS_SERVICE: &str = "org.gnome.ScreenSaver";
/// Object path of the screensaver service.
pub const GS_PATH: &str = "/org/gnome/ScreenSaver";
/// Interface of the screensaver service.
pub const GS_INTERFACE: &str = "org.gnome.ScreenSaver";

/// A method call on the screensaver interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusCall {
    /// `Inhibit(application, reason) -> cookie`
    Inhibit {
        /// Name of the inhibiting application.
        application: String,
        /// Why the screensaver is inhibited.
        reason: String,
    },
    /// Legacy `InhibitActivation(reason)`, no cookie.
    InhibitActivation {
        /// Why the screensaver is inhibited.
        reason: String,
    },
    /// `UnInhibit(cookie)`
    UnInhibit {
        /// Cookie returned by `Inhibit`.
        cookie: u32,
    },
    /// Legacy `AllowActivation()`
    AllowActivation,
}

impl BusCall {
    /// The D-Bus member name of this call.
    pub fn method(&self) -> &'static str {
        match self {
            BusCall::Inhibit { .. } => "Inhibit",
            BusCall::InhibitActivation { .. } => "InhibitActivation",
            BusCall::UnInhibit { .. } => "UnInhibit",
            BusCall::AllowActivation => "AllowActivation",
        }
    }
}

/// Transport to the screensaver service.
///
/// Implementations must never auto-start the service.
pub trait ScreensaverBus: Send + Sync {
    /// Perform a blocking call. Returns the cookie if the reply carries one.
    fn call(&self, call: &BusCall) -> Result<Option<u32>, InhibitError>;

    /// Start watching ownership of [GS_SERVICE], reporting changes to `presence`.
    fn watch(&self, presence: ServicePresence) -> Result<WatchHandle, InhibitError>;
}

/// Inhibits the screensaver through a [ScreensaverBus].
pub struct ServiceInhibitor {
    bus: Arc<dyn ScreensaverBus>,
    presence: ServicePresence,
    watch: WatchHandle,
    application_name: String,
}

impl ServiceInhibitor {
    /// Create the inhibitor and start watching the service.
    pub fn new(bus: Arc<dyn ScreensaverBus>, config: &ScrsaverConfig) -> Self {
        let presence = ServicePresence::default();
        let watch = match bus.watch(presence.clone()) {
            Ok(handle) => handle,
            Err(err) => {
                warn!("Failed to watch {GS_SERVICE}: {err}");
                WatchHandle::inert()
            },
        };

        Self {
            bus,
            presence,
            watch,
            application_name: config.application_name.clone(),
        }
    }

    /// Whether the service currently owns its name on the bus.
    pub fn is_present(&self) -> bool {
        self.presence.is_present()
    }

    /// The shared presence flag.
    pub fn presence(&self) -> &ServicePresence {
        &self.presence
    }

    /// Inhibit the screensaver, falling back to `InhibitActivation` on older services.
    ///
    /// Returns the cookie needed by [uninhibit](Self::uninhibit), `0` when the
    /// service handed none out.
    pub fn inhibit(&self, reason: &str) -> Result<u32, InhibitError> {
        let call = BusCall::Inhibit {
            application: self.application_name.clone(),
            reason: reason.to_string(),
        };
        match self.bus.call(&call) {
            Ok(cookie) => Ok(cookie.unwrap_or(0)),
            Err(err) if err.is_unknown_method() => {
                debug!("Inhibit unknown ({err}), trying InhibitActivation");
                let legacy = BusCall::InhibitActivation {
                    reason: reason.to_string(),
                };
                self.bus.call(&legacy)?;
                Ok(0)
            },
            Err(err) => Err(err),
        }
    }

    /// Release the inhibition identified by `cookie`, falling back to
    /// `AllowActivation` on older services. `cookie` is reset to `0` on success.
    pub fn uninhibit(&self, cookie: &mut u32) -> Result<(), InhibitError> {
        if !self.is_present() {
            // The inhibition went away with the service.
            debug!("{GS_SERVICE} vanished, dropping cookie {cookie}");
            *cookie = 0;
            return Ok(());
        }

        match self.bus.call(&BusCall::UnInhibit { cookie: *cookie }) {
            Ok(_) => {},
            Err(err) if err.is_unknown_method() => {
                debug!("UnInhibit unknown ({err}), trying AllowActivation");
                self.bus.call(&BusCall::AllowActivation)?;
            },
            Err(err) => return Err(err),
        }

        *cookie = 0;
        Ok(())
    }

    /// Stop watching the service. Safe to call more than once.
    pub fn stop(&mut self) {
        self.watch.stop();
    }
}

impl Drop for ServiceInhibitor {
    fn drop(&mut self) {
        self.stop();
    }
}
