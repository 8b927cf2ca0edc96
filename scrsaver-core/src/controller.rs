// SPDX-License-Identifier: LGPL-3.0-only
//! The screensaver inhibition controller.

use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::ScrsaverConfig;
use crate::display::{DisplayInhibitor, DisplayServer};
use crate::service::{ScreensaverBus, ServiceInhibitor};

/// The backend that performed the current suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    /// Inhibited through the screensaver service.
    Service,
    /// Inhibited through the display server.
    Display,
}

/// Keeps the screensaver away while media plays.
///
/// Call [disable](Self::disable) when playback starts and
/// [enable](Self::enable) when it stops. The screensaver service is used
/// when it is on the bus at that moment, the display server otherwise.
/// Failures are logged and never reach the caller.
pub struct Scrsaver {
    config: ScrsaverConfig,
    disabled: Arc<AtomicBool>,
    cookie: u32,
    suppression: Option<Suppression>,
    service: Option<ServiceInhibitor>,
    display: Option<DisplayInhibitor>,
}

impl Scrsaver {
    /// Create a controller using `connection` for the screensaver service
    /// and the X11 display named by `$DISPLAY`.
    ///
    /// Without a connection only the display server is ever used.
    #[cfg(all(target_os = "linux", feature = "dbus"))]
    pub fn new(connection: Option<&zbus::blocking::Connection>) -> Self {
        Self::with_config(connection, ScrsaverConfig::default())
    }

    /// Like [new](Self::new), with an explicit configuration.
    #[cfg(all(target_os = "linux", feature = "dbus"))]
    pub fn with_config(
        connection: Option<&zbus::blocking::Connection>,
        config: ScrsaverConfig,
    ) -> Self {
        let bus = connection.map(|connection| {
            Arc::new(crate::service::SessionScreensaver::new(connection)) as Arc<dyn ScreensaverBus>
        });
        Self::with_backends(config, bus, default_display())
    }

    /// Create a controller from explicit backends.
    ///
    /// `bus` is fixed for the lifetime of the controller: `None` means the
    /// service path is never taken.
    pub fn with_backends(
        config: ScrsaverConfig,
        bus: Option<Arc<dyn ScreensaverBus>>,
        display: Option<Arc<dyn DisplayServer>>,
    ) -> Self {
        let service = bus.map(|bus| ServiceInhibitor::new(bus, &config));
        let display = display.map(|display| DisplayInhibitor::new(display, &config));
        if display.is_none() {
            debug!("No display server, only the screensaver service can be used");
        }

        Self {
            config,
            disabled: Arc::new(AtomicBool::new(false)),
            cookie: 0,
            suppression: None,
            service,
            display,
        }
    }

    /// Keep the screensaver from activating. No-op when already disabled.
    pub fn disable(&mut self) {
        if self.disabled.load(Ordering::SeqCst) {
            return;
        }
        self.disabled.store(true, Ordering::SeqCst);

        if let Some(service) = self.service.as_ref().filter(|service| service.is_present()) {
            debug!("Inhibiting the screensaver through the session service");
            match service.inhibit(&self.config.reason) {
                Ok(cookie) => {
                    self.cookie = cookie;
                    self.suppression = Some(Suppression::Service);
                },
                Err(err) => warn!("Problem inhibiting the screensaver: {err}"),
            }
        } else if let Some(display) = self.display.as_mut() {
            debug!("Inhibiting the screensaver through the display server");
            display.suppress(&self.disabled);
            self.suppression = Some(Suppression::Display);
        } else {
            debug!("No way to inhibit the screensaver");
        }
    }

    /// Let the screensaver activate again. No-op when not disabled.
    ///
    /// The backend that did the suppressing is the one that undoes it, even
    /// if the service came or went in between.
    pub fn enable(&mut self) {
        if !self.disabled.load(Ordering::SeqCst) {
            return;
        }
        self.disabled.store(false, Ordering::SeqCst);

        match self.suppression.take() {
            Some(Suppression::Service) => {
                if let Some(service) = &self.service {
                    if let Err(err) = service.uninhibit(&mut self.cookie) {
                        warn!("Problem uninhibiting the screensaver: {err}");
                    }
                }
            },
            Some(Suppression::Display) => {
                if let Some(display) = self.display.as_mut() {
                    display.restore();
                }
            },
            None => debug!("Nothing to restore"),
        }
    }

    /// Enable (`true`) or disable (`false`) the screensaver.
    pub fn set_state(&mut self, enable: bool) {
        if self.is_disabled() == !enable {
            return;
        }
        if enable {
            self.enable();
        } else {
            self.disable();
        }
    }

    /// Whether the screensaver is currently suppressed.
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    /// Cookie of the active service inhibition, `0` when there is none.
    pub fn cookie(&self) -> u32 {
        self.cookie
    }

    /// Whether the screensaver service is on the bus right now.
    pub fn service_present(&self) -> bool {
        self.service.as_ref().is_some_and(|service| service.is_present())
    }

    /// The backend holding the current suppression.
    pub fn suppression(&self) -> Option<Suppression> {
        self.suppression
    }

    /// The configuration in use.
    pub fn config(&self) -> &ScrsaverConfig {
        &self.config
    }
}

impl Drop for Scrsaver {
    fn drop(&mut self) {
        // Only the watch and the tick are torn down. An active inhibition is
        // not released here.
        if let Some(display) = self.display.as_mut() {
            display.shutdown();
        }
        if let Some(service) = self.service.as_mut() {
            service.stop();
        }
    }
}

/// Open the default X11 display, if there is one.
#[cfg(all(target_os = "linux", feature = "x11"))]
pub fn default_display() -> Option<Arc<dyn DisplayServer>> {
    match crate::display::XlibDisplay::open() {
        Ok(display) => Some(Arc::new(display)),
        Err(err) => {
            debug!("X11 screensaver control unavailable: {err}");
            None
        },
    }
}

/// Open the default X11 display, if there is one.
#[cfg(not(all(target_os = "linux", feature = "x11")))]
pub fn default_display() -> Option<Arc<dyn DisplayServer>> {
    None
}
