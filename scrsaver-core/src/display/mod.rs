// SPDX-License-Identifier: LGPL-3.0-only
//! Inhibition through the display server's own screensaver.
//!
//! Two strategies, picked once at construction:
//! * keep-alive: tap a harmless key every half timeout (needs XTest);
//! * direct: save the screensaver parameters, switch the screensaver off,
//!   and write the saved parameters back on restore.

use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ScrsaverConfig;
use crate::error::InhibitError;

pub mod keepalive;

#[cfg(all(target_os = "linux", feature = "x11"))]
pub mod xlib;

pub use keepalive::{keepalive_period, KeepAlive};

#[cfg(all(target_os = "linux", feature = "x11"))]
pub use xlib::XlibDisplay;

/// `DontPreferBlanking` from Xlib.
pub const DONT_PREFER_BLANKING: i32 = 0;
/// `DontAllowExposures` from Xlib.
pub const DONT_ALLOW_EXPOSURES: i32 = 0;

/// The display server's screensaver settings, as in `XGetScreenSaver`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreensaverParams {
    /// Seconds of idle time before the screensaver starts, `0` = disabled.
    pub timeout: i32,
    /// Seconds between screensaver alterations.
    pub interval: i32,
    /// Blanking preference.
    pub prefer_blanking: i32,
    /// Exposure preference.
    pub allow_exposures: i32,
}

impl ScreensaverParams {
    /// Screensaver switched off.
    pub const SUPPRESSED: Self = Self {
        timeout: 0,
        interval: 0,
        prefer_blanking: DONT_PREFER_BLANKING,
        allow_exposures: DONT_ALLOW_EXPOSURES,
    };
}

/// Two key codes to alternate between, so the server never sees auto-repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAliveKeys {
    /// Left Alt.
    pub primary: u8,
    /// Right Alt, or left Alt again when there is no right one.
    pub secondary: u8,
}

impl KeepAliveKeys {
    /// Key code for alternation slot `index`.
    pub fn get(&self, index: usize) -> u8 {
        if index % 2 == 0 {
            self.primary
        } else {
            self.secondary
        }
    }
}

/// Access to a display server's screensaver.
///
/// Every method locks the display connection for the duration of the call.
pub trait DisplayServer: Send + Sync {
    /// Read the current screensaver parameters.
    fn screensaver_params(&self) -> Result<ScreensaverParams, InhibitError>;

    /// Replace the screensaver parameters.
    fn set_screensaver_params(&self, params: &ScreensaverParams) -> Result<(), InhibitError>;

    /// Probe for synthetic input support and resolve the keep-alive keys.
    /// `None` when key taps cannot be faked.
    fn keepalive_keys(&self) -> Option<KeepAliveKeys>;

    /// Press and release `keycode`.
    fn fake_key_tap(&self, keycode: u8) -> Result<(), InhibitError>;
}

/// Suppresses and restores the display server's screensaver.
pub struct DisplayInhibitor {
    display: Arc<dyn DisplayServer>,
    keys: Option<KeepAliveKeys>,
    next_key: Arc<AtomicUsize>,
    min_timeout: Duration,
    saved: Option<ScreensaverParams>,
    keepalive: KeepAlive,
}

impl DisplayInhibitor {
    /// Probe `display` for keep-alive support.
    pub fn new(display: Arc<dyn DisplayServer>, config: &ScrsaverConfig) -> Self {
        let keys = if config.keepalive {
            display.keepalive_keys()
        } else {
            None
        };
        match keys {
            Some(keys) => info!(
                "Keeping the display awake with key taps ({}, {})",
                keys.primary, keys.secondary
            ),
            None => info!("Keep-alive unavailable, switching the screensaver off directly"),
        }

        Self {
            display,
            keys,
            next_key: Arc::new(AtomicUsize::new(0)),
            min_timeout: config.min_timeout,
            saved: None,
            keepalive: KeepAlive::new(),
        }
    }

    /// Whether key taps are used instead of parameter changes.
    pub fn has_keepalive(&self) -> bool {
        self.keys.is_some()
    }

    /// Whether a keep-alive tick is scheduled.
    pub fn keepalive_running(&self) -> bool {
        self.keepalive.is_running()
    }

    /// The parameters saved by the last direct suppression, if not restored yet.
    pub fn saved_params(&self) -> Option<ScreensaverParams> {
        self.saved
    }

    /// Keep the screensaver from starting.
    ///
    /// Ticks only tap keys while `active` is set.
    pub fn suppress(&mut self, active: &Arc<AtomicBool>) {
        match self.keys {
            Some(keys) => self.start_keepalive(keys, active.clone()),
            None => self.switch_off(),
        }
    }

    /// Undo [suppress](Self::suppress).
    pub fn restore(&mut self) {
        self.keepalive.cancel();

        if let Some(params) = self.saved.take() {
            debug!("Restoring screensaver parameters {:?}", params);
            if let Err(err) = self.display.set_screensaver_params(&params) {
                warn!("Failed to restore screensaver parameters: {err}");
            }
        }
    }

    /// Stop ticking without touching the display parameters.
    pub fn shutdown(&mut self) {
        self.keepalive.cancel();
    }

    fn start_keepalive(&mut self, keys: KeepAliveKeys, active: Arc<AtomicBool>) {
        let timeout = match self.display.screensaver_params() {
            Ok(params) => params.timeout,
            Err(err) => {
                debug!("Could not read screensaver timeout: {err}");
                0
            },
        };
        let period = keepalive_period(timeout, self.min_timeout);

        let display = self.display.clone();
        let next_key = self.next_key.clone();
        self.keepalive.start(period, move || {
            if !active.load(Ordering::SeqCst) {
                return;
            }
            let keycode = keys.get(next_key.fetch_xor(1, Ordering::SeqCst));
            if let Err(err) = display.fake_key_tap(keycode) {
                debug!("Keep-alive key tap failed: {err}");
            }
        });
    }

    fn switch_off(&mut self) {
        if self.saved.is_some() {
            // Already off; keep the original snapshot.
            return;
        }

        let params = match self.display.screensaver_params() {
            Ok(params) => params,
            Err(err) => {
                debug!("Could not read screensaver parameters: {err}");
                return;
            },
        };
        self.saved = Some(params);
        debug!("Saved screensaver parameters {:?}", params);

        if let Err(err) = self.display.set_screensaver_params(&ScreensaverParams::SUPPRESSED) {
            warn!("Failed to switch the screensaver off: {err}");
        }
    }
}

impl Drop for DisplayInhibitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
