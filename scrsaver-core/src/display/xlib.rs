// SPDX-License-Identifier: LGPL-3.0-only
//! X11 screensaver control through Xlib and XTest.

use std::os::raw::{c_int, c_uint};
use std::ptr;

use x11_dl::keysym::{XK_Alt_L, XK_Alt_R};
use x11_dl::xlib::{self, Xlib};
// x11-dl names its XTest bindings after the vidmode extension.
use x11_dl::xtest::Xf86vmode as XTest;

use super::{DisplayServer, KeepAliveKeys, ScreensaverParams};
use crate::error::InhibitError;

const X_TRUE: c_int = 1;
const X_FALSE: c_int = 0;
const CURRENT_TIME: xlib::Time = 0;

/// Holds the Xlib display lock until dropped.
pub struct DisplayLock<'a> {
    xlib: &'a Xlib,
    display: *mut xlib::Display,
}

impl<'a> DisplayLock<'a> {
    fn new(xlib: &'a Xlib, display: *mut xlib::Display) -> Self {
        unsafe { (xlib.XLockDisplay)(display) };
        Self { xlib, display }
    }
}

impl Drop for DisplayLock<'_> {
    fn drop(&mut self) {
        unsafe { (self.xlib.XUnlockDisplay)(self.display) };
    }
}

/// An X11 display connection.
pub struct XlibDisplay {
    xlib: Xlib,
    xtest: Option<XTest>,
    display: *mut xlib::Display,
    owned: bool,
}

// Xlib is thread safe once XInitThreads ran, and every use of `display`
// below goes through a DisplayLock.
unsafe impl Send for XlibDisplay {}
unsafe impl Sync for XlibDisplay {}

impl XlibDisplay {
    /// Open the display named by `$DISPLAY`.
    pub fn open() -> Result<Self, InhibitError> {
        let xlib = Xlib::open()
            .map_err(|e| InhibitError::Display(format!("Failed to load X11 library: {e}")))?;
        let display = unsafe {
            (xlib.XInitThreads)();
            (xlib.XOpenDisplay)(ptr::null())
        };
        if display.is_null() {
            return Err(InhibitError::NoDisplay);
        }

        Ok(Self {
            xtest: Self::load_xtest(),
            xlib,
            display,
            owned: true,
        })
    }

    /// Share a display opened by the toolkit. It is not closed on drop.
    ///
    /// # Safety
    /// `display` must be a valid Xlib display that outlives the returned value,
    /// and `XInitThreads` must have been called before it was opened.
    pub unsafe fn from_raw(display: *mut xlib::Display) -> Result<Self, InhibitError> {
        if display.is_null() {
            return Err(InhibitError::NoDisplay);
        }
        let xlib = Xlib::open()
            .map_err(|e| InhibitError::Display(format!("Failed to load X11 library: {e}")))?;

        Ok(Self {
            xtest: Self::load_xtest(),
            xlib,
            display,
            owned: false,
        })
    }

    fn load_xtest() -> Option<XTest> {
        match XTest::open() {
            Ok(xtest) => Some(xtest),
            Err(err) => {
                log::debug!("XTest library not available: {err}");
                None
            },
        }
    }

    /// Lock the display for exclusive use.
    pub fn lock(&self) -> DisplayLock<'_> {
        DisplayLock::new(&self.xlib, self.display)
    }

    fn keycode(&self, keysym: c_uint) -> u8 {
        unsafe { (self.xlib.XKeysymToKeycode)(self.display, keysym as xlib::KeySym) }
    }
}

impl DisplayServer for XlibDisplay {
    fn screensaver_params(&self) -> Result<ScreensaverParams, InhibitError> {
        let mut params = ScreensaverParams::default();
        let _lock = self.lock();
        unsafe {
            (self.xlib.XGetScreenSaver)(
                self.display,
                &mut params.timeout,
                &mut params.interval,
                &mut params.prefer_blanking,
                &mut params.allow_exposures,
            );
        }
        Ok(params)
    }

    fn set_screensaver_params(&self, params: &ScreensaverParams) -> Result<(), InhibitError> {
        let _lock = self.lock();
        unsafe {
            (self.xlib.XSetScreenSaver)(
                self.display,
                params.timeout,
                params.interval,
                params.prefer_blanking,
                params.allow_exposures,
            );
            (self.xlib.XFlush)(self.display);
        }
        Ok(())
    }

    fn keepalive_keys(&self) -> Option<KeepAliveKeys> {
        let xtest = self.xtest.as_ref()?;
        let _lock = self.lock();

        let (mut event, mut error, mut major, mut minor) = (0, 0, 0, 0);
        let present = unsafe {
            (xtest.XTestQueryExtension)(self.display, &mut event, &mut error, &mut major, &mut minor)
        };
        if present == X_FALSE {
            log::debug!("XTest extension not present on the display");
            return None;
        }

        let primary = self.keycode(XK_Alt_L);
        if primary == 0 {
            log::warn!("No key code for Alt_L");
        }
        let mut secondary = self.keycode(XK_Alt_R);
        if secondary == 0 {
            secondary = self.keycode(XK_Alt_L);
            if secondary == 0 {
                log::warn!("No key code for Alt_R or Alt_L");
            }
        }

        Some(KeepAliveKeys { primary, secondary })
    }

    fn fake_key_tap(&self, keycode: u8) -> Result<(), InhibitError> {
        let xtest = self
            .xtest
            .as_ref()
            .ok_or_else(|| InhibitError::Display("XTest not loaded".to_string()))?;
        let _lock = self.lock();
        unsafe {
            (xtest.XTestFakeKeyEvent)(self.display, keycode as c_uint, X_TRUE, CURRENT_TIME);
            (xtest.XTestFakeKeyEvent)(self.display, keycode as c_uint, X_FALSE, CURRENT_TIME);
            (self.xlib.XFlush)(self.display);
        }
        Ok(())
    }
}

impl Drop for XlibDisplay {
    fn drop(&mut self) {
        if self.owned {
            unsafe { (self.xlib.XCloseDisplay)(self.display) };
        }
    }
}
