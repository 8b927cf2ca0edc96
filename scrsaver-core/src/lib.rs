// SPDX-License-Identifier: LGPL-3.0-only
#![warn(missing_docs)]

//! Core library for scrsaver => See `scrsaver` crate.
//!
//! Contains the inhibition controller and its two backends.

/// Contains the [ScrsaverConfig](config::ScrsaverConfig) struct.
pub mod config;

/// Contains the error types.
pub mod error;

/// Contains the session screensaver service backend and its watcher.
pub mod service;

/// Contains the display server backend and its keep-alive tick.
pub mod display;

/// Contains the [Scrsaver] controller.
pub mod controller;

pub use controller::{default_display, Scrsaver, Suppression};
pub use error::InhibitError;
