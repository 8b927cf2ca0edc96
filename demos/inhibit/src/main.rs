// SPDX-License-Identifier: LGPL-3.0-only
use std::time::Duration;

use scrsaver::prelude::*;

fn main() {
    let settings = match smol::block_on(SettingsRegistry::new()) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Failed to load settings: {err}");
            SettingsRegistry::empty()
        },
    };

    let mut logger = env_logger::Builder::from_default_env();
    if let Some(level) = &settings.get().general.log_level {
        logger.parse_filters(level);
    }
    logger.init();

    let seconds = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(10);

    let connection = match zbus::blocking::Connection::session() {
        Ok(connection) => Some(connection),
        Err(err) => {
            log::warn!("No session bus, using the display server only: {err}");
            None
        },
    };

    let config = ScrsaverConfig::from_settings(settings.get());
    let mut scrsaver = Scrsaver::with_config(connection.as_ref(), config);

    // Give the watcher a moment to see the service.
    std::thread::sleep(Duration::from_millis(200));

    log::info!("Screensaver disabled for {seconds} seconds");
    scrsaver.disable();
    std::thread::sleep(Duration::from_secs(seconds));
    scrsaver.enable();
    log::info!("Screensaver enabled again");
}
