// SPDX-License-Identifier: LGPL-3.0-only
//! Watches whether the screensaver service is on the bus.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag telling whether the service currently owns its name.
///
/// Starts out absent. Written from the watch task, read by the controller.
#[derive(Debug, Clone, Default)]
pub struct ServicePresence(Arc<AtomicBool>);

impl ServicePresence {
    /// Whether the service is present.
    pub fn is_present(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Called when the service name gains an owner.
    pub fn appeared(&self) {
        if !self.0.swap(true, Ordering::SeqCst) {
            log::debug!("Screensaver service appeared");
        }
    }

    /// Called when the service name loses its owner.
    pub fn vanished(&self) {
        if self.0.swap(false, Ordering::SeqCst) {
            log::debug!("Screensaver service disappeared");
        }
    }
}

/// Subscription to ownership changes of the service name.
///
/// Dropping or [stopping](Self::stop) it cancels the watch.
#[derive(Debug, Default)]
pub struct WatchHandle {
    task: Option<smol::Task<()>>,
}

impl WatchHandle {
    /// A handle with nothing to cancel.
    pub fn inert() -> Self {
        Self { task: None }
    }

    /// Wrap a running watch task.
    pub fn from_task(task: smol::Task<()>) -> Self {
        Self { task: Some(task) }
    }

    /// Whether a watch is still registered.
    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }

    /// Cancel future notifications. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            // Dropping a smol task cancels it.
            drop(task);
            log::debug!("Stopped watching the screensaver service");
        }
    }
}

/// Apply the owner check made when the watch starts.
#[cfg_attr(not(all(target_os = "linux", feature = "dbus")), allow(dead_code))]
pub(crate) fn owner_at_start(has_owner: bool, presence: &ServicePresence) {
    if has_owner {
        presence.appeared();
    }
}

/// Apply a `NameOwnerChanged` signal for the watched name.
#[cfg_attr(not(all(target_os = "linux", feature = "dbus")), allow(dead_code))]
pub(crate) fn owner_changed(new_owner: Option<&str>, presence: &ServicePresence) {
    match new_owner {
        Some(owner) => {
            log::trace!("Screensaver service owned by {owner}");
            presence.appeared();
        },
        None => presence.vanished(),
    }
}

/// Watch `name` on `connection`, flipping `presence` as its owner comes and goes.
#[cfg(all(target_os = "linux", feature = "dbus"))]
pub fn watch_name(
    connection: &zbus::blocking::Connection,
    name: &str,
    presence: ServicePresence,
) -> WatchHandle {
    let connection = connection.inner().clone();
    let name = name.to_string();

    let task = smol::spawn(async move {
        if let Err(err) = run_watch(&connection, &name, &presence).await {
            log::warn!("Watching {name} stopped: {err}");
        }
    });

    WatchHandle::from_task(task)
}

#[cfg(all(target_os = "linux", feature = "dbus"))]
async fn run_watch(
    connection: &zbus::Connection,
    name: &str,
    presence: &ServicePresence,
) -> zbus::Result<()> {
    use futures::StreamExt;
    use zbus::names::{BusName, UniqueName};

    let proxy = zbus::fdo::DBusProxy::new(connection).await?;
    // Subscribe before asking, so an owner change in between is not lost.
    let mut changes = proxy.receive_name_owner_changed_with_args(&[(0, name)]).await?;

    owner_at_start(proxy.name_has_owner(BusName::try_from(name)?).await?, presence);

    while let Some(signal) = changes.next().await {
        let args = signal.args()?;
        let new_owner: &Option<UniqueName<'_>> = args.new_owner();
        owner_changed(new_owner.as_ref().map(|owner| owner.as_str()), presence);
    }

    Ok(())
}
