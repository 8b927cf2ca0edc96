// SPDX-License-Identifier: LGPL-3.0-only
//! `org.gnome.ScreenSaver` client over a shared session bus connection.

use zbus::blocking::{Connection, Proxy};
use zbus::proxy::MethodFlags;
use zbus::Result as ZbusResult;

use super::watcher::{self, ServicePresence, WatchHandle};
use super::{BusCall, ScreensaverBus, GS_INTERFACE, GS_PATH, GS_SERVICE};
use crate::error::{InhibitError, UNKNOWN_METHOD_ERROR};

/// Client for the screensaver service.
///
/// Holds a clone of the caller's connection; the connection itself is
/// managed by the application.
pub struct SessionScreensaver {
    connection: Connection,
}

impl SessionScreensaver {
    /// Create a client sharing `connection` with the application.
    pub fn new(connection: &Connection) -> Self {
        Self {
            connection: connection.clone(),
        }
    }

    fn proxy(&self) -> ZbusResult<Proxy<'_>> {
        Proxy::new(&self.connection, GS_SERVICE, GS_PATH, GS_INTERFACE)
    }

    fn send(&self, call: &BusCall) -> ZbusResult<Option<u32>> {
        let proxy = self.proxy()?;
        let method = call.method();
        let flags = MethodFlags::NoAutoStart.into();

        match call {
            BusCall::Inhibit { application, reason } => {
                let reply =
                    proxy.call_with_flags(method, flags, &(application.as_str(), reason.as_str()));
                inhibit_cookie(reply)
            },
            BusCall::InhibitActivation { reason } => {
                let _: Option<()> = proxy.call_with_flags(method, flags, &(reason.as_str(),))?;
                Ok(None)
            },
            BusCall::UnInhibit { cookie } => {
                let _: Option<()> = proxy.call_with_flags(method, flags, &(*cookie,))?;
                Ok(None)
            },
            BusCall::AllowActivation => {
                let _: Option<()> = proxy.call_with_flags(method, flags, &())?;
                Ok(None)
            },
        }
    }
}

impl ScreensaverBus for SessionScreensaver {
    fn call(&self, call: &BusCall) -> Result<Option<u32>, InhibitError> {
        self.send(call).map_err(|err| classify(call.method(), err))
    }

    fn watch(&self, presence: ServicePresence) -> Result<WatchHandle, InhibitError> {
        Ok(watcher::watch_name(&self.connection, GS_SERVICE, presence))
    }
}

/// Read the cookie out of an `Inhibit` reply.
///
/// A method return whose body is not a single `u` still means the call
/// succeeded; it is taken as cookie 0.
fn inhibit_cookie(reply: ZbusResult<Option<u32>>) -> ZbusResult<Option<u32>> {
    match reply {
        Err(zbus::Error::Variant(err)) => {
            log::debug!("Inhibit reply carries no cookie: {err}");
            Ok(Some(0))
        },
        reply => reply,
    }
}

/// Split UnknownMethod replies from every other failure.
fn classify(method: &str, err: zbus::Error) -> InhibitError {
    let unknown = match &err {
        zbus::Error::MethodError(name, _, _) => name.as_str() == UNKNOWN_METHOD_ERROR,
        zbus::Error::FDO(fdo) => matches!(**fdo, zbus::fdo::Error::UnknownMethod(_)),
        _ => false,
    };

    let message = err.to_string();
    if unknown {
        InhibitError::UnknownMethod {
            method: method.to_string(),
            message,
        }
    } else {
        InhibitError::Bus {
            method: method.to_string(),
            message,
        }
    }
}
