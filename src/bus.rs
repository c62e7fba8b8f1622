//! System bus helpers

use log::debug;
use zbus::blocking::fdo::DBusProxy;
use zbus::names::BusName;

/// Fail unless `service` is running or can be activated on `bus`
///
/// Building a proxy never talks to the peer, so this is the setup check
/// that actually reaches the bus.
pub fn require_service(bus: &zbus::blocking::Connection, service: &str) -> zbus::Result<()> {
    let dbus = DBusProxy::new(bus)?;
    let name = BusName::try_from(service)?;

    if dbus.name_has_owner(name)? {
        debug!("{} is running", service);
        return Ok(());
    }

    let activatable = dbus
        .list_activatable_names()?
        .iter()
        .any(|candidate| candidate.as_str() == service);
    if activatable {
        debug!("{} is activatable", service);
        return Ok(());
    }

    Err(zbus::Error::Failure(format!(
        "{} is neither running nor activatable",
        service
    )))
}
