//! Power and lid signal source backed by UPower
//!
//! Property reads go through an uncached proxy so every snapshot reflects
//! what UPower reports right now. Change notifications are watched from a
//! helper thread that only reads and forwards; the reconciler sees them on
//! the event loop through a calloop channel.

use anyhow::{Context, Result};
use calloop::channel::Sender;
use log::{debug, error, info, warn};
use std::thread::{self, JoinHandle};
use zbus::blocking::fdo::PropertiesProxy;
use zbus::proxy;
use zbus::proxy::CacheProperties;

use crate::bus::require_service;
use crate::state::PowerSnapshot;

pub const UPOWER_SERVICE: &str = "org.freedesktop.UPower";
const UPOWER_PATH: &str = "/org/freedesktop/UPower";

#[proxy(
    interface = "org.freedesktop.UPower",
    default_service = "org.freedesktop.UPower",
    default_path = "/org/freedesktop/UPower"
)]
trait UPower {
    #[zbus(property)]
    fn on_battery(&self) -> zbus::Result<bool>;

    #[zbus(property)]
    fn lid_is_present(&self) -> zbus::Result<bool>;

    #[zbus(property)]
    fn lid_is_closed(&self) -> zbus::Result<bool>;
}

/// Something that can report the current power and lid state
pub trait PowerSource {
    fn snapshot(&self) -> zbus::Result<PowerSnapshot>;
}

pub struct UPowerMonitor {
    proxy: UPowerProxyBlocking<'static>,
}

impl UPowerMonitor {
    /// Bind to UPower; fails if UPower is not on the bus
    pub fn connect(bus: &zbus::blocking::Connection) -> zbus::Result<Self> {
        require_service(bus, UPOWER_SERVICE)?;
        let proxy = UPowerProxyBlocking::builder(bus)
            .cache_properties(CacheProperties::No)
            .build()?;
        Ok(Self { proxy })
    }

    /// Subscribe to UPower property changes
    ///
    /// Changes are queued from this point on, so a snapshot taken after
    /// subscribing can only be followed by newer state, never miss it.
    pub fn subscribe(
        &self,
        bus: &zbus::blocking::Connection,
    ) -> Result<PowerWatch<impl Iterator + Send + 'static>> {
        let properties = PropertiesProxy::builder(bus)
            .destination(UPOWER_SERVICE)?
            .path(UPOWER_PATH)?
            .build()
            .context("Failed to create UPower properties proxy")?;
        let changes = properties
            .receive_properties_changed()
            .context("Failed to subscribe to UPower changes")?;
        Ok(PowerWatch::new(changes))
    }
}

impl PowerSource for UPowerMonitor {
    /// Read all three attributes
    fn snapshot(&self) -> zbus::Result<PowerSnapshot> {
        Ok(PowerSnapshot {
            on_battery: self.proxy.on_battery()?,
            lid_present: self.proxy.lid_is_present()?,
            lid_closed: self.proxy.lid_is_closed()?,
        })
    }
}

/// A subscription whose changes are not being forwarded yet
pub struct PowerWatch<I> {
    changes: I,
}

impl<I> PowerWatch<I>
where
    I: Iterator + Send + 'static,
{
    pub fn new(changes: I) -> Self {
        Self { changes }
    }

    /// Forward a fresh snapshot from `source` to `sender` on every change
    ///
    /// The thread ends when the subscription stream ends or the loop side
    /// of the channel is gone.
    pub fn forward<S>(self, source: S, sender: Sender<PowerSnapshot>) -> Result<JoinHandle<()>>
    where
        S: PowerSource + Send + 'static,
    {
        let changes = self.changes;
        thread::Builder::new()
            .name("upower-watch".to_string())
            .spawn(move || {
                if forward_changes(changes, &source, &sender) {
                    error!("UPower change stream ended");
                }
            })
            .context("Failed to spawn power watch thread")
    }
}

/// Send one snapshot per change; false once the receiver is gone
pub fn forward_changes<I, S>(changes: I, source: &S, sender: &Sender<PowerSnapshot>) -> bool
where
    I: IntoIterator,
    S: PowerSource,
{
    for _ in changes {
        match source.snapshot() {
            Ok(snapshot) => {
                debug!("Power state changed: {:?}", snapshot);
                if sender.send(snapshot).is_err() {
                    info!("Event loop gone, stopping power watch");
                    return false;
                }
            }
            Err(e) => warn!("Failed to read power state: {}", e),
        }
    }
    true
}
