//! systemd-logind inhibitor backend
//!
//! `Inhibit` returns a file descriptor; the lock lasts exactly as long as
//! that descriptor stays open. The call runs on the event loop's executor
//! so the loop never blocks on the bus.

use calloop::futures::Scheduler;
use zbus::proxy;
use zbus::zvariant::OwnedFd;

use super::{InhibitorBackend, InhibitorError};
use crate::bus::require_service;
use crate::config::InhibitorConfig;

pub const LOGIND_SERVICE: &str = "org.freedesktop.login1";

#[proxy(
    interface = "org.freedesktop.login1.Manager",
    default_service = "org.freedesktop.login1",
    default_path = "/org/freedesktop/login1"
)]
trait LoginManager {
    fn inhibit(&self, what: &str, who: &str, why: &str, mode: &str) -> zbus::Result<OwnedFd>;
}

/// Result delivered back to the loop once `Inhibit` returns
pub type InhibitReply = zbus::Result<OwnedFd>;

pub struct LogindInhibitor {
    bus: zbus::Connection,
    scheduler: Scheduler<InhibitReply>,
    request: InhibitorConfig,
}

impl LogindInhibitor {
    /// Bind to logind on `bus`; fails if logind is not on the bus
    pub fn new(
        bus: &zbus::blocking::Connection,
        scheduler: Scheduler<InhibitReply>,
        request: &InhibitorConfig,
    ) -> zbus::Result<Self> {
        require_service(bus, LOGIND_SERVICE)?;
        Ok(Self {
            bus: bus.inner().clone(),
            scheduler,
            request: request.clone(),
        })
    }
}

impl InhibitorBackend for LogindInhibitor {
    type Handle = OwnedFd;

    fn request(&mut self) -> Result<(), InhibitorError> {
        let bus = self.bus.clone();
        let request = self.request.clone();
        self.scheduler
            .schedule(async move {
                let manager = LoginManagerProxy::new(&bus).await?;
                manager
                    .inhibit(&request.what, &request.who, &request.why, &request.mode)
                    .await
            })
            .map_err(|_| InhibitorError::ExecutorGone)
    }
}
