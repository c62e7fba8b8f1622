//! Error types shared across the daemon
//!
//! Setup failures are fatal and end the process with a failure status;
//! everything that can go wrong once the loop runs is logged where it
//! happens and never reaches this type.

use thiserror::Error;

/// Failures while bringing the daemon up
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("cannot connect to the X server: {0}")]
    DisplayConnect(#[from] x11rb::errors::ConnectError),

    #[error("X server does not provide the RandR extension")]
    RandrMissing,

    #[error("RandR {major}.{minor} is too old, 1.3 or newer is required")]
    RandrTooOld { major: u32, minor: u32 },

    #[error("display setup failed: {0}")]
    Display(#[from] crate::display::DisplayError),

    #[error("cannot create event loop: {0}")]
    EventLoop(#[source] calloop::Error),

    #[error("cannot reach {service} on the system bus: {source}")]
    Bus {
        service: &'static str,
        #[source]
        source: zbus::Error,
    },

    #[error("cannot install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

impl SetupError {
    pub fn bus(service: &'static str) -> impl FnOnce(zbus::Error) -> Self {
        move |source| SetupError::Bus { service, source }
    }
}
