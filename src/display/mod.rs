//! Display signal source
//!
//! Turns RandR notifications into reconciler updates. The protocol side
//! lives in [`x11`]; this module only knows how to look up an output's
//! status through an [`OutputProbe`] and map it onto a role.

pub mod x11;

use log::{debug, info, warn};
use thiserror::Error;
use x11rb::errors::{ConnectionError, ReplyError};

use crate::inhibitor::InhibitorBackend;
use crate::reconciler::{Decision, Reconciler};
use crate::state::{OutputEvent, OutputNames, OutputRole};
use crate::topology::DisplayConfigurator;


#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("X11 connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("X11 request failed: {0}")]
    Reply(#[from] ReplyError),
}

/// A display event reduced to what the daemon cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayNotification {
    /// RandR output change, with the values carried by the event itself
    OutputChange {
        output: u32,
        connected: bool,
        crtc: u32,
    },
    /// Anything else the server sent us
    Other(String),
}

/// Synchronous output status queries
pub trait OutputProbe {
    /// Current name and status of one output
    fn output_status(&self, output: u32) -> Result<OutputEvent, DisplayError>;

    /// Status of every output the screen knows about
    fn enumerate(&self) -> Result<Vec<OutputEvent>, DisplayError>;

    /// Start receiving output change notifications
    fn subscribe(&self) -> Result<(), DisplayError>;
}

pub struct DisplayWatcher<P> {
    probe: P,
    names: OutputNames,
}

impl<P: OutputProbe> DisplayWatcher<P> {
    pub fn new(probe: P, names: OutputNames) -> Self {
        Self { probe, names }
    }

    pub fn names(&self) -> &OutputNames {
        &self.names
    }

    /// Subscribe to output changes, then seed from a full scan
    ///
    /// Anything that changes during the scan arrives later as a
    /// notification, so the seeded state can never silently go stale.
    pub fn start<D, B>(&self, reconciler: &mut Reconciler<D, B>) -> Result<usize, DisplayError>
    where
        D: DisplayConfigurator,
        B: InhibitorBackend,
    {
        self.probe.subscribe()?;
        self.seed(reconciler)
    }

    /// Seed the reconciler from a full scan without reconciling
    ///
    /// Returns how many managed outputs were found.
    pub fn seed<D, B>(&self, reconciler: &mut Reconciler<D, B>) -> Result<usize, DisplayError>
    where
        D: DisplayConfigurator,
        B: InhibitorBackend,
    {
        let mut seeded = 0;
        for event in self.probe.enumerate()? {
            if let Some(role) = self.role_of(&event) {
                reconciler.record_output(role, event.connected, event.has_active_crtc);
                seeded += 1;
            }
        }
        debug!("Seeded state: {}", reconciler.state());
        Ok(seeded)
    }

    /// Handle one dispatched notification; always keeps the source registered
    pub fn handle<D, B>(
        &self,
        notification: DisplayNotification,
        reconciler: &mut Reconciler<D, B>,
    ) -> bool
    where
        D: DisplayConfigurator,
        B: InhibitorBackend,
    {
        match notification {
            DisplayNotification::OutputChange {
                output,
                connected,
                crtc,
            } => {
                debug!(
                    "Output {} changed: connected={} crtc={}",
                    output, connected, crtc
                );
                match self.probe.output_status(output) {
                    Ok(event) => {
                        self.output_changed(&event, reconciler);
                    }
                    Err(e) => warn!("Failed to query output {}: {}", output, e),
                }
            }
            DisplayNotification::Other(event) => {
                info!("Ignoring unknown X event");
                debug!("{}", event);
            }
        }
        true
    }

    /// Apply one output's status to the reconciler
    pub fn output_changed<D, B>(
        &self,
        event: &OutputEvent,
        reconciler: &mut Reconciler<D, B>,
    ) -> Option<Decision>
    where
        D: DisplayConfigurator,
        B: InhibitorBackend,
    {
        let role = self.role_of(event)?;
        info!(
            "Output {} is {}{}",
            event.name,
            if event.connected { "connected" } else { "disconnected" },
            if event.has_active_crtc { " and active" } else { "" }
        );
        Some(reconciler.update_output(role, event.connected, event.has_active_crtc))
    }

    fn role_of(&self, event: &OutputEvent) -> Option<OutputRole> {
        let role = self.names.role_of(&event.name);
        if role.is_none() {
            debug!("Output {} is not managed", event.name);
        }
        role
    }
}
