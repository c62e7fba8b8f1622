//! System state record and the transient values that update it
//!
//! `SystemState` is the single mutable record the reconciler owns. Every
//! signal source writes a subset of its fields; nothing here assumes the
//! fields agree with each other at any moment.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything the reconciler knows about the machine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemState {
    /// Running from battery rather than AC
    pub on_battery: bool,

    /// The machine has a lid switch at all
    pub lid_present: bool,

    /// Lid is currently closed
    pub lid_closed: bool,

    /// External output is connected
    pub ext_display_present: bool,

    /// External output is driven by a CRTC
    pub ext_display_active: bool,

    /// Internal panel is connected
    pub int_display_present: bool,

    /// Internal panel is driven by a CRTC
    pub int_display_active: bool,
}

impl SystemState {
    /// Overwrite the power/lid fields from a fresh snapshot
    pub fn set_power(&mut self, snapshot: PowerSnapshot) {
        self.on_battery = snapshot.on_battery;
        self.lid_present = snapshot.lid_present;
        self.lid_closed = snapshot.lid_closed;
    }

    /// Overwrite the present/active pair belonging to `role`
    pub fn set_output(&mut self, role: OutputRole, present: bool, active: bool) {
        match role {
            OutputRole::External => {
                self.ext_display_present = present;
                self.ext_display_active = active;
            }
            OutputRole::Internal => {
                self.int_display_present = present;
                self.int_display_active = active;
            }
        }
    }
}

impl fmt::Display for SystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "battery={} lid(present={} closed={}) ext(present={} active={}) int(present={} active={})",
            self.on_battery,
            self.lid_present,
            self.lid_closed,
            self.ext_display_present,
            self.ext_display_active,
            self.int_display_present,
            self.int_display_active,
        )
    }
}

/// Power and lid attributes as reported by the power manager
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerSnapshot {
    pub on_battery: bool,
    pub lid_present: bool,
    pub lid_closed: bool,
}

/// Which of the two managed outputs a name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputRole {
    External,
    Internal,
}

/// One output's status, built from a notification or the startup scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputEvent {
    pub name: String,
    pub connected: bool,
    pub has_active_crtc: bool,
}

/// Name table mapping protocol output identifiers to roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputNames {
    /// Output name of the external monitor (e.g. "DVI1", "HDMI-1")
    pub external: String,

    /// Output name of the built-in panel (e.g. "LVDS1", "eDP-1")
    pub internal: String,
}

impl OutputNames {
    pub fn new(external: impl Into<String>, internal: impl Into<String>) -> Self {
        Self {
            external: external.into(),
            internal: internal.into(),
        }
    }

    /// Resolve an output name to its role, if it is one we manage
    pub fn role_of(&self, name: &str) -> Option<OutputRole> {
        if name == self.external {
            Some(OutputRole::External)
        } else if name == self.internal {
            Some(OutputRole::Internal)
        } else {
            None
        }
    }
}

impl Default for OutputNames {
    fn default() -> Self {
        Self::new("DVI1", "LVDS1")
    }
}
