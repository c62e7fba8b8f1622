//! State reconciler
//!
//! Every signal source funnels into one [`Reconciler`]. It overwrites the
//! relevant part of [`SystemState`] and then runs [`Reconciler::apply`],
//! which re-derives the desired display topology and inhibitor intent from
//! scratch. Nothing is remembered between calls apart from the state record
//! and the lock itself, so the same input always yields the same command.

use log::{debug, warn};
use std::fmt;

use crate::inhibitor::{InhibitorBackend, InhibitorManager};
use crate::state::{OutputRole, PowerSnapshot, SystemState};
use crate::topology::{DisplayConfigurator, Topology};



/// What the inhibitor policy asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InhibitorIntent {
    Acquire,
    Release,
}

/// Outcome of one `apply()` pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub topology: Option<Topology>,
    pub inhibitor: InhibitorIntent,
}

/// Pick the topology for `state`; first matching rule wins
pub fn decide_topology(state: &SystemState, inhibitor_held: bool) -> Option<Topology> {
    let ext_idle = state.ext_display_present && !state.ext_display_active;
    let int_idle = state.int_display_present && !state.int_display_active;

    if !state.lid_closed && (ext_idle || int_idle) {
        Some(Topology::Dualhead)
    } else if state.ext_display_active && !state.ext_display_present {
        Some(Topology::InternalOnly)
    } else if state.ext_display_active
        && state.ext_display_present
        && state.lid_closed
        && inhibitor_held
    {
        Some(Topology::ExternalOnly)
    } else {
        None
    }
}

/// Hold the lid switch only on AC with a working external monitor
pub fn inhibitor_policy(state: &SystemState) -> InhibitorIntent {
    if !state.on_battery
        && state.lid_present
        && state.ext_display_present
        && state.ext_display_active
    {
        InhibitorIntent::Acquire
    } else {
        InhibitorIntent::Release
    }
}

pub struct Reconciler<D, B: InhibitorBackend> {
    state: SystemState,
    configurator: D,
    inhibitor: InhibitorManager<B>,
}

impl<D: DisplayConfigurator, B: InhibitorBackend> Reconciler<D, B> {
    pub fn new(configurator: D, backend: B) -> Self {
        Self {
            state: SystemState::default(),
            configurator,
            inhibitor: InhibitorManager::new(backend),
        }
    }

    pub fn state(&self) -> &SystemState {
        &self.state
    }

    pub fn inhibitor(&self) -> &InhibitorManager<B> {
        &self.inhibitor
    }

    pub fn configurator(&self) -> &D {
        &self.configurator
    }

    /// Store an output's status without reconciling (startup seeding)
    pub fn record_output(&mut self, role: OutputRole, connected: bool, active: bool) {
        self.state.set_output(role, connected, active);
    }

    pub fn update_output(&mut self, role: OutputRole, connected: bool, active: bool) -> Decision {
        self.record_output(role, connected, active);
        self.apply()
    }

    pub fn update_power(&mut self, snapshot: PowerSnapshot) -> Decision {
        self.state.set_power(snapshot);
        self.apply()
    }

    /// Hand an inhibitor reply to the lock manager
    ///
    /// Reconciles again only when the lock ended up held; a failed request
    /// is not retried until some other signal calls `apply()`.
    pub fn inhibitor_resolved<E: fmt::Display>(
        &mut self,
        result: Result<B::Handle, E>,
    ) -> Option<Decision> {
        if self.inhibitor.resolve(result) {
            Some(self.apply())
        } else {
            None
        }
    }

    /// Evaluate the current state without side effects
    pub fn decide(&self) -> Decision {
        Decision {
            topology: decide_topology(&self.state, self.inhibitor.is_held()),
            inhibitor: inhibitor_policy(&self.state),
        }
    }

    /// Reconcile hardware with the current state
    pub fn apply(&mut self) -> Decision {
        let decision = self.decide();
        debug!("Reconciling {} -> {:?}", self.state, decision);

        if let Some(topology) = decision.topology {
            if let Err(e) = self.configurator.configure(topology) {
                warn!("Failed to switch to {} topology: {:#}", topology, e);
            }
        }

        match decision.inhibitor {
            InhibitorIntent::Acquire => self.inhibitor.acquire(),
            InhibitorIntent::Release => self.inhibitor.release(),
        }

        decision
    }
}
