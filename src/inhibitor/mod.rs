//! Lid-switch inhibitor lifecycle
//!
//! The manager tracks a single lock through `Free`, `Acquiring` and `Held`
//! and remembers whether the reconciler still wants it. Requests go out
//! through an [`InhibitorBackend`]; replies come back later through
//! [`InhibitorManager::resolve`], so at most one acquisition is ever in
//! flight.

pub mod logind;

use log::{debug, info, warn};
use std::fmt;
use thiserror::Error;


/// Why an acquisition could not even be started
#[derive(Debug, Error)]
pub enum InhibitorError {
    #[error("inhibitor executor has shut down")]
    ExecutorGone,
}

/// Something that can ask the session manager for a lock
///
/// `request` only starts the call. The outcome is delivered to
/// [`InhibitorManager::resolve`] by whoever drives the backend.
pub trait InhibitorBackend {
    /// Token that keeps the lock alive; dropping it releases the lock
    type Handle;

    fn request(&mut self) -> Result<(), InhibitorError>;
}

/// Where the lock currently is
#[derive(Debug)]
pub enum LockState<H> {
    Free,
    Acquiring,
    Held(H),
}

pub struct InhibitorManager<B: InhibitorBackend> {
    backend: B,
    state: LockState<B::Handle>,
    wanted: bool,
}

impl<B: InhibitorBackend> InhibitorManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: LockState::Free,
            wanted: false,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn state(&self) -> &LockState<B::Handle> {
        &self.state
    }

    pub fn is_held(&self) -> bool {
        matches!(self.state, LockState::Held(_))
    }

    pub fn is_acquiring(&self) -> bool {
        matches!(self.state, LockState::Acquiring)
    }

    /// Latest intent recorded by `acquire`/`release`
    pub fn is_wanted(&self) -> bool {
        self.wanted
    }

    /// Make sure the lock is held or on its way
    pub fn acquire(&mut self) {
        self.wanted = true;
        if !matches!(self.state, LockState::Free) {
            return;
        }

        match self.backend.request() {
            Ok(()) => {
                debug!("Requesting lid-switch inhibitor");
                self.state = LockState::Acquiring;
            }
            Err(e) => warn!("Failed to request lid-switch inhibitor: {}", e),
        }
    }

    /// Drop the lock if held; an in-flight request is released on arrival
    pub fn release(&mut self) {
        self.wanted = false;
        if self.is_held() {
            self.state = LockState::Free;
            info!("🔓 Released lid-switch inhibitor");
        }
    }

    /// Deliver the outcome of an earlier request
    ///
    /// Returns `true` when the lock is held as a result, which is the only
    /// case where the caller needs to reconcile again.
    pub fn resolve<E: fmt::Display>(&mut self, result: Result<B::Handle, E>) -> bool {
        if !self.is_acquiring() {
            warn!("Ignoring inhibitor reply with no request outstanding");
            return false;
        }

        match result {
            Ok(handle) if self.wanted => {
                self.state = LockState::Held(handle);
                info!("🔒 Holding lid-switch inhibitor");
                true
            }
            Ok(handle) => {
                drop(handle);
                self.state = LockState::Free;
                debug!("Inhibitor arrived after it stopped being wanted, released");
                false
            }
            Err(e) => {
                self.state = LockState::Free;
                warn!("Failed to take lid-switch inhibitor: {}", e);
                false
            }
        }
    }
}
