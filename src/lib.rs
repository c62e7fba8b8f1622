//! # monitord - lid and display reconciliation daemon
//!
//! Keeps a docked laptop's outputs and lid-switch handling consistent with
//! the hardware it is attached to.
//!
//! ## Architecture
//!
//! - `event_queue`: adapter that feeds X11 events into the calloop reactor
//! - `display`: RandR output changes and the startup scan
//! - `power`: UPower battery and lid state
//! - `reconciler`: decides topology and inhibitor intent from `SystemState`
//! - `inhibitor`: logind lid-switch lock lifecycle
//! - `topology`: runs the display configuration command
//! - `bus`: system bus service checks
//! - `config`: TOML configuration
//! - `daemon`: wiring and main loop
//!
//! ## Usage
//!
//! ```rust,no_run
//! use monitord::{daemon, MonitordConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = MonitordConfig::load_or_default(MonitordConfig::path_from_env())?;
//!     daemon::run(&config)
//! }
//! ```

pub mod bus;
pub mod config;
pub mod daemon;
pub mod display;
pub mod error;
pub mod event_queue;
pub mod inhibitor;
pub mod logging;
pub mod power;
pub mod reconciler;
pub mod state;
pub mod topology;

// Re-export main types for easy access
pub use config::MonitordConfig;
pub use error::SetupError;
pub use event_queue::{EventConnection, EventQueue};
pub use inhibitor::{InhibitorBackend, InhibitorManager};
pub use reconciler::{Decision, InhibitorIntent, Reconciler};
pub use state::{OutputEvent, OutputNames, OutputRole, PowerSnapshot, SystemState};
pub use topology::{DisplayConfigurator, Topology, XrandrCommand};

/// Version information for monitord
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
pub const GIT_COMMIT: &str = env!("MONITORD_GIT_COMMIT");
pub const BUILD_DATE: &str = env!("MONITORD_BUILD_DATE");
