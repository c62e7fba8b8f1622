//! # monitord
//!
//! Watches RandR output changes and UPower's battery/lid state, switches
//! between dualhead, internal-only and external-only layouts, and holds
//! logind's lid-switch inhibitor while an external monitor is in use.
//!
//! There are no command line flags; see `MONITORD_CONFIG` for the
//! configuration file location.

use anyhow::Result;
use log::{error, info};
use std::process::ExitCode;

use monitord::{daemon, logging, MonitordConfig};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let path = MonitordConfig::path_from_env();
    let config = MonitordConfig::load_or_default(&path);

    // Logging comes up before config errors are reported
    logging::init(config.as_ref().map(|c| c.general.debug).unwrap_or(false));

    info!("🚀 Starting {}", monitord::DESCRIPTION);
    info!(
        "📄 Version: {} ({}, built {})",
        monitord::VERSION,
        monitord::GIT_COMMIT,
        monitord::BUILD_DATE
    );

    let config = config?;
    info!("📝 Configuration: {}", path.display());

    daemon::run(&config)
}
