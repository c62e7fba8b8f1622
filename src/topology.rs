//! Display topologies and the command that realizes them
//!
//! The reconciler only decides *which* topology it wants; turning that into
//! mode-setting is delegated to an external tool through the
//! [`DisplayConfigurator`] seam. The default implementation runs `xrandr`
//! with an explicit argument vector, never through a shell.

use anyhow::{Context, Result};
use log::{debug, info};
use std::fmt;
use std::process::Command;

use crate::config::DisplayConfig;
use crate::state::OutputNames;

/// The output configurations the daemon knows how to ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    /// Both outputs on, external above internal
    Dualhead,
    /// External off, internal on
    InternalOnly,
    /// Internal off, external left as is
    ExternalOnly,
}

impl Topology {
    /// Arguments for an xrandr-compatible command
    pub fn args(&self, names: &OutputNames) -> Vec<String> {
        let ext = names.external.as_str();
        let int = names.internal.as_str();
        let args: &[&str] = match self {
            Topology::Dualhead => &[
                "--output", ext, "--auto", "--above", int, "--output", int, "--auto",
            ],
            Topology::InternalOnly => &["--output", ext, "--off", "--output", int, "--auto"],
            Topology::ExternalOnly => &["--output", int, "--off"],
        };
        args.iter().map(|arg| arg.to_string()).collect()
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Topology::Dualhead => "dualhead",
            Topology::InternalOnly => "internal-only",
            Topology::ExternalOnly => "external-only",
        };
        f.write_str(name)
    }
}

/// Something that can put the outputs into a given topology
pub trait DisplayConfigurator {
    fn configure(&mut self, topology: Topology) -> Result<()>;
}

/// Runs the configured xrandr-compatible program
#[derive(Debug, Clone)]
pub struct XrandrCommand {
    program: String,
    names: OutputNames,
}

impl XrandrCommand {
    pub fn new(config: &DisplayConfig, names: OutputNames) -> Self {
        Self {
            program: config.command.clone(),
            names,
        }
    }

    /// Build the process invocation without running it
    pub fn command(&self, topology: Topology) -> Command {
        let mut command = Command::new(&self.program);
        command.args(topology.args(&self.names));
        command
    }
}

impl DisplayConfigurator for XrandrCommand {
    fn configure(&mut self, topology: Topology) -> Result<()> {
        let mut command = self.command(topology);
        info!("🖥️ Switching to {} topology", topology);
        debug!("Running {:?}", command);

        let status = command
            .status()
            .with_context(|| format!("Failed to run {}", self.program))?;
        if !status.success() {
            anyhow::bail!("{} exited with {}", self.program, status);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> OutputNames {
        OutputNames::new("DVI1", "LVDS1")
    }

    #[test]
    fn test_dualhead_args() {
        assert_eq!(
            Topology::Dualhead.args(&names()),
            ["--output", "DVI1", "--auto", "--above", "LVDS1", "--output", "LVDS1", "--auto"]
        );
    }

    #[test]
    fn test_internal_only_args() {
        assert_eq!(
            Topology::InternalOnly.args(&names()),
            ["--output", "DVI1", "--off", "--output", "LVDS1", "--auto"]
        );
    }

    #[test]
    fn test_external_only_args() {
        assert_eq!(
            Topology::ExternalOnly.args(&names()),
            ["--output", "LVDS1", "--off"]
        );
    }

    #[test]
    fn test_names_are_passed_verbatim() {
        // Output names with shell metacharacters stay a single argument
        let names = OutputNames::new("HDMI-1; rm -rf /", "eDP 1");
        let command = XrandrCommand::new(&DisplayConfig::default(), names).command(Topology::ExternalOnly);
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args, ["--output", "eDP 1", "--off"]);
        assert_eq!(command.get_program(), "xrandr");
    }

    #[test]
    fn test_failing_command_is_an_error() {
        let config = DisplayConfig {
            command: "false".to_string(),
        };
        let mut xrandr = XrandrCommand::new(&config, names());
        assert!(xrandr.configure(Topology::Dualhead).is_err());
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let config = DisplayConfig {
            command: "/nonexistent/monitord-xrandr".to_string(),
        };
        let mut xrandr = XrandrCommand::new(&config, names());
        assert!(xrandr.configure(Topology::InternalOnly).is_err());
    }
}
