//! Unit tests for configuration module
//!
//! Tests configuration parsing, validation, file handling,
//! and edge cases in configuration handling.

use super::*;
use anyhow::Result;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_default_configuration_is_valid() {
    let config = MonitordConfig::default();
    config.validate().unwrap();

    assert_eq!(config.outputs.external, "DVI1");
    assert_eq!(config.outputs.internal, "LVDS1");
    assert_eq!(config.display.command, "xrandr");
    assert_eq!(config.inhibitor.what, "handle-lid-switch");
    assert_eq!(config.inhibitor.mode, "block");
    assert!(!config.general.debug);
}

#[test]
fn test_configuration_from_file() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("monitord.toml");

    let test_config = r#"
[outputs]
external = "HDMI-1"
internal = "eDP-1"

[display]
command = "/usr/bin/xrandr"

[inhibitor]
who = "dock"
why = "Docked"

[general]
debug = true
"#;
    fs::write(&file_path, test_config)?;

    let config = MonitordConfig::load(&file_path)?;
    assert_eq!(config.outputs, OutputNames::new("HDMI-1", "eDP-1"));
    assert_eq!(config.display.command, "/usr/bin/xrandr");
    assert_eq!(config.inhibitor.who, "dock");
    assert_eq!(config.inhibitor.why, "Docked");
    // Unspecified keys keep their defaults
    assert_eq!(config.inhibitor.what, "handle-lid-switch");
    assert_eq!(config.inhibitor.mode, "block");
    assert!(config.general.debug);

    Ok(())
}

#[test]
fn test_partial_sections_use_defaults() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("partial.toml");
    fs::write(&file_path, "[outputs]\nexternal = \"DP-1\"\n")?;

    let config = MonitordConfig::load(&file_path)?;
    assert_eq!(config.outputs.external, "DP-1");
    assert_eq!(config.outputs.internal, "LVDS1");
    assert_eq!(config.display, DisplayConfig::default());
    assert_eq!(config.inhibitor, InhibitorConfig::default());

    Ok(())
}

#[test]
fn test_empty_file_is_default() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("empty.toml");
    fs::write(&file_path, "")?;

    assert_eq!(MonitordConfig::load(&file_path)?, MonitordConfig::default());
    Ok(())
}

#[test]
fn test_missing_file_falls_back_to_defaults() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("does-not-exist.toml");

    assert!(MonitordConfig::load(&file_path).is_err());
    assert_eq!(
        MonitordConfig::load_or_default(&file_path)?,
        MonitordConfig::default()
    );
    Ok(())
}

#[test]
fn test_invalid_toml_is_rejected_even_with_fallback() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("broken.toml");
    fs::write(&file_path, "[outputs\nexternal = ")?;

    assert!(MonitordConfig::load_or_default(&file_path).is_err());
    Ok(())
}

#[test]
fn test_wrong_value_type_is_rejected() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("types.toml");
    fs::write(&file_path, "[general]\ndebug = \"yes\"\n")?;

    assert!(MonitordConfig::load(&file_path).is_err());
    Ok(())
}

#[test]
fn test_validation_rejects_bad_output_names() {
    let mut config = MonitordConfig::default();
    config.outputs.external = String::new();
    assert!(config.validate().is_err());

    let mut config = MonitordConfig::default();
    config.outputs.internal = "   ".to_string();
    assert!(config.validate().is_err());

    let mut config = MonitordConfig::default();
    config.outputs.external = "--off".to_string();
    assert!(config.validate().is_err());

    let mut config = MonitordConfig::default();
    config.outputs.internal = config.outputs.external.clone();
    assert!(config.validate().is_err());
}

#[test]
fn test_validation_rejects_bad_inhibitor_mode() {
    let mut config = MonitordConfig::default();
    config.inhibitor.mode = "weak".to_string();
    assert!(config.validate().is_err());

    config.inhibitor.mode = "delay".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validation_rejects_empty_command() {
    let mut config = MonitordConfig::default();
    config.display.command = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_invalid_file_fails_validation_on_load() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("same.toml");
    fs::write(&file_path, "[outputs]\nexternal = \"X\"\ninternal = \"X\"\n")?;

    let err = MonitordConfig::load(&file_path).unwrap_err();
    assert!(err.to_string().contains("must differ"));
    Ok(())
}

#[test]
fn test_save_and_reload() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("saved.toml");

    let mut config = MonitordConfig::default();
    config.outputs = OutputNames::new("HDMI-2", "eDP-1");
    config.inhibitor.mode = "delay".to_string();
    config.save(&file_path)?;

    assert_eq!(MonitordConfig::load(&file_path)?, config);
    Ok(())
}

#[test]
fn test_home_expansion() -> Result<()> {
    let home = std::env::var("HOME")?;
    let expanded = expand_home(Path::new("~/.config/monitord/monitord.toml"))?;
    assert_eq!(
        expanded,
        Path::new(&home).join(".config/monitord/monitord.toml")
    );

    let absolute = expand_home(Path::new("/etc/monitord.toml"))?;
    assert_eq!(absolute, Path::new("/etc/monitord.toml"));
    Ok(())
}

#[test]
#[serial_test::serial]
fn test_path_from_env() {
    std::env::set_var(CONFIG_ENV, "/tmp/monitord-test.toml");
    assert_eq!(
        MonitordConfig::path_from_env(),
        Path::new("/tmp/monitord-test.toml")
    );

    std::env::remove_var(CONFIG_ENV);
    assert_eq!(
        MonitordConfig::path_from_env(),
        Path::new(DEFAULT_CONFIG_PATH)
    );
}
