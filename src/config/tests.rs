//! Unit tests for configuration module
//!
//! Tests configuration parsing, validation, serialization/deserialization,
//! and edge cases in configuration handling.

use super::*;
use anyhow::Result;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_default_configuration_is_valid() {
    let config = PaneflowConfig::default();

    assert!(config.validate().is_ok());
    assert!(config.stack.animate_by_default);
    assert_eq!(config.canvas.fade_duration(), Duration::from_millis(250));
    assert_eq!(config.clock.frame_interval(), Duration::from_millis(16));
    assert!(config.windows.is_empty());
}

#[test]
fn test_configuration_serialization_roundtrip() -> Result<()> {
    let mut original_config = PaneflowConfig::default();
    original_config
        .windows
        .push(WindowDefinition::new("settings", WindowCategory::Modal, true));

    let toml_string = toml::to_string(&original_config)?;
    let deserialized_config: PaneflowConfig = toml::from_str(&toml_string)?;

    assert_eq!(original_config, deserialized_config);

    Ok(())
}

#[test]
fn test_configuration_from_file() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("test_config.toml");

    let test_config = r#"
[stack]
animate_by_default = false

[canvas]
fade_duration_ms = 400

[animation]
enabled = true
open_duration_ms = 120
close_duration_ms = 90
blend_ms = 10

[[windows]]
kind = "home"

[[windows]]
kind = "inventory"
category = "modal"
hide_other = true
default_control = 7
"#;

    fs::write(&file_path, test_config)?;

    let config = PaneflowConfig::load(&file_path)?;

    assert!(!config.stack.animate_by_default);
    assert_eq!(config.canvas.fade_duration_ms, 400);
    assert_eq!(config.animation.open_duration_ms, 120);
    // Missing sections fall back to defaults
    assert_eq!(config.clock.frame_interval_ms, 16);

    assert_eq!(config.windows.len(), 2);
    let home = config.window("home").expect("home is defined");
    assert_eq!(home.category, WindowCategory::Normal);
    assert!(!home.hide_other);

    let inventory = config.window("inventory").expect("inventory is defined");
    assert_eq!(inventory.category, WindowCategory::Modal);
    assert!(inventory.hide_other);
    assert_eq!(inventory.default_control(), Some(ControlId(7)));

    Ok(())
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let result = PaneflowConfig::load(dir.path().join("missing.toml"));
    assert!(result.is_err());
}

#[test]
fn test_invalid_toml_is_an_error() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("broken.toml");
    fs::write(&file_path, "[canvas\nfade_duration_ms = ")?;

    assert!(PaneflowConfig::load(&file_path).is_err());
    Ok(())
}

#[test]
fn test_zero_frame_interval_is_rejected() {
    let mut config = PaneflowConfig::default();
    config.clock.frame_interval_ms = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_oversized_blend_is_rejected() {
    let mut config = PaneflowConfig::default();
    config.animation.blend_ms = 10_000;
    assert!(config.validate().is_err());
}

#[test]
fn test_duplicate_window_kinds_are_rejected() {
    let mut config = PaneflowConfig::default();
    config
        .windows
        .push(WindowDefinition::new("shop", WindowCategory::Normal, false));
    config
        .windows
        .push(WindowDefinition::new("shop", WindowCategory::Modal, true));

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("shop"));
}

#[test]
fn test_empty_window_kind_is_rejected() {
    let mut config = PaneflowConfig::default();
    config
        .windows
        .push(WindowDefinition::new("  ", WindowCategory::Normal, false));
    assert!(config.validate().is_err());
}

#[test]
fn test_save_and_reload() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("saved.toml");

    let mut config = PaneflowConfig::default();
    config.canvas.fade_duration_ms = 500;
    config
        .windows
        .push(WindowDefinition::new("pause", WindowCategory::Modal, true));
    config.save(&file_path)?;

    let reloaded = PaneflowConfig::load(&file_path)?;
    assert_eq!(reloaded, config);

    Ok(())
}

#[test]
fn test_merge_partial_overrides_changed_sections_only() {
    let mut base = PaneflowConfig::default();
    base.clock.frame_interval_ms = 33;
    base.windows
        .push(WindowDefinition::new("home", WindowCategory::Normal, false));

    let mut partial = PaneflowConfig::default();
    partial.canvas.fade_duration_ms = 100;

    let merged = base.merge_partial(partial);

    assert_eq!(merged.canvas.fade_duration_ms, 100);
    assert_eq!(merged.clock.frame_interval_ms, 33);
    assert_eq!(merged.windows.len(), 1);
}
