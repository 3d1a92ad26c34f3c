//! Integration tests for Paneflow
//!
//! These tests verify end-to-end functionality: configuration files feeding
//! the registry, scripted command runs, and the interaction between the
//! controller, windows and the headless UI.

use anyhow::Result;
use parking_lot::Mutex;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

use paneflow::backend::SelectionTarget;
use paneflow::clock::FrameClock;
use paneflow::script::{self, ScriptCommand};
use paneflow::window::{ControlId, WindowCategory};
use paneflow::{
    HeadlessUi, PaneflowConfig, StackError, UiServices, WindowRegistry, WindowStackController,
};

const CONFIG: &str = r#"
[stack]
animate_by_default = true

[canvas]
fade_duration_ms = 200

[animation]
enabled = true
open_duration_ms = 120
close_duration_ms = 90

[clock]
frame_interval_ms = 10

[[windows]]
kind = "home"
default_control = 1

[[windows]]
kind = "inventory"

[[windows]]
kind = "pause"
category = "modal"
hide_other = true
"#;

struct Setup {
    controller: WindowStackController,
    ui: Arc<HeadlessUi>,
    clock: FrameClock,
    events: Arc<Mutex<Vec<String>>>,
}

fn setup(config: &PaneflowConfig) -> Setup {
    let clock = FrameClock::new();
    let (services, ui) = UiServices::headless(clock.clone());
    let controller =
        WindowStackController::new(config, WindowRegistry::from_config(config), services);

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    controller.add_listener(move |event| {
        let entry = match event.window() {
            Some(window) => format!("{}:{}", event.name(), window.kind()),
            None => event.name().to_string(),
        };
        sink.lock().push(entry);
    });

    Setup {
        controller,
        ui,
        clock,
        events,
    }
}

fn load_config() -> Result<PaneflowConfig> {
    let dir = tempdir()?;
    let path = dir.path().join("paneflow.toml");
    fs::write(&path, CONFIG)?;
    PaneflowConfig::load(&path)
}

/// Configured kinds become registered, animated window types
#[tokio::test(start_paused = true)]
async fn test_config_file_drives_registry() -> Result<()> {
    let config = load_config()?;
    let setup = setup(&config);
    let _driver = setup.clock.spawn_driver(config.clock.frame_interval());

    assert_eq!(setup.controller.registry().len(), 3);

    let pause = setup.controller.create(&"pause".into())?;
    assert_eq!(pause.category(), WindowCategory::Modal);
    assert!(pause.hide_other());
    assert!(pause.is_animated());

    let opening = setup.controller.open(&pause, true)?;
    assert!(pause.is_in_transition());
    opening.await;

    assert!(pause.is_focused());
    assert!(setup.clock.unscaled_time() >= Duration::from_millis(120));
    Ok(())
}

/// A full scripted session leaves the stack empty and the canvas visible
#[tokio::test(start_paused = true)]
async fn test_scripted_session() -> Result<()> {
    let config = load_config()?;
    let setup = setup(&config);
    let _driver = setup.clock.spawn_driver(config.clock.frame_interval());

    let commands = script::parse_script(
        "open:home,open:inventory,open:pause,hide-canvas,show-canvas,back,wait:50,close-all",
    )?;
    for command in &commands {
        script::execute(&setup.controller, command).await;
    }

    assert!(setup.controller.is_empty());
    assert!(setup.controller.focused_window().is_none());
    assert_eq!(setup.ui.alpha(), 1.0);
    assert!(!setup.ui.is_interaction_blocked());

    let events = setup.events.lock().clone();
    assert_eq!(events.last().map(String::as_str), Some("closed-all"));
    // back closed pause, which brought inventory and home back
    let backed = events.iter().position(|e| e == "backed:pause").unwrap();
    assert!(events[backed..].contains(&"shown:inventory".to_string()));
    assert!(events[backed..].contains(&"shown:home".to_string()));
    Ok(())
}

/// Rejected commands are logged and skipped without touching the stack
#[tokio::test(start_paused = true)]
async fn test_rejected_script_commands_are_skipped() -> Result<()> {
    let mut config = load_config()?;
    config.animation.enabled = false;
    let setup = setup(&config);

    for command in [
        ScriptCommand::Open("home".into()),
        ScriptCommand::Open("home".into()),
        ScriptCommand::Close("inventory".into()),
        ScriptCommand::Open("unknown".into()),
    ] {
        script::execute(&setup.controller, &command).await;
    }

    assert_eq!(setup.controller.len(), 1);
    assert!(setup.controller.exists(&"home".into()));
    assert_eq!(setup.ui.block_count(), 1);
    Ok(())
}

/// Focus handoff restores the configured default control
#[test]
fn test_focus_selects_default_control() -> Result<()> {
    let mut config = load_config()?;
    config.animation.enabled = false;
    let setup = setup(&config);

    let home = setup.controller.create(&"home".into())?;
    setup.controller.open(&home, false)?;
    assert_eq!(setup.ui.selected(), Some(ControlId(1)));

    setup.controller.open_kind(&"pause".into())?;
    assert_eq!(setup.ui.selected(), None);
    Ok(())
}

#[test]
fn test_unregistered_kind_is_reported() -> Result<()> {
    let config = load_config()?;
    let setup = setup(&config);

    assert_eq!(
        setup.controller.open_kind(&"shop".into()).unwrap_err(),
        StackError::NotRegistered("shop".into())
    );
    assert!(setup.controller.is_empty());
    Ok(())
}
