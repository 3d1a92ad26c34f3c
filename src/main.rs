//! # Paneflow - headless window stack driver
//!
//! Loads a configuration, registers the configured window kinds and runs a
//! script of stack commands against a headless UI, logging every lifecycle
//! event along the way.

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

use paneflow::clock::FrameClock;
use paneflow::config::WindowDefinition;
use paneflow::script::{self, ScriptCommand};
use paneflow::window::WindowCategory;
use paneflow::{PaneflowConfig, UiServices, WindowRegistry, WindowStackController};

#[derive(Parser, Debug)]
#[command(name = "paneflow")]
#[command(about = "Drive an interruption-safe window stack from the command line")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/paneflow/paneflow.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Open and close windows without animations
    #[arg(long)]
    no_animations: bool,

    /// Comma-separated commands, e.g. "open:home,open:pause,back,close-all"
    #[arg(short, long)]
    script: Option<String>,
}

/// Window kinds used when the configuration declares none
fn demo_windows() -> Vec<WindowDefinition> {
    vec![
        WindowDefinition::new("home", WindowCategory::Normal, false),
        WindowDefinition::new("inventory", WindowCategory::Normal, false),
        WindowDefinition::new("settings", WindowCategory::Normal, true),
        WindowDefinition::new("pause", WindowCategory::Modal, true),
    ]
}

/// Script run when none is given on the command line
fn demo_script(config: &PaneflowConfig) -> Vec<ScriptCommand> {
    let mut commands: Vec<_> = config
        .windows
        .iter()
        .map(|definition| ScriptCommand::Open(definition.window_kind()))
        .collect();
    commands.extend([
        ScriptCommand::HideCanvas,
        ScriptCommand::ShowCanvas,
        ScriptCommand::Back,
        ScriptCommand::CloseAll,
    ]);
    commands
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration before logging so `general.debug` can raise the level
    let loaded = PaneflowConfig::load(&cli.config);
    let debug = cli.debug || loaded.as_ref().is_ok_and(|config| config.general.debug);

    // Initialize logging
    if debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    info!("🚀 Starting Paneflow window stack driver");
    info!(
        "📄 Version: {} ({}, built {})",
        paneflow::VERSION,
        option_env!("PANEFLOW_GIT_COMMIT").unwrap_or("unknown commit"),
        env!("PANEFLOW_BUILD_DATE")
    );

    let mut config = match loaded {
        Ok(config) => {
            info!("✅ Configuration loaded from: {}", cli.config);
            config
        }
        Err(e) => {
            error!("❌ Failed to load configuration: {:#}", e);
            info!("📝 Using default configuration");
            PaneflowConfig::default()
        }
    };

    // Override config with CLI flags
    if cli.no_animations {
        config.stack.animate_by_default = false;
        config.animation.enabled = false;
        info!("🚫 Animations disabled via CLI flag");
    }
    if config.windows.is_empty() {
        info!("🗂️ No windows configured, registering the demo set");
        config.windows = demo_windows();
    }

    let commands = match &cli.script {
        Some(text) => script::parse_script(text).context("Invalid --script")?,
        None => demo_script(&config),
    };

    let clock = FrameClock::new();
    let driver = clock.spawn_driver(config.clock.frame_interval());
    let (services, ui) = UiServices::headless(clock);

    let registry = WindowRegistry::from_config(&config);
    let controller = WindowStackController::new(&config, registry, services);
    controller.add_listener(|event| info!("📣 {}", event));

    for command in &commands {
        script::execute(&controller, command).await;
    }

    info!(
        "🏁 Done: {} window(s) left, canvas alpha {:.2}, input blocked {} time(s)",
        controller.len(),
        ui.alpha(),
        ui.block_count()
    );
    driver.abort();
    Ok(())
}
