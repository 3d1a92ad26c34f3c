//! Scripted stack commands for the headless driver
//!
//! A script is a comma-separated list such as
//! `open:home,open:pause,wait:300,back,close-all`.

use anyhow::{bail, Context, Result};
use log::{info, warn};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::stack::WindowStackController;
use crate::window::WindowKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCommand {
    Open(WindowKind),
    Close(WindowKind),
    Back,
    CloseAll,
    HideCanvas,
    ShowCanvas,
    Wait(Duration),
}

impl FromStr for ScriptCommand {
    type Err = anyhow::Error;

    fn from_str(command: &str) -> Result<Self> {
        let command = command.trim();
        let (verb, argument) = match command.split_once(':') {
            Some((verb, argument)) => (verb, Some(argument.trim())),
            None => (command, None),
        };

        let parsed = match (verb, argument) {
            ("open", Some(kind)) if !kind.is_empty() => Self::Open(kind.into()),
            ("close", Some(kind)) if !kind.is_empty() => Self::Close(kind.into()),
            ("back", None) => Self::Back,
            ("close-all", None) => Self::CloseAll,
            ("hide-canvas", None) => Self::HideCanvas,
            ("show-canvas", None) => Self::ShowCanvas,
            ("wait", Some(ms)) => {
                let ms: u64 = ms
                    .parse()
                    .with_context(|| format!("Invalid wait duration '{}'", ms))?;
                Self::Wait(Duration::from_millis(ms))
            }
            _ => bail!("Unknown script command '{}'", command),
        };
        Ok(parsed)
    }
}

impl fmt::Display for ScriptCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(kind) => write!(f, "open:{}", kind),
            Self::Close(kind) => write!(f, "close:{}", kind),
            Self::Back => f.write_str("back"),
            Self::CloseAll => f.write_str("close-all"),
            Self::HideCanvas => f.write_str("hide-canvas"),
            Self::ShowCanvas => f.write_str("show-canvas"),
            Self::Wait(duration) => write!(f, "wait:{}", duration.as_millis()),
        }
    }
}

/// Parse a comma-separated script, skipping empty entries
pub fn parse_script(script: &str) -> Result<Vec<ScriptCommand>> {
    script
        .split(',')
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| entry.parse::<ScriptCommand>())
        .collect()
}

/// Run one command and wait for the work it started to finish.
///
/// Rejected stack operations are logged and skipped.
pub async fn execute(controller: &WindowStackController, command: &ScriptCommand) {
    info!("▶️ {}", command);
    let completion = match command {
        ScriptCommand::Open(kind) => controller.open_kind(kind),
        ScriptCommand::Close(kind) => controller.close_kind(kind),
        ScriptCommand::Back => Ok(controller.hardware_back()),
        ScriptCommand::CloseAll => controller.close_all(),
        ScriptCommand::HideCanvas => Ok(controller.hide_canvas()),
        ScriptCommand::ShowCanvas => Ok(controller.show_canvas()),
        ScriptCommand::Wait(duration) => {
            tokio::time::sleep(*duration).await;
            return;
        }
    };

    match completion {
        Ok(completion) => completion.await,
        Err(err) => warn!("'{}' rejected: {}", command, err),
    }
}
