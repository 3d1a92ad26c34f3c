//! # Paneflow
//!
//! An interruption-safe window stack for interactive applications: windows
//! are created from registered factories, opened and closed with optional
//! animations, focused, and hidden in cascades beneath modal windows.
//!
//! ## Architecture
//!
//! - `stack`: The controller owning the ordered window stack, focus and
//!   sequencing of open/close transitions
//! - `window`: Per-window lifecycle state machine and the factory registry
//! - `effects`: Animation playback, the animation waiter and canvas fades
//! - `clock`: Frame tick source every suspension point waits on
//! - `backend`: Interfaces to the host UI, plus a headless implementation
//! - `config`: Configuration parsing and management
//! - `script`: Scripted commands for the headless driver
//!
//! ## Usage
//!
//! ```rust,no_run
//! use paneflow::{PaneflowConfig, UiServices, WindowRegistry, WindowStackController};
//! use paneflow::clock::FrameClock;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PaneflowConfig::default();
//!     let clock = FrameClock::new();
//!     let _driver = clock.spawn_driver(config.clock.frame_interval());
//!     let (services, _ui) = UiServices::headless(clock);
//!
//!     let mut registry = WindowRegistry::new();
//!     registry.register("home", |_| paneflow::WindowBlueprint::empty());
//!
//!     let stack = WindowStackController::new(&config, registry, services);
//!     stack.open_kind(&"home".into())?.await;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod clock;
pub mod config;
pub mod effects;
pub mod error;
pub mod script;
pub mod stack;
pub mod window;

// Re-export main types for easy access
pub use backend::{HeadlessUi, UiServices};
pub use config::PaneflowConfig;
pub use error::{StackError, StackResult};
pub use stack::{Completion, StackEvent, WindowStackController};
pub use window::{Window, WindowBlueprint, WindowHandle, WindowKind, WindowRegistry};

/// Version information for Paneflow
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
