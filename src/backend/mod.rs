//! Collaborator interfaces
//!
//! The stack core never talks to a renderer directly. Everything visual goes
//! through the narrow traits below, which a host implements on top of its UI
//! toolkit. [`HeadlessUi`] is a recording implementation used by the
//! headless binary and by tests.

use std::sync::Arc;

use crate::clock::FrameClock;
use crate::window::{ControlId, WindowCategory, WindowId};

pub mod headless;

pub use headless::HeadlessUi;

/// Resolves a window category to its visual root and manages membership
pub trait LayerHost: Send + Sync {
    /// Attach the window's surface under the root for `category`
    fn attach(&self, window: WindowId, category: WindowCategory);

    /// Remove the window's surface from the root for `category`
    fn detach(&self, window: WindowId, category: WindowCategory);

    /// Move the window above all siblings in its root
    fn raise_to_top(&self, window: WindowId, category: WindowCategory);

    /// Activate or deactivate the window's surface
    fn set_surface_active(&self, window: WindowId, active: bool);
}

/// Whole-layer controls: opacity and the input-blocking overlay
pub trait CanvasHost: Send + Sync {
    fn set_alpha(&self, alpha: f32);
    fn set_interaction_blocked(&self, blocked: bool);
}

/// The globally selected interactive control
#[cfg_attr(test, mockall::automock)]
pub trait SelectionTarget: Send + Sync {
    /// Select a control, or clear the selection with `None`
    fn set_selected(&self, control: Option<ControlId>);

    /// Currently selected control, if any
    fn selected(&self) -> Option<ControlId>;
}

/// Everything the controller and its windows need from the host
#[derive(Clone)]
pub struct UiServices {
    pub layers: Arc<dyn LayerHost>,
    pub canvas: Arc<dyn CanvasHost>,
    pub selection: Arc<dyn SelectionTarget>,
    pub clock: FrameClock,
}

impl UiServices {
    pub fn new(
        layers: Arc<dyn LayerHost>,
        canvas: Arc<dyn CanvasHost>,
        selection: Arc<dyn SelectionTarget>,
        clock: FrameClock,
    ) -> Self {
        Self {
            layers,
            canvas,
            selection,
            clock,
        }
    }

    /// Services backed by a single [`HeadlessUi`], which is returned so the
    /// caller can inspect what was rendered
    pub fn headless(clock: FrameClock) -> (Self, Arc<HeadlessUi>) {
        let ui = Arc::new(HeadlessUi::new());
        let services = Self::new(ui.clone(), ui.clone(), ui.clone(), clock);
        (services, ui)
    }
}

impl std::fmt::Debug for UiServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiServices")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
