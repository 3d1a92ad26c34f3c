//! Window lifecycle state machine
//!
//! A [`Window`] is one entry of the window stack. It owns its visual
//! sub-lifecycle and the bookkeeping for the transition currently in flight:
//!
//! ```text
//! Created → Showing → Shown ⇄ Hiding → Hidden ⇄ Showing → Shown → Hiding → Closed
//! ```
//!
//! The first `Showing` is the window opening; the last `Hiding` is the window
//! closing. Windows never know their position in the stack; ordering, focus
//! arbitration and hide cascades belong to the [`crate::stack`] controller.
//!
//! Content-specific behaviour plugs in through [`WindowContent`] hooks. Hooks
//! run while the window holds its content lock, so they must not call back
//! into the stack synchronously; [`WindowContent::on_back`] returns a
//! [`BackAction`] instead of closing the window itself.

use log::{debug, warn};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::UiServices;
use crate::effects::{AnimationPlayer, AnimationWaiter};

pub mod registry;

pub use registry::{WindowBlueprint, WindowFactory, WindowRegistry};

/// Shared handle to a window
pub type WindowHandle = Arc<Window>;

/// Listener for per-window lifecycle events
pub type WindowListener = Arc<dyn Fn(&WindowEvent) + Send + Sync>;

static NEXT_WINDOW_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a window instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

impl WindowId {
    fn next() -> Self {
        Self(NEXT_WINDOW_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which concrete window type an instance is; unique within the stack
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowKind(Arc<str>);

impl WindowKind {
    pub fn new(kind: &str) -> Self {
        Self(Arc::from(kind))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WindowKind {
    fn from(kind: &str) -> Self {
        Self::new(kind)
    }
}

impl From<String> for WindowKind {
    fn from(kind: String) -> Self {
        Self(Arc::from(kind))
    }
}

/// Visual layer a window attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowCategory {
    #[default]
    Normal,
    Modal,
}

/// Identifier of an interactive control inside a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlId(pub u32);

/// Kind of animated transition in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionState {
    #[default]
    None,
    Opening,
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPhase {
    Created,
    Showing,
    Shown,
    Hiding,
    Hidden,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    Created,
    Opened,
    Shown,
    Hidden,
    Closed,
    FocusChanged(bool),
    Backed,
    Destroyed,
}

/// What the stack should do after a window handled "back"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackAction {
    /// Close the window with animation
    Close,
    /// Keep the window open
    Ignore,
}

/// Extension hooks for concrete window content.
///
/// Every hook has a no-op default. A panic inside a hook is not caught.
pub trait WindowContent: Send {
    fn on_create(&mut self) {}

    fn on_open(&mut self) {}

    fn on_close(&mut self) {}

    fn on_back(&mut self) -> BackAction {
        BackAction::Close
    }

    /// Teardown, runs once after the window closed
    fn on_destroy(&mut self) {}
}

/// Content with no behaviour of its own
#[derive(Debug, Default)]
pub struct EmptyContent;

impl WindowContent for EmptyContent {}

#[derive(Debug)]
struct WindowState {
    phase: WindowPhase,
    hidden: bool,
    focused: bool,
    in_transition: bool,
    transition: TransitionState,
    last_selected: Option<ControlId>,
    /// Bumped whenever a transition starts or settles; stale animation
    /// futures compare against it before settling.
    generation: u64,
    destroyed: bool,
}

/// Ticket for a transition that was started, used to settle it later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionTicket(u64);

pub struct Window {
    id: WindowId,
    kind: WindowKind,
    category: WindowCategory,
    hide_other: bool,
    default_control: Option<ControlId>,
    animation_layer: usize,
    animator: Option<Arc<dyn AnimationPlayer>>,
    services: UiServices,
    state: Mutex<WindowState>,
    content: Mutex<Option<Box<dyn WindowContent>>>,
    listeners: Mutex<Vec<WindowListener>>,
}

impl Window {
    /// Build a window from a blueprint. The window starts hidden with its
    /// surface inactive and is not part of any stack.
    pub fn new(kind: WindowKind, blueprint: WindowBlueprint, services: UiServices) -> WindowHandle {
        let WindowBlueprint {
            category,
            hide_other,
            default_control,
            animation_layer,
            animator,
            content,
        } = blueprint;

        Arc::new(Self {
            id: WindowId::next(),
            kind,
            category,
            hide_other,
            default_control,
            animation_layer,
            animator,
            services,
            state: Mutex::new(WindowState {
                phase: WindowPhase::Created,
                hidden: true,
                focused: false,
                in_transition: false,
                transition: TransitionState::None,
                last_selected: None,
                generation: 0,
                destroyed: false,
            }),
            content: Mutex::new(Some(content)),
            listeners: Mutex::new(Vec::new()),
        })
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn kind(&self) -> &WindowKind {
        &self.kind
    }

    pub fn category(&self) -> WindowCategory {
        self.category
    }

    pub fn hide_other(&self) -> bool {
        self.hide_other
    }

    pub fn default_control(&self) -> Option<ControlId> {
        self.default_control
    }

    /// Whether transitions of this window play an animation at all
    pub fn is_animated(&self) -> bool {
        self.animator.is_some()
    }

    pub fn phase(&self) -> WindowPhase {
        self.state.lock().phase
    }

    pub fn is_hidden(&self) -> bool {
        self.state.lock().hidden
    }

    pub fn is_focused(&self) -> bool {
        self.state.lock().focused
    }

    pub fn is_in_transition(&self) -> bool {
        self.state.lock().in_transition
    }

    pub fn transition_state(&self) -> TransitionState {
        self.state.lock().transition
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().phase == WindowPhase::Closed
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.lock().destroyed
    }

    pub fn last_selected_control(&self) -> Option<ControlId> {
        self.state.lock().last_selected
    }

    /// Record the control the user last selected inside this window
    pub fn remember_selection(&self, control: ControlId) {
        self.state.lock().last_selected = Some(control);
    }

    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(&WindowEvent) + Send + Sync + 'static,
    {
        self.listeners.lock().push(Arc::new(listener));
    }

    /// One-time setup
    pub fn create(&self) {
        self.with_content(|content| content.on_create());
        debug!("Window {} ('{}') created", self.id, self.kind);
        self.emit(WindowEvent::Created);
    }

    /// Logical open marker, brackets the animated show
    pub fn open(&self) {
        self.with_content(|content| content.on_open());
        debug!("Window {} ('{}') opened", self.id, self.kind);
        self.emit(WindowEvent::Opened);
    }

    /// Logical close marker. The window is terminal afterwards.
    pub fn close(&self) {
        self.with_content(|content| content.on_close());
        {
            let mut state = self.state.lock();
            state.phase = WindowPhase::Closed;
            state.in_transition = false;
            state.transition = TransitionState::None;
            state.generation += 1;
        }
        debug!("Window {} ('{}') closed", self.id, self.kind);
        self.emit(WindowEvent::Closed);
    }

    /// Run the teardown hook and release the content. Idempotent.
    pub fn destroy(&self) {
        {
            let mut state = self.state.lock();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
        }
        let content = self.content.lock().take();
        if let Some(mut content) = content {
            content.on_destroy();
        }
        debug!("Window {} ('{}') destroyed", self.id, self.kind);
        self.emit(WindowEvent::Destroyed);
        self.listeners.lock().clear();
    }

    /// Show with an optional animation
    pub async fn showing(&self, animate: bool) {
        if let Some(ticket) = self.begin_showing() {
            self.finish_transition(ticket, animate).await;
        }
    }

    /// Hide with an optional animation
    pub async fn hiding(&self, animate: bool) {
        if let Some(ticket) = self.begin_hiding() {
            self.finish_transition(ticket, animate).await;
        }
    }

    /// Synchronous half of [`Window::showing`]: un-hide, activate the
    /// surface and mark the opening transition.
    pub fn begin_showing(&self) -> Option<TransitionTicket> {
        let ticket = {
            let mut state = self.state.lock();
            if state.phase == WindowPhase::Closed {
                warn!("Cannot show closed window {} ('{}')", self.id, self.kind);
                return None;
            }
            state.hidden = false;
            state.in_transition = true;
            state.transition = TransitionState::Opening;
            state.phase = WindowPhase::Showing;
            state.generation += 1;
            TransitionTicket(state.generation)
        };
        self.services.layers.set_surface_active(self.id, true);
        Some(ticket)
    }

    /// Synchronous half of [`Window::hiding`]: mark the closing transition
    pub fn begin_hiding(&self) -> Option<TransitionTicket> {
        let mut state = self.state.lock();
        if state.phase == WindowPhase::Closed {
            warn!("Cannot hide closed window {} ('{}')", self.id, self.kind);
            return None;
        }
        state.in_transition = true;
        state.transition = TransitionState::Closing;
        state.phase = WindowPhase::Hiding;
        state.generation += 1;
        Some(TransitionTicket(state.generation))
    }

    /// Play the animation of the transition behind `ticket` and settle it,
    /// unless it was skipped or superseded in the meantime
    pub async fn finish_transition(&self, ticket: TransitionTicket, animate: bool) {
        if animate {
            let transition = {
                let state = self.state.lock();
                if state.generation != ticket.0 {
                    return;
                }
                state.transition
            };
            match transition {
                TransitionState::Opening => self.play_show_animation().await,
                TransitionState::Closing => self.play_hide_animation().await,
                TransitionState::None => {}
            }
        }
        if self.state.lock().generation == ticket.0 {
            self.skip_transition();
        }
    }

    pub async fn play_show_animation(&self) {
        if let Some(animator) = &self.animator {
            animator.play_open();
        }
        self.wait_for_animation().await;
    }

    pub async fn play_hide_animation(&self) {
        if let Some(animator) = &self.animator {
            animator.play_close();
        }
        self.wait_for_animation().await;
    }

    async fn wait_for_animation(&self) {
        let waited = AnimationWaiter::new(
            self.animator.as_deref(),
            self.animation_layer,
            &self.services.clock,
        )
        .wait()
        .await;
        debug!("Window {} animation finished after {:?}", self.id, waited);
    }

    /// Settle in the shown state
    pub fn show(&self) {
        let restore = {
            let mut state = self.state.lock();
            state.hidden = false;
            state.in_transition = false;
            state.transition = TransitionState::None;
            state.phase = WindowPhase::Shown;
            state.generation += 1;
            state.focused.then(|| state.last_selected.or(self.default_control))
        };
        if let Some(target) = restore {
            self.services.selection.set_selected(target);
        }
        debug!("Window {} ('{}') shown", self.id, self.kind);
        self.emit(WindowEvent::Shown);
    }

    /// Settle in the hidden state
    pub fn hide(&self) {
        let focused = {
            let mut state = self.state.lock();
            state.hidden = true;
            state.in_transition = false;
            state.transition = TransitionState::None;
            state.phase = WindowPhase::Hidden;
            state.generation += 1;
            state.focused
        };
        self.services.layers.set_surface_active(self.id, false);
        if focused {
            self.services.selection.set_selected(None);
        }
        debug!("Window {} ('{}') hidden", self.id, self.kind);
        self.emit(WindowEvent::Hidden);
    }

    /// Jump to the state the current transition would end in. No-op when
    /// nothing is in flight.
    pub fn skip_transition(&self) {
        let transition = {
            let state = self.state.lock();
            if !state.in_transition {
                return;
            }
            state.transition
        };
        match transition {
            TransitionState::Opening => self.show(),
            TransitionState::Closing => self.hide(),
            TransitionState::None => {
                self.state.lock().in_transition = false;
            }
        }
    }

    /// Toggle focus, handing the input selection to or away from this window
    pub fn set_focus(&self, focused: bool) {
        let selection = &self.services.selection;
        let target = {
            let mut state = self.state.lock();
            if state.focused == focused {
                return;
            }
            state.focused = focused;
            if focused {
                state.last_selected.or(self.default_control)
            } else {
                if let Some(current) = selection.selected() {
                    state.last_selected = Some(current);
                }
                None
            }
        };
        selection.set_selected(target);
        debug!("Window {} ('{}') focus -> {}", self.id, self.kind, focused);
        self.emit(WindowEvent::FocusChanged(focused));
    }

    /// Run the back hook. The caller acts on the returned action.
    pub fn back(&self) -> BackAction {
        let action = self
            .with_content(|content| content.on_back())
            .unwrap_or(BackAction::Ignore);
        self.emit(WindowEvent::Backed);
        action
    }

    fn with_content<R>(&self, hook: impl FnOnce(&mut dyn WindowContent) -> R) -> Option<R> {
        let mut content = self.content.lock();
        content.as_mut().map(|content| hook(content.as_mut()))
    }

    fn emit(&self, event: WindowEvent) {
        let listeners = self.listeners.lock().clone();
        for listener in listeners {
            listener(&event);
        }
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("category", &self.category)
            .field("hide_other", &self.hide_other)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
