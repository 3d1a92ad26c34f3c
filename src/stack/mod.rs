//! Window stack controller
//!
//! The [`WindowStackController`] owns the ordered collection of live windows
//! and the focus reference, and sequences every open and close:
//!
//! ```text
//! open:  unfocus → block input → cascade-hide → push/attach/raise
//!        → open() → showing → show → focus → unblock
//! close: block input → remove → cascade-show → hiding → hide
//!        → close() → focus new top → detach/destroy → unblock
//! ```
//!
//! At most one open/close sequence is in flight. Starting another one
//! force-completes the running sequence: every in-transition window is
//! skipped to its settled state and the sequence tail runs immediately, so
//! nothing is ever abandoned half-way. Canvas fades run independently.
//!
//! Animated work runs on spawned tokio tasks that suspend on the
//! [`FrameClock`](crate::clock::FrameClock); animated operations must
//! therefore be called from inside a tokio runtime. Transitions of windows
//! without an animator settle synchronously.

use log::{debug, info, warn};
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};

use crate::backend::UiServices;
use crate::config::PaneflowConfig;
use crate::effects::CanvasFade;
use crate::error::{StackError, StackResult};
use crate::window::{
    BackAction, TransitionTicket, Window, WindowEvent, WindowHandle, WindowKind, WindowRegistry,
};

pub mod window_stack;

pub use window_stack::WindowStack;

/// Listener for controller-level lifecycle events
pub type StackListener = Arc<dyn Fn(&StackEvent) + Send + Sync>;

#[derive(Debug, Clone)]
pub enum StackEvent {
    Created(WindowHandle),
    Opened(WindowHandle),
    Shown(WindowHandle),
    Hidden(WindowHandle),
    Closed(WindowHandle),
    Focused(WindowHandle),
    Backed(WindowHandle),
    ClosedAll,
}

impl StackEvent {
    fn from_window(event: &WindowEvent, window: WindowHandle) -> Option<Self> {
        match event {
            WindowEvent::Created => Some(Self::Created(window)),
            WindowEvent::Opened => Some(Self::Opened(window)),
            WindowEvent::Shown => Some(Self::Shown(window)),
            WindowEvent::Hidden => Some(Self::Hidden(window)),
            WindowEvent::Closed => Some(Self::Closed(window)),
            WindowEvent::FocusChanged(true) => Some(Self::Focused(window)),
            WindowEvent::Backed => Some(Self::Backed(window)),
            WindowEvent::FocusChanged(false) | WindowEvent::Destroyed => None,
        }
    }

    /// The affected window; `None` for [`StackEvent::ClosedAll`]
    pub fn window(&self) -> Option<&WindowHandle> {
        match self {
            Self::Created(window)
            | Self::Opened(window)
            | Self::Shown(window)
            | Self::Hidden(window)
            | Self::Closed(window)
            | Self::Focused(window)
            | Self::Backed(window) => Some(window),
            Self::ClosedAll => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Opened(_) => "opened",
            Self::Shown(_) => "shown",
            Self::Hidden(_) => "hidden",
            Self::Closed(_) => "closed",
            Self::Focused(_) => "focused",
            Self::Backed(_) => "backed",
            Self::ClosedAll => "closed-all",
        }
    }
}

impl fmt::Display for StackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.window() {
            Some(window) => write!(f, "{} {} ('{}')", self.name(), window.id(), window.kind()),
            None => f.write_str(self.name()),
        }
    }
}

/// Resolves once the operation that returned it has fully run, including
/// when it was force-completed by a later operation.
///
/// Dropping a `Completion` does not cancel anything.
#[derive(Debug)]
pub struct Completion {
    receiver: Option<oneshot::Receiver<()>>,
}

impl Completion {
    /// A completion that is already resolved
    pub fn ready() -> Self {
        Self { receiver: None }
    }

    fn pending() -> (oneshot::Sender<()>, Self) {
        let (sender, receiver) = oneshot::channel();
        (
            sender,
            Self {
                receiver: Some(receiver),
            },
        )
    }

    pub fn is_ready(&self) -> bool {
        self.receiver.is_none()
    }
}

impl Future for Completion {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let Some(receiver) = self.receiver.as_mut() else {
            return Poll::Ready(());
        };
        // A dropped sender means the work was torn down, which also ends it
        let _ = ready!(Pin::new(receiver).poll(cx));
        self.receiver = None;
        Poll::Ready(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SequenceKind {
    Open,
    Close,
}

/// The single open/close sequence allowed in flight
struct ActiveSequence {
    id: u64,
    kind: SequenceKind,
    window: WindowHandle,
    task: Option<JoinHandle<()>>,
    done: Option<oneshot::Sender<()>>,
}

struct StackState {
    stack: WindowStack,
    focused: Option<WindowHandle>,
    interaction_blocked: bool,
    sequence: Option<ActiveSequence>,
    next_sequence: u64,
    closing_all: bool,
}

struct CanvasState {
    alpha: f32,
    visible: bool,
    /// Bumped per fade; a fade task stops once it no longer matches
    generation: u64,
    task: Option<JoinHandle<()>>,
}

struct ControllerInner {
    registry: WindowRegistry,
    services: UiServices,
    animate_by_default: bool,
    fade_duration: Duration,
    state: Mutex<StackState>,
    canvas: Mutex<CanvasState>,
    listeners: Mutex<Vec<StackListener>>,
}

impl ControllerInner {
    fn emit(&self, event: &StackEvent) {
        debug!("Stack event: {}", event);
        let listeners = self.listeners.lock().clone();
        for listener in listeners {
            listener(event);
        }
    }
}

/// Shared handle to the window stack. Cloning is cheap.
#[derive(Clone)]
pub struct WindowStackController {
    inner: Arc<ControllerInner>,
}

impl WindowStackController {
    pub fn new(config: &PaneflowConfig, registry: WindowRegistry, services: UiServices) -> Self {
        info!(
            "🪟 Window stack ready ({} kinds registered, animations {})",
            registry.len(),
            if config.stack.animate_by_default { "on" } else { "off" }
        );

        Self {
            inner: Arc::new(ControllerInner {
                registry,
                services,
                animate_by_default: config.stack.animate_by_default,
                fade_duration: config.canvas.fade_duration(),
                state: Mutex::new(StackState {
                    stack: WindowStack::new(),
                    focused: None,
                    interaction_blocked: false,
                    sequence: None,
                    next_sequence: 0,
                    closing_all: false,
                }),
                canvas: Mutex::new(CanvasState {
                    alpha: 1.0,
                    visible: true,
                    generation: 0,
                    task: None,
                }),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn registry(&self) -> &WindowRegistry {
        &self.inner.registry
    }

    pub fn animate_by_default(&self) -> bool {
        self.inner.animate_by_default
    }

    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(&StackEvent) + Send + Sync + 'static,
    {
        self.inner.listeners.lock().push(Arc::new(listener));
    }

    /// The live window of `kind`
    pub fn get_window(&self, kind: &WindowKind) -> StackResult<WindowHandle> {
        self.inner
            .state
            .lock()
            .stack
            .get(kind)
            .cloned()
            .ok_or_else(|| StackError::NotFound(kind.clone()))
    }

    pub fn exists(&self, kind: &WindowKind) -> bool {
        self.inner.state.lock().stack.contains_kind(kind)
    }

    /// Whether this exact window instance is in the stack
    pub fn is_live(&self, window: &Window) -> bool {
        self.inner.state.lock().stack.contains(window)
    }

    /// Instantiate a new window of `kind`. It starts deactivated and outside
    /// the stack.
    pub fn create(&self, kind: &WindowKind) -> StackResult<WindowHandle> {
        let Some(blueprint) = self.inner.registry.build(kind, &self.inner.services.clock) else {
            warn!("No window factory registered for kind '{}'", kind);
            return Err(StackError::NotRegistered(kind.clone()));
        };
        if self.exists(kind) {
            warn!(
                "Creating another '{}' window while one is live; only one can be opened",
                kind
            );
        }

        let window = Window::new(kind.clone(), blueprint, self.inner.services.clone());
        self.inner.services.layers.set_surface_active(window.id(), false);
        self.forward_events(&window);
        window.create();
        Ok(window)
    }

    /// The live window of `kind`, or a freshly created one
    pub fn get_or_create(&self, kind: &WindowKind) -> StackResult<WindowHandle> {
        match self.get_window(kind) {
            Ok(window) => Ok(window),
            Err(_) => self.create(kind),
        }
    }

    /// Open `window` on top of the stack.
    ///
    /// Rejected when a window of the same kind is already live or the
    /// window is closed or still closing.
    pub fn open(&self, window: &WindowHandle, animate: bool) -> StackResult<Completion> {
        if window.is_closed() || self.is_closing(window) {
            warn!("Refusing to open closed window {} ('{}')", window.id(), window.kind());
            return Err(StackError::WindowClosed {
                id: window.id(),
                kind: window.kind().clone(),
            });
        }
        if self.exists(window.kind()) {
            warn!("A '{}' window is already open", window.kind());
            return Err(StackError::AlreadyOpen(window.kind().clone()));
        }

        self.preempt();
        let _ = self.set_focus_window(None);
        self.set_block_interaction(true);

        let mut transitions = if window.hide_other() {
            let covered = self.inner.state.lock().stack.hide_other_range().to_vec();
            self.cascade(&covered, false, animate)
        } else {
            Vec::new()
        };

        self.inner.state.lock().stack.push(window.clone());
        let layers = &self.inner.services.layers;
        layers.attach(window.id(), window.category());
        layers.raise_to_top(window.id(), window.category());

        info!("⬆️ Opening window {} ('{}')", window.id(), window.kind());
        window.open();

        match window.begin_showing() {
            Some(ticket) if animate && window.is_animated() => {
                transitions.push((window.clone(), ticket));
            }
            _ => window.skip_transition(),
        }

        if transitions.is_empty() {
            self.finish_open(window);
            return Ok(Completion::ready());
        }
        Ok(self.run_sequence(SequenceKind::Open, window, transitions))
    }

    /// Close a live window and release it.
    ///
    /// Rejected when `window` is not in the stack.
    pub fn close(&self, window: &WindowHandle, animate: bool) -> StackResult<Completion> {
        if !self.is_live(window) {
            warn!("Window {} ('{}') is not in the stack", window.id(), window.kind());
            return Err(StackError::NotLive {
                id: window.id(),
                kind: window.kind().clone(),
            });
        }

        self.preempt();
        self.set_block_interaction(true);

        let uncovered = {
            let mut state = self.inner.state.lock();
            state.stack.remove(window);
            if window.hide_other() {
                state.stack.hide_other_range().to_vec()
            } else {
                Vec::new()
            }
        };
        let mut transitions = self.cascade(&uncovered, true, animate);

        info!("⬇️ Closing window {} ('{}')", window.id(), window.kind());
        match window.begin_hiding() {
            Some(ticket) if animate && window.is_animated() => {
                transitions.push((window.clone(), ticket));
            }
            _ => window.skip_transition(),
        }

        if transitions.is_empty() {
            self.finish_close(window);
            return Ok(Completion::ready());
        }
        Ok(self.run_sequence(SequenceKind::Close, window, transitions))
    }

    /// Open the window of `kind`, creating it when needed
    pub fn open_kind(&self, kind: &WindowKind) -> StackResult<Completion> {
        let window = self.get_or_create(kind)?;
        self.open(&window, self.inner.animate_by_default)
    }

    pub fn close_kind(&self, kind: &WindowKind) -> StackResult<Completion> {
        let window = self.get_window(kind)?;
        self.close(&window, self.inner.animate_by_default)
    }

    /// Close every visible window from the top down without animation, one
    /// frame apart, then emit [`StackEvent::ClosedAll`].
    ///
    /// Windows that are hidden when their turn comes are skipped and stay in
    /// the stack.
    pub fn close_all(&self) -> StackResult<Completion> {
        {
            let mut state = self.inner.state.lock();
            if state.closing_all {
                warn!("Close-all is already running");
                return Err(StackError::AlreadyClosingAll);
            }
            state.closing_all = true;
        }

        let (done, completion) = Completion::pending();
        let controller = self.clone();
        tokio::spawn(async move {
            controller.run_close_all().await;
            let _ = done.send(());
        });
        Ok(completion)
    }

    async fn run_close_all(&self) {
        let windows: Vec<_> = self.inner.state.lock().stack.iter_top_down().cloned().collect();
        info!("🧹 Closing all windows ({} in stack)", windows.len());

        for (index, window) in windows.into_iter().enumerate() {
            if index > 0 {
                self.inner.services.clock.next_frame().await;
            }
            if !self.is_live(&window) {
                continue;
            }
            if window.is_hidden() {
                warn!(
                    "Close-all skips hidden window {} ('{}'); it stays in the stack",
                    window.id(),
                    window.kind()
                );
                continue;
            }
            if let Err(err) = self.close(&window, false) {
                warn!("Close-all could not close {}: {}", window.id(), err);
            }
        }

        self.inner.state.lock().closing_all = false;
        self.inner.emit(&StackEvent::ClosedAll);
    }

    /// Deliver "back" to the focused window, closing it when it asks to
    pub fn hardware_back(&self) -> Completion {
        let Some(window) = self.focused_window() else {
            debug!("Back pressed with no focused window");
            return Completion::ready();
        };
        if !self.is_live(&window) {
            debug!("Back ignored: window {} ('{}') is closing", window.id(), window.kind());
            return Completion::ready();
        }

        match window.back() {
            BackAction::Close => self
                .close(&window, self.inner.animate_by_default)
                .unwrap_or_else(|err| {
                    warn!("Back could not close {}: {}", window.id(), err);
                    Completion::ready()
                }),
            BackAction::Ignore => Completion::ready(),
        }
    }

    /// Move focus to `target`, or clear it with `None`.
    ///
    /// A target that is not live or is hidden is rejected and focus is left
    /// as it was.
    pub fn set_focus_window(&self, target: Option<&WindowHandle>) -> StackResult<()> {
        let previous = {
            let mut state = self.inner.state.lock();
            if let Some(target) = target {
                if !state.stack.contains(target) {
                    warn!("Cannot focus window {} ('{}'): not in the stack", target.id(), target.kind());
                    return Err(StackError::NotLive {
                        id: target.id(),
                        kind: target.kind().clone(),
                    });
                }
                if target.is_hidden() {
                    warn!("Cannot focus hidden window {} ('{}')", target.id(), target.kind());
                    return Err(StackError::WindowHidden {
                        id: target.id(),
                        kind: target.kind().clone(),
                    });
                }
                if state
                    .focused
                    .as_ref()
                    .is_some_and(|focused| focused.id() == target.id())
                {
                    return Ok(());
                }
            }
            std::mem::replace(&mut state.focused, target.cloned())
        };

        if let Some(previous) = previous {
            if !previous.is_focused() {
                warn!(
                    "Focus holder {} ('{}') did not believe it was focused",
                    previous.id(),
                    previous.kind()
                );
            }
            previous.set_focus(false);
        }
        if let Some(target) = target {
            target.set_focus(true);
        }
        Ok(())
    }

    /// Engage or release the input-blocking overlay
    pub fn set_block_interaction(&self, blocked: bool) {
        {
            let mut state = self.inner.state.lock();
            if state.interaction_blocked == blocked {
                return;
            }
            state.interaction_blocked = blocked;
        }
        self.inner.services.canvas.set_interaction_blocked(blocked);
        debug!("Interaction blocker {}", if blocked { "engaged" } else { "released" });
    }

    /// Fade the whole UI layer out
    pub fn hide_canvas(&self) -> Completion {
        self.fade_canvas(false)
    }

    /// Fade the whole UI layer back in
    pub fn show_canvas(&self) -> Completion {
        self.fade_canvas(true)
    }

    fn fade_canvas(&self, visible: bool) -> Completion {
        let target = if visible { 1.0 } else { 0.0 };
        let duration = self.inner.fade_duration;

        let (generation, from) = {
            let mut canvas = self.inner.canvas.lock();
            if canvas.visible == visible {
                return Completion::ready();
            }
            if let Some(task) = canvas.task.take() {
                task.abort();
            }
            canvas.visible = visible;
            canvas.generation += 1;
            if duration.is_zero() {
                canvas.alpha = target;
                self.inner.services.canvas.set_alpha(target);
                return Completion::ready();
            }
            (canvas.generation, canvas.alpha)
        };
        debug!("Canvas fade {:.2} → {:.2} over {:?}", from, target, duration);

        let (done, completion) = Completion::pending();
        let controller = self.clone();
        let task = tokio::spawn(async move {
            let mut fade = CanvasFade::new(from, target, duration);
            while !fade.is_finished() {
                let tick = controller.inner.services.clock.next_frame().await;
                let alpha = fade.advance(tick.unscaled_delta);
                if !controller.apply_canvas_alpha(generation, alpha) {
                    return;
                }
            }
            let _ = done.send(());
        });

        let mut canvas = self.inner.canvas.lock();
        if canvas.generation == generation {
            canvas.task = Some(task);
        }
        completion
    }

    fn apply_canvas_alpha(&self, generation: u64, alpha: f32) -> bool {
        let mut canvas = self.inner.canvas.lock();
        if canvas.generation != generation {
            return false;
        }
        canvas.alpha = alpha;
        self.inner.services.canvas.set_alpha(alpha);
        true
    }

    /// Topmost window that is not hidden
    pub fn get_top_window(&self) -> Option<WindowHandle> {
        self.inner.state.lock().stack.top_visible().cloned()
    }

    /// Snapshot of the live windows, bottom to top
    pub fn windows(&self) -> Vec<WindowHandle> {
        self.inner.state.lock().stack.render_order().to_vec()
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().stack.is_empty()
    }

    pub fn focused_window(&self) -> Option<WindowHandle> {
        self.inner.state.lock().focused.clone()
    }

    pub fn is_interaction_blocked(&self) -> bool {
        self.inner.state.lock().interaction_blocked
    }

    pub fn canvas_alpha(&self) -> f32 {
        self.inner.canvas.lock().alpha
    }

    pub fn is_canvas_visible(&self) -> bool {
        self.inner.canvas.lock().visible
    }

    /// Whether an open/close sequence or a close-all pass is running
    pub fn is_busy(&self) -> bool {
        let state = self.inner.state.lock();
        state.sequence.is_some() || state.closing_all
    }

    /// Whether `window` is the target of the running close sequence
    fn is_closing(&self, window: &Window) -> bool {
        self.inner.state.lock().sequence.as_ref().is_some_and(|sequence| {
            sequence.kind == SequenceKind::Close && sequence.window.id() == window.id()
        })
    }

    /// Start the hide (or show) transition of every window in `windows`
    /// that is not already in that state, top-most first.
    ///
    /// Non-animated transitions settle at once; the animated ones are
    /// returned for the sequence to play.
    fn cascade(
        &self,
        windows: &[WindowHandle],
        show: bool,
        animate: bool,
    ) -> Vec<(WindowHandle, TransitionTicket)> {
        let mut animated = Vec::new();
        for window in windows.iter().rev() {
            if window.is_hidden() != show {
                continue;
            }
            let ticket = if show {
                window.begin_showing()
            } else {
                window.begin_hiding()
            };
            let Some(ticket) = ticket else {
                continue;
            };

            if animate && window.is_animated() {
                animated.push((window.clone(), ticket));
            } else {
                window.skip_transition();
            }
        }
        animated
    }

    /// Register the running sequence and play `transitions` on a task. The
    /// sequence tail runs once every transition has settled.
    fn run_sequence(
        &self,
        kind: SequenceKind,
        window: &WindowHandle,
        transitions: Vec<(WindowHandle, TransitionTicket)>,
    ) -> Completion {
        let (done, completion) = Completion::pending();
        let id = {
            let mut state = self.inner.state.lock();
            state.next_sequence += 1;
            let id = state.next_sequence;
            state.sequence = Some(ActiveSequence {
                id,
                kind,
                window: window.clone(),
                task: None,
                done: Some(done),
            });
            id
        };

        let controller = self.clone();
        let task = tokio::spawn(async move {
            // Dropping the set on abort cancels every transition in it
            let mut playing = JoinSet::new();
            for (window, ticket) in transitions {
                playing.spawn(async move {
                    window.finish_transition(ticket, true).await;
                });
            }
            while playing.join_next().await.is_some() {}
            controller.complete_sequence(id);
        });

        let mut state = self.inner.state.lock();
        match state.sequence.as_mut() {
            Some(sequence) if sequence.id == id => sequence.task = Some(task),
            _ => {}
        }
        completion
    }

    fn complete_sequence(&self, id: u64) {
        let sequence = {
            let mut state = self.inner.state.lock();
            match &state.sequence {
                Some(sequence) if sequence.id == id => state.sequence.take(),
                _ => None,
            }
        };
        if let Some(sequence) = sequence {
            self.finish_sequence(sequence);
        }
    }

    /// Force the running sequence, and every transition in flight, to its
    /// settled state
    fn preempt(&self) {
        let (sequence, in_transition) = {
            let mut state = self.inner.state.lock();
            let in_transition: Vec<_> = state
                .stack
                .iter()
                .filter(|window| window.is_in_transition())
                .cloned()
                .collect();
            (state.sequence.take(), in_transition)
        };

        for window in &in_transition {
            window.skip_transition();
        }

        if let Some(mut sequence) = sequence {
            debug!(
                "Preempting {:?} sequence of window {} ('{}')",
                sequence.kind,
                sequence.window.id(),
                sequence.window.kind()
            );
            if let Some(task) = sequence.task.take() {
                task.abort();
            }
            // A closing window has already left the stack
            sequence.window.skip_transition();
            self.finish_sequence(sequence);
        }
    }

    fn finish_sequence(&self, mut sequence: ActiveSequence) {
        match sequence.kind {
            SequenceKind::Open => self.finish_open(&sequence.window),
            SequenceKind::Close => self.finish_close(&sequence.window),
        }
        if let Some(done) = sequence.done.take() {
            let _ = done.send(());
        }
    }

    fn finish_open(&self, window: &WindowHandle) {
        if let Err(err) = self.set_focus_window(Some(window)) {
            debug!("Opened window {} did not take focus: {}", window.id(), err);
        }
        self.set_block_interaction(false);
    }

    fn finish_close(&self, window: &WindowHandle) {
        window.close();

        let top = self.get_top_window();
        if let Err(err) = self.set_focus_window(top.as_ref()) {
            debug!("New top window did not take focus: {}", err);
        }

        self.inner
            .services
            .layers
            .detach(window.id(), window.category());
        window.destroy();
        self.set_block_interaction(false);
    }

    /// Re-publish the window's lifecycle events as stack events
    fn forward_events(&self, window: &WindowHandle) {
        let inner = Arc::downgrade(&self.inner);
        let handle = Arc::downgrade(window);
        window.add_listener(move |event| {
            let (Some(inner), Some(window)) = (inner.upgrade(), handle.upgrade()) else {
                return;
            };
            if let Some(event) = StackEvent::from_window(event, window) {
                inner.emit(&event);
            }
        });
    }
}

impl fmt::Debug for WindowStackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("WindowStackController")
            .field("windows", &state.stack.len())
            .field(
                "focused",
                &state.focused.as_ref().map(|window| window.id()),
            )
            .field("busy", &(state.sequence.is_some() || state.closing_all))
            .field("interaction_blocked", &state.interaction_blocked)
            .finish_non_exhaustive()
    }
}
