//! Headless UI backend
//!
//! Keeps an in-memory picture of what a real renderer would show: which
//! surfaces are attached under which root and in what order, which are
//! active, the canvas opacity, the blocker overlay and the current selection.

use log::debug;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

use super::{CanvasHost, LayerHost, SelectionTarget};
use crate::window::{ControlId, WindowCategory, WindowId};

#[derive(Debug)]
struct HeadlessState {
    /// Per-root children, bottom to top
    roots: HashMap<WindowCategory, Vec<WindowId>>,
    active: HashSet<WindowId>,
    alpha: f32,
    interaction_blocked: bool,
    /// Number of times the blocker was engaged
    block_count: usize,
    selected: Option<ControlId>,
}

#[derive(Debug)]
pub struct HeadlessUi {
    state: Mutex<HeadlessState>,
}

impl HeadlessUi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HeadlessState {
                roots: HashMap::new(),
                active: HashSet::new(),
                alpha: 1.0,
                interaction_blocked: false,
                block_count: 0,
                selected: None,
            }),
        }
    }

    pub fn is_attached(&self, window: WindowId) -> bool {
        self.state
            .lock()
            .roots
            .values()
            .any(|children| children.contains(&window))
    }

    /// Children of a root in bottom-to-top order
    pub fn root_order(&self, category: WindowCategory) -> Vec<WindowId> {
        self.state
            .lock()
            .roots
            .get(&category)
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_surface_active(&self, window: WindowId) -> bool {
        self.state.lock().active.contains(&window)
    }

    pub fn alpha(&self) -> f32 {
        self.state.lock().alpha
    }

    pub fn is_interaction_blocked(&self) -> bool {
        self.state.lock().interaction_blocked
    }

    pub fn block_count(&self) -> usize {
        self.state.lock().block_count
    }
}

impl Default for HeadlessUi {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerHost for HeadlessUi {
    fn attach(&self, window: WindowId, category: WindowCategory) {
        let mut state = self.state.lock();
        let children = state.roots.entry(category).or_default();
        if !children.contains(&window) {
            children.push(window);
        }
        debug!("Attached window {} under {:?} root", window, category);
    }

    fn detach(&self, window: WindowId, category: WindowCategory) {
        let mut state = self.state.lock();
        if let Some(children) = state.roots.get_mut(&category) {
            children.retain(|&id| id != window);
        }
        state.active.remove(&window);
        debug!("Detached window {} from {:?} root", window, category);
    }

    fn raise_to_top(&self, window: WindowId, category: WindowCategory) {
        let mut state = self.state.lock();
        if let Some(children) = state.roots.get_mut(&category) {
            if let Some(pos) = children.iter().position(|&id| id == window) {
                children.remove(pos);
                children.push(window);
            }
        }
    }

    fn set_surface_active(&self, window: WindowId, active: bool) {
        let mut state = self.state.lock();
        if active {
            state.active.insert(window);
        } else {
            state.active.remove(&window);
        }
    }
}

impl CanvasHost for HeadlessUi {
    fn set_alpha(&self, alpha: f32) {
        self.state.lock().alpha = alpha.clamp(0.0, 1.0);
    }

    fn set_interaction_blocked(&self, blocked: bool) {
        let mut state = self.state.lock();
        if blocked && !state.interaction_blocked {
            state.block_count += 1;
        }
        state.interaction_blocked = blocked;
    }
}

impl SelectionTarget for HeadlessUi {
    fn set_selected(&self, control: Option<ControlId>) {
        self.state.lock().selected = control;
    }

    fn selected(&self) -> Option<ControlId> {
        self.state.lock().selected
    }
}
