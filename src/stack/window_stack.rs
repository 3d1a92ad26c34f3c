//! Ordered collection of live windows
//!
//! Windows are ordered from bottom to top, with the last entry being the
//! top-most one. Kinds are unique: a second window of a kind that is already
//! present is refused.

use std::collections::HashMap;

use crate::window::{Window, WindowHandle, WindowKind};

/// Visual depth ordering of the live windows.
///
/// Index 0 is the bottom-most window and the last index the top-most.
#[derive(Debug, Clone, Default)]
pub struct WindowStack {
    /// Windows ordered from bottom to top
    windows: Vec<WindowHandle>,

    /// Fast lookup: kind → position in stack
    positions: HashMap<WindowKind, usize>,
}

impl WindowStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a window to the top of the stack.
    ///
    /// Returns `false` without touching the stack if a window of the same
    /// kind is already present.
    pub fn push(&mut self, window: WindowHandle) -> bool {
        if self.positions.contains_key(window.kind()) {
            return false;
        }

        let position = self.windows.len();
        self.positions.insert(window.kind().clone(), position);
        self.windows.push(window);
        true
    }

    /// Removes this exact window instance.
    ///
    /// Returns its previous position, or `None` if the instance is not in
    /// the stack (even when another window of its kind is).
    pub fn remove(&mut self, window: &Window) -> Option<usize> {
        let pos = *self.positions.get(window.kind())?;
        if self.windows[pos].id() != window.id() {
            return None;
        }
        self.positions.remove(window.kind());
        self.windows.remove(pos);
        self.rebuild_positions();
        Some(pos)
    }

    pub fn get(&self, kind: &WindowKind) -> Option<&WindowHandle> {
        self.positions.get(kind).map(|&pos| &self.windows[pos])
    }

    /// Whether this exact window instance is live
    pub fn contains(&self, window: &Window) -> bool {
        self.get(window.kind())
            .is_some_and(|live| live.id() == window.id())
    }

    pub fn contains_kind(&self, kind: &WindowKind) -> bool {
        self.positions.contains_key(kind)
    }

    /// Windows in bottom-to-top order
    pub fn render_order(&self) -> &[WindowHandle] {
        &self.windows
    }

    pub fn iter(&self) -> impl Iterator<Item = &WindowHandle> {
        self.windows.iter()
    }

    /// Windows from the top-most down
    pub fn iter_top_down(&self) -> impl Iterator<Item = &WindowHandle> {
        self.windows.iter().rev()
    }

    /// The highest window that is not hidden.
    ///
    /// This is the focus candidate and the receiver of "back".
    pub fn top_visible(&self) -> Option<&WindowHandle> {
        self.iter_top_down().find(|window| !window.is_hidden())
    }

    /// The windows a `hide_other` window placed on top would cover: every
    /// entry from the top down to and including the first `hide_other`
    /// boundary, or the whole stack when there is none. Bottom-to-top order.
    pub fn hide_other_range(&self) -> &[WindowHandle] {
        let start = self
            .windows
            .iter()
            .rposition(|window| window.hide_other())
            .unwrap_or(0);
        &self.windows[start..]
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Rebuilds the position lookup map after positions shifted
    fn rebuild_positions(&mut self) {
        self.positions.clear();
        for (i, window) in self.windows.iter().enumerate() {
            self.positions.insert(window.kind().clone(), i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::UiServices;
    use crate::clock::FrameClock;
    use crate::window::WindowBlueprint;

    fn window(kind: &str, hide_other: bool) -> WindowHandle {
        let (services, _ui) = UiServices::headless(FrameClock::new());
        Window::new(
            kind.into(),
            WindowBlueprint::empty().hide_other(hide_other),
            services,
        )
    }

    fn kinds(windows: &[WindowHandle]) -> Vec<&str> {
        windows.iter().map(|window| window.kind().as_str()).collect()
    }

    fn stack_of(entries: &[(&str, bool)]) -> WindowStack {
        let mut stack = WindowStack::new();
        for &(kind, hide_other) in entries {
            assert!(stack.push(window(kind, hide_other)));
        }
        stack
    }

    #[test]
    fn test_new_stack_is_empty() {
        let stack = WindowStack::new();
        assert!(stack.is_empty());
        assert_eq!(stack.len(), 0);
        assert!(stack.top_visible().is_none());
    }

    #[test]
    fn test_push_adds_to_top() {
        let stack = stack_of(&[("a", false), ("b", false), ("c", false)]);

        assert_eq!(stack.len(), 3);
        assert_eq!(stack.iter_top_down().next().unwrap().kind().as_str(), "c");
        assert_eq!(kinds(stack.render_order()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_push_duplicate_kind_is_refused() {
        let mut stack = WindowStack::new();
        assert!(stack.push(window("a", false)));
        assert!(!stack.push(window("a", true)));

        assert_eq!(stack.len(), 1);
        assert!(!stack.get(&"a".into()).unwrap().hide_other());
    }

    #[test]
    fn test_remove_window() {
        let mut stack = stack_of(&[("a", false), ("b", false), ("c", false)]);
        let b = stack.get(&"b".into()).unwrap().clone();

        assert_eq!(stack.remove(&b), Some(1));
        assert_eq!(kinds(stack.render_order()), vec!["a", "c"]);
        assert!(!stack.contains(&b));
        assert!(!stack.contains_kind(&"b".into()));
    }

    #[test]
    fn test_remove_other_instance_of_same_kind_is_noop() {
        let mut stack = stack_of(&[("a", false)]);
        let stranger = window("a", false);

        assert!(!stack.contains(&stranger));
        assert_eq!(stack.remove(&stranger), None);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_top_visible_skips_hidden_entries() {
        let stack = stack_of(&[("a", false), ("b", false), ("c", false)]);
        for window in stack.iter() {
            window.begin_showing();
            window.skip_transition();
        }
        let c = stack.get(&"c".into()).unwrap();
        c.begin_hiding();
        c.skip_transition();

        assert_eq!(stack.top_visible().unwrap().kind().as_str(), "b");
    }

    #[test]
    fn test_top_visible_none_when_all_hidden() {
        let stack = stack_of(&[("a", false), ("b", false)]);
        // New windows start hidden
        assert!(stack.top_visible().is_none());
    }

    #[test]
    fn test_hide_other_range_stops_at_boundary() {
        let stack = stack_of(&[("a", false), ("b", true), ("c", false), ("d", false)]);
        assert_eq!(kinds(stack.hide_other_range()), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_hide_other_range_without_boundary_is_whole_stack() {
        let stack = stack_of(&[("a", false), ("b", false)]);
        assert_eq!(kinds(stack.hide_other_range()), vec!["a", "b"]);

        let empty = WindowStack::new();
        assert!(empty.hide_other_range().is_empty());
    }

    #[test]
    fn test_iter_top_down() {
        let stack = stack_of(&[("a", false), ("b", false), ("c", false)]);
        let collected: Vec<_> = stack
            .iter_top_down()
            .map(|window| window.kind().as_str())
            .collect();
        assert_eq!(collected, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_position_consistency_after_operations() {
        let mut stack = stack_of(&[("a", false), ("b", false), ("c", false)]);
        let b = stack.get(&"b".into()).unwrap().clone();

        stack.remove(&b);

        assert_eq!(kinds(stack.render_order()), vec!["a", "c"]);
        assert!(stack.get(&"b".into()).is_none());

        for (i, window) in stack.render_order().iter().enumerate() {
            assert_eq!(stack.positions.get(window.kind()), Some(&i));
        }
    }
}
