//! Unit tests for the window state machine

use super::*;
use crate::backend::{HeadlessUi, MockSelectionTarget, SelectionTarget};
use crate::clock::FrameClock;
use crate::effects::ClipAnimator;
use mockall::predicate::eq;
use std::time::Duration;

#[derive(Clone, Default)]
struct Journal(Arc<Mutex<Vec<&'static str>>>);

impl Journal {
    fn push(&self, entry: &'static str) {
        self.0.lock().push(entry);
    }

    fn entries(&self) -> Vec<&'static str> {
        self.0.lock().clone()
    }
}

struct Recording {
    journal: Journal,
    back: BackAction,
}

impl WindowContent for Recording {
    fn on_create(&mut self) {
        self.journal.push("create");
    }
    fn on_open(&mut self) {
        self.journal.push("open");
    }
    fn on_close(&mut self) {
        self.journal.push("close");
    }
    fn on_back(&mut self) -> BackAction {
        self.journal.push("back");
        self.back
    }
    fn on_destroy(&mut self) {
        self.journal.push("destroy");
    }
}

fn headless() -> (UiServices, Arc<HeadlessUi>) {
    UiServices::headless(FrameClock::new())
}

fn recorded_events(window: &Window) -> Arc<Mutex<Vec<WindowEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    window.add_listener(move |event| sink.lock().push(*event));
    events
}

#[test]
fn test_new_window_starts_hidden_and_idle() {
    let (services, _ui) = headless();
    let window = Window::new("home".into(), WindowBlueprint::empty(), services);

    assert_eq!(window.phase(), WindowPhase::Created);
    assert!(window.is_hidden());
    assert!(!window.is_focused());
    assert!(!window.is_in_transition());
    assert_eq!(window.transition_state(), TransitionState::None);
}

#[test]
fn test_window_ids_are_unique() {
    let (services, _ui) = headless();
    let a = Window::new("a".into(), WindowBlueprint::empty(), services.clone());
    let b = Window::new("a".into(), WindowBlueprint::empty(), services);
    assert_ne!(a.id(), b.id());
}

#[test]
fn test_lifecycle_hooks_and_events() {
    let (services, _ui) = headless();
    let journal = Journal::default();
    let window = Window::new(
        "inventory".into(),
        WindowBlueprint::new(Recording {
            journal: journal.clone(),
            back: BackAction::Close,
        }),
        services,
    );
    let events = recorded_events(&window);

    window.create();
    window.open();
    window.close();
    window.destroy();

    assert_eq!(journal.entries(), vec!["create", "open", "close", "destroy"]);
    assert_eq!(
        *events.lock(),
        vec![
            WindowEvent::Created,
            WindowEvent::Opened,
            WindowEvent::Closed,
            WindowEvent::Destroyed,
        ]
    );
    assert!(window.is_closed());
    assert!(window.is_destroyed());
}

#[test]
fn test_destroy_runs_teardown_once() {
    let (services, _ui) = headless();
    let journal = Journal::default();
    let window = Window::new(
        "shop".into(),
        WindowBlueprint::new(Recording {
            journal: journal.clone(),
            back: BackAction::Close,
        }),
        services,
    );

    window.destroy();
    window.destroy();

    assert_eq!(journal.entries(), vec!["destroy"]);
}

#[test]
fn test_begin_showing_marks_opening_transition() {
    let (services, ui) = headless();
    let window = Window::new("home".into(), WindowBlueprint::empty(), services);

    let ticket = window.begin_showing();

    assert!(ticket.is_some());
    assert!(!window.is_hidden());
    assert!(window.is_in_transition());
    assert_eq!(window.transition_state(), TransitionState::Opening);
    assert_eq!(window.phase(), WindowPhase::Showing);
    assert!(ui.is_surface_active(window.id()));
}

#[tokio::test]
async fn test_showing_without_animator_settles_immediately() {
    let (services, ui) = headless();
    let window = Window::new("home".into(), WindowBlueprint::empty(), services);
    let events = recorded_events(&window);

    window.showing(true).await;

    assert_eq!(window.phase(), WindowPhase::Shown);
    assert!(!window.is_in_transition());
    assert!(ui.is_surface_active(window.id()));
    assert_eq!(*events.lock(), vec![WindowEvent::Shown]);
}

#[tokio::test]
async fn test_hiding_deactivates_surface() {
    let (services, ui) = headless();
    let window = Window::new("home".into(), WindowBlueprint::empty(), services);
    window.showing(false).await;

    window.hiding(false).await;

    assert!(window.is_hidden());
    assert_eq!(window.phase(), WindowPhase::Hidden);
    assert!(!window.is_in_transition());
    assert!(!ui.is_surface_active(window.id()));
}

#[test]
fn test_skip_transition_settles_each_direction() {
    let (services, _ui) = headless();
    let window = Window::new("home".into(), WindowBlueprint::empty(), services);

    window.begin_showing();
    window.skip_transition();
    assert_eq!(window.phase(), WindowPhase::Shown);
    assert!(!window.is_in_transition());

    window.begin_hiding();
    window.skip_transition();
    assert_eq!(window.phase(), WindowPhase::Hidden);
    assert!(window.is_hidden());
    assert!(!window.is_in_transition());
}

#[test]
fn test_skip_transition_when_idle_is_noop() {
    let (services, _ui) = headless();
    let window = Window::new("home".into(), WindowBlueprint::empty(), services);
    let events = recorded_events(&window);

    window.skip_transition();

    assert_eq!(window.phase(), WindowPhase::Created);
    assert!(events.lock().is_empty());
}

#[tokio::test]
async fn test_skipped_animation_never_settles_twice() {
    let clock = FrameClock::new();
    let (services, _ui) = UiServices::headless(clock.clone());
    let animator = Arc::new(ClipAnimator::new(
        clock.clone(),
        Duration::from_millis(100),
        Duration::from_millis(100),
    ));
    let window = Window::new(
        "home".into(),
        WindowBlueprint::empty().animator(animator),
        services,
    );
    let events = recorded_events(&window);

    let ticket = window.begin_showing().unwrap();
    let pending = {
        let window = window.clone();
        tokio::spawn(async move { window.finish_transition(ticket, true).await })
    };
    tokio::task::yield_now().await;
    assert!(window.is_in_transition());

    window.skip_transition();
    assert_eq!(window.phase(), WindowPhase::Shown);

    // Let the stale animation future run to completion
    for _ in 0..10 {
        clock.tick(Duration::from_millis(20));
        tokio::task::yield_now().await;
    }
    pending.await.unwrap();

    assert_eq!(*events.lock(), vec![WindowEvent::Shown]);
}

#[test]
fn test_focus_restores_default_control() {
    let clock = FrameClock::new();
    let ui = Arc::new(HeadlessUi::new());
    let mut selection = MockSelectionTarget::new();
    selection
        .expect_set_selected()
        .with(eq(Some(ControlId(5))))
        .times(1)
        .return_const(());
    let services = UiServices::new(ui.clone(), ui, Arc::new(selection), clock);

    let window = Window::new(
        "settings".into(),
        WindowBlueprint::empty().default_control(ControlId(5)),
        services,
    );

    window.set_focus(true);
    assert!(window.is_focused());
}

#[test]
fn test_focus_event_only_on_flip() {
    let (services, _ui) = headless();
    let window = Window::new("home".into(), WindowBlueprint::empty(), services);
    let events = recorded_events(&window);

    window.set_focus(true);
    window.set_focus(true);
    window.set_focus(false);
    window.set_focus(false);

    assert_eq!(
        *events.lock(),
        vec![WindowEvent::FocusChanged(true), WindowEvent::FocusChanged(false)]
    );
}

#[test]
fn test_unfocus_remembers_selection_for_refocus() {
    let (services, ui) = headless();
    let window = Window::new(
        "home".into(),
        WindowBlueprint::empty().default_control(ControlId(1)),
        services,
    );

    window.set_focus(true);
    assert_eq!(ui.selected(), Some(ControlId(1)));

    ui.set_selected(Some(ControlId(9)));
    window.set_focus(false);
    assert_eq!(ui.selected(), None);
    assert_eq!(window.last_selected_control(), Some(ControlId(9)));

    window.set_focus(true);
    assert_eq!(ui.selected(), Some(ControlId(9)));
}

#[test]
fn test_unfocus_without_selection_clears_target() {
    let clock = FrameClock::new();
    let ui = Arc::new(HeadlessUi::new());
    let mut selection = MockSelectionTarget::new();
    selection.expect_set_selected().with(eq(None)).times(2).return_const(());
    selection.expect_selected().return_const(None::<ControlId>);
    let services = UiServices::new(ui.clone(), ui, Arc::new(selection), clock);

    let window = Window::new("home".into(), WindowBlueprint::empty(), services);
    window.set_focus(true);
    window.set_focus(false);

    assert_eq!(window.last_selected_control(), None);
}

#[test]
fn test_hide_clears_selection_only_when_focused() {
    let (services, ui) = headless();
    let window = Window::new("home".into(), WindowBlueprint::empty(), services);
    ui.set_selected(Some(ControlId(4)));

    window.begin_hiding();
    window.hide();
    assert_eq!(ui.selected(), Some(ControlId(4)));

    window.set_focus(true);
    ui.set_selected(Some(ControlId(4)));
    window.hide();
    assert_eq!(ui.selected(), None);
}

#[test]
fn test_back_default_requests_close() {
    let (services, _ui) = headless();
    let window = Window::new("home".into(), WindowBlueprint::empty(), services);
    let events = recorded_events(&window);

    assert_eq!(window.back(), BackAction::Close);
    assert_eq!(*events.lock(), vec![WindowEvent::Backed]);
}

#[test]
fn test_back_override_can_ignore() {
    let (services, _ui) = headless();
    let journal = Journal::default();
    let window = Window::new(
        "title".into(),
        WindowBlueprint::new(Recording {
            journal: journal.clone(),
            back: BackAction::Ignore,
        }),
        services,
    );

    assert_eq!(window.back(), BackAction::Ignore);
    assert_eq!(journal.entries(), vec!["back"]);
}

#[test]
fn test_closed_window_rejects_transitions() {
    let (services, _ui) = headless();
    let window = Window::new("home".into(), WindowBlueprint::empty(), services);
    window.close();

    assert!(window.begin_showing().is_none());
    assert!(window.begin_hiding().is_none());
    assert_eq!(window.phase(), WindowPhase::Closed);
}

#[test]
#[should_panic(expected = "hook failure")]
fn test_hook_panics_propagate() {
    struct Faulty;
    impl WindowContent for Faulty {
        fn on_open(&mut self) {
            panic!("hook failure");
        }
    }

    let (services, _ui) = headless();
    let window = Window::new("faulty".into(), WindowBlueprint::new(Faulty), services);
    window.open();
}
