//! Window factory registry
//!
//! Maps a [`WindowKind`] to the factory that builds a fresh instance of it.
//! Factories return a [`WindowBlueprint`]; the controller turns it into a
//! live [`Window`](super::Window) with the shared UI services injected.

use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

use super::{ControlId, EmptyContent, WindowCategory, WindowContent, WindowKind};
use crate::clock::FrameClock;
use crate::config::{PaneflowConfig, WindowDefinition};
use crate::effects::{AnimationPlayer, ClipAnimator};

/// Builds a new blueprint each time a window of its kind is created
pub type WindowFactory = Arc<dyn Fn(&FrameClock) -> WindowBlueprint + Send + Sync>;

/// Everything needed to instantiate a window
pub struct WindowBlueprint {
    pub category: WindowCategory,
    pub hide_other: bool,
    pub default_control: Option<ControlId>,
    pub animation_layer: usize,
    pub animator: Option<Arc<dyn AnimationPlayer>>,
    pub content: Box<dyn WindowContent>,
}

impl WindowBlueprint {
    pub fn new(content: impl WindowContent + 'static) -> Self {
        Self {
            category: WindowCategory::Normal,
            hide_other: false,
            default_control: None,
            animation_layer: 0,
            animator: None,
            content: Box::new(content),
        }
    }

    pub fn empty() -> Self {
        Self::new(EmptyContent)
    }

    pub fn category(mut self, category: WindowCategory) -> Self {
        self.category = category;
        self
    }

    pub fn hide_other(mut self, hide_other: bool) -> Self {
        self.hide_other = hide_other;
        self
    }

    pub fn default_control(mut self, control: ControlId) -> Self {
        self.default_control = Some(control);
        self
    }

    pub fn animation_layer(mut self, layer: usize) -> Self {
        self.animation_layer = layer;
        self
    }

    pub fn animator(mut self, animator: Arc<dyn AnimationPlayer>) -> Self {
        self.animator = Some(animator);
        self
    }
}

impl std::fmt::Debug for WindowBlueprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowBlueprint")
            .field("category", &self.category)
            .field("hide_other", &self.hide_other)
            .field("default_control", &self.default_control)
            .field("animation_layer", &self.animation_layer)
            .field("animated", &self.animator.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Default, Clone)]
pub struct WindowRegistry {
    factories: HashMap<WindowKind, WindowFactory>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the factory for `kind`
    pub fn register<F>(&mut self, kind: impl Into<WindowKind>, factory: F)
    where
        F: Fn(&FrameClock) -> WindowBlueprint + Send + Sync + 'static,
    {
        let kind = kind.into();
        debug!("Registered window kind '{}'", kind);
        self.factories.insert(kind, Arc::new(factory));
    }

    /// Register every window kind declared in `config`
    pub fn from_config(config: &PaneflowConfig) -> Self {
        let mut registry = Self::new();
        for definition in &config.windows {
            registry.register_definition(definition, config);
        }
        registry
    }

    /// Register a configured window kind with empty content.
    ///
    /// When animations are enabled, each instance gets its own
    /// [`ClipAnimator`] with the configured timings, sampled on the
    /// configured animation layer.
    pub fn register_definition(&mut self, definition: &WindowDefinition, config: &PaneflowConfig) {
        let category = definition.category;
        let hide_other = definition.hide_other;
        let default_control = definition.default_control();
        let layer = config.stack.animation_layer;
        let animation = Some(config.animation.clone()).filter(|animation| animation.enabled);

        self.register(definition.window_kind(), move |clock| {
            let mut blueprint = WindowBlueprint::empty()
                .category(category)
                .hide_other(hide_other)
                .animation_layer(layer);
            if let Some(control) = default_control {
                blueprint = blueprint.default_control(control);
            }
            if let Some(animation) = &animation {
                blueprint = blueprint.animator(Arc::new(ClipAnimator::from_config(animation, clock.clone())));
            }
            blueprint
        });
    }

    pub fn contains(&self, kind: &WindowKind) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kinds in sorted order
    pub fn kinds(&self) -> Vec<WindowKind> {
        let mut kinds: Vec<_> = self.factories.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Run the factory for `kind`, if one is registered
    pub fn build(&self, kind: &WindowKind, clock: &FrameClock) -> Option<WindowBlueprint> {
        self.factories.get(kind).map(|factory| factory(clock))
    }
}

impl std::fmt::Debug for WindowRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
