//! Visual effects
//!
//! Animation playback for window transitions and the whole-canvas fade.

pub mod animations;
pub mod fade;

pub use animations::{AnimationPlayer, AnimationWaiter, Clip, ClipAnimator, PlaybackSample};
pub use fade::CanvasFade;
