//! Window animation playback
//!
//! This module provides:
//! - The [`AnimationPlayer`] interface a host animation backend implements
//! - [`AnimationWaiter`], the suspension used while an open/close clip plays
//! - [`ClipAnimator`], a duration-based player driven by the frame clock

use log::{debug, trace};
use parking_lot::Mutex;
use std::time::Duration;

use crate::clock::FrameClock;
use crate::config::AnimationConfig;

/// Snapshot of a player's state on one layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSample {
    /// The player is still blending between two states
    pub in_transition: bool,
    /// Playback position of the current clip, 1.0 = end of clip
    pub normalized_time: f32,
}

impl PlaybackSample {
    pub const FINISHED: Self = Self {
        in_transition: false,
        normalized_time: 1.0,
    };

    pub fn is_finished(&self) -> bool {
        !self.in_transition && self.normalized_time >= 1.0
    }
}

/// Animation backend for a single window
pub trait AnimationPlayer: Send + Sync {
    /// Fire-and-forget trigger of the open clip
    fn play_open(&self);

    /// Fire-and-forget trigger of the close clip
    fn play_close(&self);

    /// Current playback state on `layer`
    fn sample(&self, layer: usize) -> PlaybackSample;
}

/// Suspends until an animation has finished playing.
///
/// Resolves immediately when there is no player. Otherwise the player is
/// sampled once per frame until it reports it is out of any transition and
/// at the end of its clip.
pub struct AnimationWaiter<'a> {
    player: Option<&'a dyn AnimationPlayer>,
    layer: usize,
    clock: &'a FrameClock,
}

impl<'a> AnimationWaiter<'a> {
    pub fn new(player: Option<&'a dyn AnimationPlayer>, layer: usize, clock: &'a FrameClock) -> Self {
        Self {
            player,
            layer,
            clock,
        }
    }

    /// Wait for the clip to end. Returns the unscaled time spent waiting.
    pub async fn wait(self) -> Duration {
        let Some(player) = self.player else {
            return Duration::ZERO;
        };

        let mut waited = Duration::ZERO;
        loop {
            let sample = player.sample(self.layer);
            if sample.is_finished() {
                trace!("Animation on layer {} finished after {:?}", self.layer, waited);
                return waited;
            }
            let tick = self.clock.next_frame().await;
            waited += tick.unscaled_delta;
        }
    }
}

/// Which clip a [`ClipAnimator`] is playing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clip {
    Open,
    Close,
}

#[derive(Debug, Clone, Copy)]
struct ActiveClip {
    clip: Clip,
    started_at: Duration,
}

/// Plays fixed-length open/close clips on layer 0.
///
/// Progress is read from the frame clock's accumulated unscaled time, so
/// the global time scale never stalls a clip. The first `blend` of every
/// clip is reported as an in-progress transition.
#[derive(Debug)]
pub struct ClipAnimator {
    clock: FrameClock,
    open_duration: Duration,
    close_duration: Duration,
    blend: Duration,
    playing: Mutex<Option<ActiveClip>>,
    history: Mutex<Vec<Clip>>,
}

impl ClipAnimator {
    pub fn new(clock: FrameClock, open_duration: Duration, close_duration: Duration) -> Self {
        Self {
            clock,
            open_duration,
            close_duration,
            blend: Duration::ZERO,
            playing: Mutex::new(None),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn from_config(config: &AnimationConfig, clock: FrameClock) -> Self {
        Self::new(
            clock,
            Duration::from_millis(config.open_duration_ms as u64),
            Duration::from_millis(config.close_duration_ms as u64),
        )
        .with_blend(Duration::from_millis(config.blend_ms as u64))
    }

    pub fn with_blend(mut self, blend: Duration) -> Self {
        self.blend = blend;
        self
    }

    /// Every clip triggered so far, oldest first
    pub fn history(&self) -> Vec<Clip> {
        self.history.lock().clone()
    }

    fn start(&self, clip: Clip) {
        let started_at = self.clock.unscaled_time();
        *self.playing.lock() = Some(ActiveClip { clip, started_at });
        self.history.lock().push(clip);
        debug!("🎬 Playing {:?} clip at t={:?}", clip, started_at);
    }

    fn duration_of(&self, clip: Clip) -> Duration {
        match clip {
            Clip::Open => self.open_duration,
            Clip::Close => self.close_duration,
        }
    }
}

impl AnimationPlayer for ClipAnimator {
    fn play_open(&self) {
        self.start(Clip::Open);
    }

    fn play_close(&self) {
        self.start(Clip::Close);
    }

    fn sample(&self, layer: usize) -> PlaybackSample {
        if layer != 0 {
            return PlaybackSample::FINISHED;
        }
        let Some(active) = *self.playing.lock() else {
            return PlaybackSample::FINISHED;
        };

        let elapsed = self.clock.unscaled_time().saturating_sub(active.started_at);
        let duration = self.duration_of(active.clip);
        let normalized_time = if duration.is_zero() {
            1.0
        } else {
            elapsed.as_secs_f32() / duration.as_secs_f32()
        };

        PlaybackSample {
            in_transition: elapsed < self.blend,
            normalized_time,
        }
    }
}
