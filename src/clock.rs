//! Frame clock
//!
//! The scheduler tick source every suspended transition waits on. The host
//! application owns the frame loop and calls [`FrameClock::tick`] once per
//! frame with the *unscaled* time that elapsed; tasks that need to resume on
//! the next frame await [`FrameClock::next_frame`].
//!
//! The clock also carries a global time scale. Game-style hosts pause the
//! world by setting it to zero; window transitions ignore it and keep
//! progressing on unscaled time.

use log::{debug, trace};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// One frame as published by the clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Monotonically increasing frame counter
    pub frame: u64,
    /// Wall time elapsed since the previous frame, unaffected by time scale
    pub unscaled_delta: Duration,
    /// Sum of every unscaled delta published so far
    pub unscaled_time: Duration,
    /// Global time scale in effect for this frame
    pub time_scale: f32,
}

impl Default for FrameTick {
    fn default() -> Self {
        Self {
            frame: 0,
            unscaled_delta: Duration::ZERO,
            unscaled_time: Duration::ZERO,
            time_scale: 1.0,
        }
    }
}

/// Shared handle to the frame tick source. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct FrameClock {
    sender: Arc<watch::Sender<FrameTick>>,
    time_scale: Arc<Mutex<f32>>,
}

impl FrameClock {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(FrameTick::default());
        Self {
            sender: Arc::new(sender),
            time_scale: Arc::new(Mutex::new(1.0)),
        }
    }

    /// Publish the next frame and wake every task waiting on it
    pub fn tick(&self, unscaled_delta: Duration) -> FrameTick {
        let time_scale = *self.time_scale.lock();
        let mut published = FrameTick::default();
        self.sender.send_modify(|tick| {
            tick.frame += 1;
            tick.unscaled_delta = unscaled_delta;
            tick.unscaled_time += unscaled_delta;
            tick.time_scale = time_scale;
            published = *tick;
        });
        trace!(
            "frame {} (+{:?}, t={:?})",
            published.frame,
            published.unscaled_delta,
            published.unscaled_time
        );
        published
    }

    /// The most recently published frame
    pub fn current(&self) -> FrameTick {
        *self.sender.borrow()
    }

    /// Accumulated unscaled time since the clock was created
    pub fn unscaled_time(&self) -> Duration {
        self.current().unscaled_time
    }

    /// Suspend until the next frame is published
    pub async fn next_frame(&self) -> FrameTick {
        let mut receiver = self.sender.subscribe();
        // The sender lives as long as `self`, so this only fails during teardown.
        let _ = receiver.changed().await;
        let tick = *receiver.borrow_and_update();
        tick
    }

    pub fn set_time_scale(&self, time_scale: f32) {
        let time_scale = time_scale.max(0.0);
        *self.time_scale.lock() = time_scale;
        debug!("Time scale set to {:.2}", time_scale);
    }

    pub fn time_scale(&self) -> f32 {
        *self.time_scale.lock()
    }

    /// Drive the clock from a tokio interval.
    ///
    /// For hosts that do not own a frame loop (the headless binary, tests).
    /// Abort the returned handle to stop ticking.
    pub fn spawn_driver(&self, frame_interval: Duration) -> JoinHandle<()> {
        let clock = self.clone();
        debug!("Starting frame driver at {:?} per frame", frame_interval);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(frame_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first interval tick completes immediately
            let mut last = interval.tick().await;
            loop {
                let now = interval.tick().await;
                clock.tick(now - last);
                last = now;
            }
        })
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
