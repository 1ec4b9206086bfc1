use super::types::Animation;
use crate::types::DEFAULT_TICKS_PER_SECOND;
use log::{trace, warn};
use std::time::{Duration, Instant};

/// Substitutes the default rate for a rate that is zero or otherwise unusable
#[must_use]
pub fn ticks_per_second(raw: f32) -> f32 {
    if raw.is_finite() && raw > 0.0 {
        raw
    } else {
        DEFAULT_TICKS_PER_SECOND
    }
}

/// Converts wall clock seconds into ticks within `[0, duration)` so that the
/// animation loops. An animation without a positive duration is always at
/// tick 0.
#[must_use]
pub fn normalize(seconds: f32, raw_ticks_per_second: f32, duration: f32) -> f32 {
    if !(duration > 0.0) || !duration.is_finite() {
        return 0.0;
    }
    let ticks = (seconds * ticks_per_second(raw_ticks_per_second)).rem_euclid(duration);
    // rem_euclid can round up to exactly `duration` for tiny negative inputs
    if ticks >= duration {
        0.0
    } else {
        ticks
    }
}

/// Saturating conversion for banking scaled time. Negative and NaN become 0.
fn bank(seconds: f32) -> Duration {
    if seconds.is_nan() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f32(seconds).unwrap_or(Duration::MAX)
}

/// Wall clock source for animation playback. This is the only place real time
/// enters the crate, everything downstream works in ticks.
#[derive(Clone, Debug)]
pub struct AnimationClock {
    start: Instant,
    /// Time accumulated before the most recent resume
    banked: Duration,
    running: bool,
    speed: f32,
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationClock {
    /// Creates a running clock starting now
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            banked: Duration::ZERO,
            running: true,
            speed: 1.0,
        }
    }

    /// Playback speed multiplier, 1.0 is normal. A speed that is not finite
    /// is ignored.
    pub fn set_speed(&mut self, speed: f32) {
        if !speed.is_finite() {
            warn!("clock speed {} ignored", speed);
            return;
        }
        // Bank the time played at the old speed
        self.banked = bank(self.seconds());
        self.start = Instant::now();
        self.speed = speed;
    }

    pub fn pause(&mut self) {
        if self.running {
            self.banked = bank(self.seconds());
            self.running = false;
            trace!("clock paused at {:?}", self.banked);
        }
    }

    pub fn resume(&mut self) {
        if !self.running {
            self.start = Instant::now();
            self.running = true;
            trace!("clock resumed at {:?}", self.banked);
        }
    }

    pub fn reset(&mut self) {
        self.start = Instant::now();
        self.banked = Duration::ZERO;
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Scaled playback time in seconds
    #[must_use]
    pub fn seconds(&self) -> f32 {
        let live = if self.running {
            self.start.elapsed().as_secs_f32() * self.speed
        } else {
            0.0
        };
        self.banked.as_secs_f32() + live
    }

    /// Current tick for the given animation
    #[must_use]
    pub fn ticks(&self, animation: &Animation) -> f32 {
        animation.ticks(self.seconds())
    }
}
