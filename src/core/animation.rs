//! Scroll target handed from the time scale to a host animator.
//!
//! The time scale never animates by itself. An animated scroll produces a
//! [`TimeScaleAnimation`]; the host samples [`TimeScaleAnimation::position`]
//! on its own frame clock and applies each sample as a non-animated scroll.

/// Duration of an animated scroll, in milliseconds.
pub const SCROLL_ANIMATION_DURATION_MS: f64 = 1000.0;

/// Right-offset scroll from `from` to `to` bars.
///
/// Times are milliseconds on the animator's clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScaleAnimation {
    pub from: f64,
    pub to: f64,
    pub start_time: f64,
    pub duration: f64,
}

impl TimeScaleAnimation {
    /// Scroll starting at `start_time` with [`SCROLL_ANIMATION_DURATION_MS`].
    #[must_use]
    pub fn scroll(from: f64, to: f64, start_time: f64) -> Self {
        Self {
            from,
            to,
            start_time,
            duration: SCROLL_ANIMATION_DURATION_MS,
        }
    }

    /// Elapsed share of the scroll at `now`, within `[0, 1]`.
    ///
    /// A scroll without duration or without distance is complete at once.
    #[must_use]
    pub fn progress(self, now: f64) -> f64 {
        if self.duration <= 0.0 || self.from == self.to {
            return 1.0;
        }
        ((now - self.start_time) / self.duration).clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn finished(self, now: f64) -> bool {
        self.progress(now) >= 1.0
    }

    /// Right offset to apply at `now`, linear in bars and exact at the end.
    #[must_use]
    pub fn position(self, now: f64) -> f64 {
        let progress = self.progress(now);
        if progress >= 1.0 {
            return self.to;
        }
        self.from + (self.to - self.from) * progress
    }

    /// Continues from wherever the scroll is at `now` towards a new target,
    /// keeping the duration.
    #[must_use]
    pub fn retarget(self, now: f64, to: f64) -> Self {
        Self {
            from: self.position(now),
            to,
            start_time: now,
            duration: self.duration,
        }
    }
}
