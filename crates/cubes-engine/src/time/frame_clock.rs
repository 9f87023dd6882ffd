use std::time::{Duration, Instant};

/// Timing snapshot for one frame.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,

    /// Seconds since the clock's origin. Not clamped; animation reads this.
    pub elapsed: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Number of ticks before this one.
    pub frame_index: u64,
}

/// Frame clock anchored at a fixed time origin.
///
/// The origin is captured when the clock is created (or re-anchored with
/// [`FrameClock::reset_origin`]); every tick reports both the clamped frame
/// delta and the unclamped time elapsed since that origin.
#[derive(Debug, Clone)]
pub struct FrameClock {
    origin: Instant,
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates a clock whose origin is now.
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        let now = Instant::now();
        Self {
            origin: now,
            last: now,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// The instant elapsed time is measured from.
    pub fn origin(&self) -> Instant {
        self.origin
    }

    /// Moves the origin (and the delta baseline) to now.
    pub fn reset_origin(&mut self) {
        let now = Instant::now();
        self.origin = now;
        self.last = now;
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    pub(crate) fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);

        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: now.saturating_duration_since(self.origin).as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_measured_from_origin() {
        let mut clock = FrameClock::new();
        let origin = clock.origin();

        let ft = clock.tick_at(origin + Duration::from_millis(1500));
        assert!((ft.elapsed - 1.5).abs() < 1e-6);
    }

    #[test]
    fn dt_is_clamped_but_elapsed_is_not() {
        let mut clock = FrameClock::new();
        let origin = clock.origin();

        let ft = clock.tick_at(origin + Duration::from_secs(10));
        assert!((ft.dt - 0.25).abs() < 1e-6);
        assert!((ft.elapsed - 10.0).abs() < 1e-4);
    }

    #[test]
    fn dt_has_a_floor() {
        let mut clock = FrameClock::new();
        let origin = clock.origin();

        let ft = clock.tick_at(origin);
        assert!((ft.dt - 0.0001).abs() < 1e-7);
        assert_eq!(ft.elapsed, 0.0);
    }

    #[test]
    fn frame_index_counts_ticks() {
        let mut clock = FrameClock::new();
        let origin = clock.origin();

        assert_eq!(clock.tick_at(origin).frame_index, 0);
        assert_eq!(clock.tick_at(origin).frame_index, 1);
        assert_eq!(clock.tick_at(origin).frame_index, 2);
    }
}
