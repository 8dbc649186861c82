use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds (clamped).
    pub dt: f32,

    /// Seconds since the clock was created or last reset.
    pub elapsed: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

impl FrameTime {
    /// Builds a snapshot for a given instant. Used by hosts that drive
    /// scenes without a window loop.
    pub fn at(start: Instant, now: Instant, dt: f32, frame_index: u64) -> Self {
        Self {
            dt,
            elapsed: now.saturating_duration_since(start).as_secs_f32(),
            now,
            frame_index,
        }
    }
}

/// Frame clock producing `FrameTime` snapshots.
///
/// Delta time is clamped so a debugger pause or a minimized window does not
/// make drift and scroll animations jump.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Resets the delta baseline (e.g. after resuming from suspension).
    /// `elapsed` keeps counting from the original start.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advances the clock to an explicit instant.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);

        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: now.saturating_duration_since(self.start).as_secs_f32(),
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
    fn dt_is_clamped_to_max_after_stall() {
        let mut clock = FrameClock::new();
        let t = clock.start + Duration::from_secs(3);
        let ft = clock.tick_at(t);
        assert!((ft.dt - 0.25).abs() < 1e-6);
        assert!((ft.elapsed - 3.0).abs() < 1e-3);
    }

    #[test]
    fn dt_is_clamped_to_min_on_zero_interval() {
        let mut clock = FrameClock::new();
        let t = clock.start;
        let ft = clock.tick_at(t);
        assert!(ft.dt > 0.0);
    }

    #[test]
    fn frame_index_increments() {
        let mut clock = FrameClock::new();
        let t = clock.start;
        assert_eq!(clock.tick_at(t + Duration::from_millis(16)).frame_index, 0);
        assert_eq!(clock.tick_at(t + Duration::from_millis(32)).frame_index, 1);
    }

    #[test]
    fn snapshot_at_computes_elapsed() {
        let start = Instant::now();
        let ft = FrameTime::at(start, start + Duration::from_millis(1500), 0.016, 7);
        assert!((ft.elapsed - 1.5).abs() < 1e-4);
        assert_eq!(ft.frame_index, 7);
    }
}
