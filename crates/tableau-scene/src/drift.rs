//! Idle drift: slow randomized wandering of a layer.
//!
//! A shared [`DriftClock`] produces a progress value in `[0, 1)` that wraps
//! periodically. Each layer keeps two targets (current and next) and eases
//! between them with a cosine curve; on wrap the next target becomes the
//! current one and a fresh next target is rolled, so the value never jumps.

use std::f32::consts::PI;

use rand::Rng;

/// One tick of the shared drift clock.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DriftPhase {
    pub progress: f32,
    /// `(1 - cos(progress·π)) / 2`.
    pub smooth: f32,
    /// True on the tick where progress passed 1 and wrapped.
    pub wrapped: bool,
}

impl DriftPhase {
    pub fn at(progress: f32) -> Self {
        Self {
            progress,
            smooth: (1.0 - (progress * PI).cos()) / 2.0,
            wrapped: false,
        }
    }
}

/// Wall-clock drift progress shared by every layer of a scene.
#[derive(Debug, Clone)]
pub struct DriftClock {
    period: f32,
    progress: f32,
}

impl DriftClock {
    /// `period` is the time for one full target-to-target swing, in seconds.
    pub fn new(period: f32) -> Self {
        Self {
            period: period.max(f32::EPSILON),
            progress: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.progress = 0.0;
    }

    pub fn tick(&mut self, dt: f32) -> DriftPhase {
        self.progress += dt.max(0.0) / self.period;
        let wrapped = self.progress >= 1.0;
        if wrapped {
            self.progress = self.progress.fract();
        }
        DriftPhase {
            wrapped,
            ..DriftPhase::at(self.progress)
        }
    }
}

/// Double-buffered drift targets of one layer.
#[derive(Debug, Clone)]
pub struct IdleDrift {
    range: f32,
    target: f32,
    next: f32,
    current: f32,
}

impl IdleDrift {
    /// Rolls both initial targets in `[0, range]`.
    pub fn new(range: f32, rng: &mut impl Rng) -> Self {
        let range = range.max(0.0);
        let target = rng.r#gen::<f32>() * range;
        let next = rng.r#gen::<f32>() * range;
        Self {
            range,
            target,
            next,
            current: target,
        }
    }

    pub fn range(&self) -> f32 {
        self.range
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    /// Re-rolls on wrap, then interpolates. Stays within `[0, range]`.
    pub fn advance(&mut self, phase: DriftPhase, rng: &mut impl Rng) -> f32 {
        if self.range <= 0.0 {
            return 0.0;
        }
        if phase.wrapped {
            self.target = self.next;
            self.next = rng.r#gen::<f32>() * self.range;
        }
        self.current = (self.target * (1.0 - phase.smooth) + self.next * phase.smooth).clamp(0.0, self.range);
        self.current
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn clock_wraps_and_keeps_overflow() {
        let mut clock = DriftClock::new(1.0);
        assert!(!clock.tick(0.6).wrapped);
        let phase = clock.tick(0.6);
        assert!(phase.wrapped);
        assert!((phase.progress - 0.2).abs() < 1e-5);
    }

    #[test]
    fn smooth_is_cosine_eased() {
        assert_eq!(DriftPhase::at(0.0).smooth, 0.0);
        assert!((DriftPhase::at(0.5).smooth - 0.5).abs() < 1e-6);
        assert!((DriftPhase::at(1.0).smooth - 1.0).abs() < 1e-6);
    }

    #[test]
    fn drift_stays_within_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut clock = DriftClock::new(1.0 / 0.37);
        let mut drift = IdleDrift::new(0.02, &mut rng);

        for _ in 0..5_000 {
            let v = drift.advance(clock.tick(1.0 / 60.0), &mut rng);
            assert!((0.0..=0.02).contains(&v), "{v}");
        }
    }

    #[test]
    fn wrap_continues_from_previous_next_target() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut drift = IdleDrift::new(1.0, &mut rng);

        let end = drift.advance(DriftPhase::at(1.0), &mut rng);
        let start = drift.advance(
            DriftPhase {
                wrapped: true,
                ..DriftPhase::at(0.0)
            },
            &mut rng,
        );
        assert!((end - start).abs() < 1e-5);
    }

    #[test]
    fn zero_range_is_inert() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut drift = IdleDrift::new(0.0, &mut rng);
        assert_eq!(drift.advance(DriftPhase::at(0.3), &mut rng), 0.0);
    }
}
