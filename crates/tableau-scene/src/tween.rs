//! Single-slot scalar tweens.
//!
//! Each animatable property owns one [`Tweened`]; starting a new tween
//! replaces the in-flight one, so there is only ever one writer per property.
//! Time is passed in explicitly (`Instant`) and tweens advance when their
//! owner ticks them.

use std::time::{Duration, Instant};

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Easing {
    #[default]
    Linear,
    QuadraticOut,
    QuadraticInOut,
    QuarticOut,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::QuadraticOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::QuadraticInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::QuarticOut => 1.0 - (1.0 - t).powi(4),
        }
    }
}

#[derive(Debug, Copy, Clone)]
struct Tween {
    from: f32,
    to: f32,
    start: Instant,
    duration: Duration,
    easing: Easing,
}

impl Tween {
    fn progress(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }
}

/// Result of [`Tweened::advance`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TweenStatus {
    /// No tween was in flight.
    Idle,
    Running,
    /// The tween reached its target on this call.
    Finished,
}

/// A scalar with at most one active tween.
#[derive(Debug, Clone)]
pub struct Tweened {
    value: f32,
    tween: Option<Tween>,
}

impl Tweened {
    pub fn new(value: f32) -> Self {
        Self { value, tween: None }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Where the value is heading; the current value when idle.
    pub fn target(&self) -> f32 {
        self.tween.map_or(self.value, |t| t.to)
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    /// Jumps to `value`, cancelling any tween.
    pub fn set(&mut self, value: f32) {
        self.tween = None;
        self.value = value;
    }

    /// Starts a tween from the current value, replacing any in-flight one.
    /// A zero duration applies the target immediately.
    pub fn animate_to(&mut self, to: f32, duration: Duration, easing: Easing, now: Instant) {
        if duration.is_zero() {
            self.set(to);
            return;
        }
        self.tween = Some(Tween {
            from: self.value,
            to,
            start: now,
            duration,
            easing,
        });
    }

    pub fn advance(&mut self, now: Instant) -> TweenStatus {
        let Some(tween) = self.tween else {
            return TweenStatus::Idle;
        };

        let t = tween.progress(now);
        if t >= 1.0 {
            self.value = tween.to;
            self.tween = None;
            return TweenStatus::Finished;
        }

        self.value = tween.from + (tween.to - tween.from) * tween.easing.apply(t);
        TweenStatus::Running
    }

    /// Stops the tween where it is.
    pub fn cancel(&mut self) {
        self.tween = None;
    }
}

impl Default for Tweened {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    // ── easing ────────────────────────────────────────────────────────────

    #[test]
    fn easings_hit_endpoints() {
        for e in [Easing::Linear, Easing::QuadraticOut, Easing::QuadraticInOut, Easing::QuarticOut] {
            assert_eq!(e.apply(0.0), 0.0, "{e:?}");
            assert!((e.apply(1.0) - 1.0).abs() < 1e-6, "{e:?}");
        }
    }

    #[test]
    fn out_easings_lead_linear() {
        assert!(Easing::QuadraticOut.apply(0.25) > 0.25);
        assert!(Easing::QuarticOut.apply(0.25) > Easing::QuadraticOut.apply(0.25));
        assert!((Easing::QuadraticInOut.apply(0.5) - 0.5).abs() < 1e-6);
    }

    // ── tweened ───────────────────────────────────────────────────────────

    #[test]
    fn converges_after_duration() {
        let t0 = Instant::now();
        let mut v = Tweened::new(1.0);
        v.animate_to(0.0, ms(400), Easing::QuadraticOut, t0);

        assert_eq!(v.advance(t0 + ms(200)), TweenStatus::Running);
        assert!(v.value() > 0.0 && v.value() < 1.0);

        assert_eq!(v.advance(t0 + ms(400)), TweenStatus::Finished);
        assert_eq!(v.value(), 0.0);
        assert_eq!(v.advance(t0 + ms(500)), TweenStatus::Idle);
    }

    #[test]
    fn new_tween_replaces_in_flight_one() {
        let t0 = Instant::now();
        let mut v = Tweened::new(0.0);
        v.animate_to(10.0, ms(100), Easing::Linear, t0);
        v.advance(t0 + ms(50));
        assert!((v.value() - 5.0).abs() < 1e-4);

        v.animate_to(0.0, ms(100), Easing::Linear, t0 + ms(50));
        assert_eq!(v.target(), 0.0);
        v.advance(t0 + ms(100));
        assert!((v.value() - 2.5).abs() < 1e-4);
        v.advance(t0 + ms(150));
        assert_eq!(v.value(), 0.0);
    }

    #[test]
    fn zero_duration_is_instant() {
        let mut v = Tweened::new(1.0);
        v.animate_to(0.0, Duration::ZERO, Easing::Linear, Instant::now());
        assert_eq!(v.value(), 0.0);
        assert!(!v.is_animating());
    }

    #[test]
    fn cancel_freezes_value() {
        let t0 = Instant::now();
        let mut v = Tweened::new(0.0);
        v.animate_to(1.0, ms(100), Easing::Linear, t0);
        v.advance(t0 + ms(30));
        let frozen = v.value();
        v.cancel();
        assert_eq!(v.advance(t0 + ms(200)), TweenStatus::Idle);
        assert_eq!(v.value(), frozen);
    }
}
