//! Tween timing: durations and easing curves for every animation stage

use std::time::Duration;

/// Easing curves, named after the GSAP eases the lesson pages used
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    /// `power2.out`: cubic ease-out
    Power2Out,
    /// `power2.in`: cubic ease-in
    Power2In,
    /// `back.out(overshoot)`
    BackOut(f64),
}

impl Easing {
    /// Map linear progress `t` in `[0, 1]` onto the curve
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Power2Out => 1.0 - (1.0 - t).powi(3),
            Easing::Power2In => t.powi(3),
            Easing::BackOut(overshoot) => {
                let c3 = overshoot + 1.0;
                let u = t - 1.0;
                1.0 + c3 * u.powi(3) + overshoot * u.powi(2)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub duration: Duration,
    pub easing: Easing,
    /// Play forward then back again (doubles the total time)
    pub yoyo: bool,
}

impl Timing {
    pub const fn new(millis: u64, easing: Easing) -> Self {
        Timing {
            duration: Duration::from_millis(millis),
            easing,
            yoyo: false,
        }
    }

    pub const fn yoyo(self) -> Self {
        Timing { yoyo: true, ..self }
    }

    /// Wall time including the yoyo leg
    pub fn total(&self) -> Duration {
        if self.yoyo {
            self.duration * 2
        } else {
            self.duration
        }
    }
}

pub const ASSIGNMENT_SPARK: Timing = Timing::new(1200, Easing::Power2Out);
pub const BOX_POP: Timing = Timing::new(500, Easing::BackOut(1.7));
pub const INPUT_SPARK: Timing = Timing::new(1500, Easing::Linear);
pub const PRINT_SPARK: Timing = Timing::new(1200, Easing::Linear);
pub const OUTPUT_LINE: Timing = Timing::new(500, Easing::Power2Out);
pub const CALCULATION_BOX: Timing = Timing::new(1500, Easing::BackOut(1.7));
pub const CONVERTER: Timing = Timing::new(400, Easing::Power2Out).yoyo();
pub const REVERSE: Timing = Timing::new(300, Easing::Power2In);

/// Slowest playback rate; anything slower is treated as this
pub const MIN_SPEED: f64 = 0.01;

/// A running tween, scaled by the configured animation speed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    timing: Timing,
    speed: f64,
}

impl Tween {
    /// `speed` multiplies playback rate; zero or negative means instantaneous
    pub fn new(timing: Timing, speed: f64) -> Self {
        Tween { timing, speed }
    }

    pub fn duration(&self) -> Duration {
        if self.speed <= 0.0 {
            return Duration::ZERO;
        }
        self.timing.total().div_f64(self.speed.max(MIN_SPEED))
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration()
    }

    /// Eased progress at `elapsed`; goes back down to 0 on the yoyo leg.
    pub fn progress(&self, elapsed: Duration) -> f64 {
        let total = self.duration();
        if total.is_zero() {
            return if self.timing.yoyo { 0.0 } else { 1.0 };
        }
        let t = (elapsed.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0);
        let t = if self.timing.yoyo {
            1.0 - (2.0 * t - 1.0).abs()
        } else {
            t
        };
        self.timing.easing.apply(t)
    }

    /// Interpolate between `from` and `to` at `elapsed`
    pub fn lerp(&self, from: f64, to: f64, elapsed: Duration) -> f64 {
        from + (to - from) * self.progress(elapsed)
    }
}
