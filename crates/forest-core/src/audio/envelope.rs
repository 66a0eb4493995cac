//! Parameter automation as an explicit, inspectable curve.
//!
//! An [`Envelope`] holds a value at its origin and a list of events. It can be
//! evaluated at any time without a device, which is how both the offline
//! synthesizer and the browser breakpoint lowering consume it.

use crate::constants::SETTLE_TIME_CONSTANTS;
use crate::error::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Automation {
    /// Straight line from the previous event's end to `target` at `end`.
    LinearRamp { target: f32, end: f64 },
    /// Hold until `start`, then decay exponentially toward `target`.
    TargetApproach {
        target: f32,
        start: f64,
        time_constant: f64,
    },
}

impl Automation {
    /// Time at which this event starts changing the value.
    fn onset(&self, previous: f64) -> f64 {
        match *self {
            Automation::LinearRamp { .. } => previous,
            Automation::TargetApproach { start, .. } => start,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    initial: f32,
    origin: f64,
    events: Vec<Automation>,
}

#[inline]
fn approach(from: f32, target: f32, elapsed: f64, time_constant: f64) -> f32 {
    let k = (-elapsed / time_constant).exp() as f32;
    target + (from - target) * k
}

impl Envelope {
    /// Hold `initial` from `origin` on.
    pub fn new(initial: f32, origin: f64) -> Self {
        Self {
            initial,
            origin,
            events: Vec::new(),
        }
    }

    pub fn linear_ramp(mut self, target: f32, end: f64) -> Self {
        self.events.push(Automation::LinearRamp { target, end });
        self
    }

    pub fn approach(mut self, target: f32, start: f64, time_constant: f64) -> Self {
        self.events.push(Automation::TargetApproach {
            target,
            start,
            time_constant,
        });
        self
    }

    pub fn initial(&self) -> f32 {
        self.initial
    }

    pub fn origin(&self) -> f64 {
        self.origin
    }

    pub fn events(&self) -> &[Automation] {
        &self.events
    }

    /// Check the event list is finite, ordered and well formed.
    pub fn validate(&self, param: &str) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::Envelope {
            param: param.to_string(),
            reason,
        };
        if !self.initial.is_finite() || !self.origin.is_finite() {
            return Err(invalid("initial value and origin must be finite".into()));
        }
        let mut cursor = self.origin;
        let mut after_approach = false;
        for (i, event) in self.events.iter().enumerate() {
            match *event {
                Automation::LinearRamp { target, end } => {
                    if after_approach {
                        return Err(invalid(format!(
                            "event {i}: linear ramp cannot follow an approach"
                        )));
                    }
                    if !target.is_finite() || !end.is_finite() {
                        return Err(invalid(format!("event {i}: non-finite ramp")));
                    }
                    if end < cursor {
                        return Err(invalid(format!(
                            "event {i}: ramp ends at {end} before {cursor}"
                        )));
                    }
                    cursor = end;
                }
                Automation::TargetApproach {
                    target,
                    start,
                    time_constant,
                } => {
                    if !target.is_finite() || !start.is_finite() || !time_constant.is_finite() {
                        return Err(invalid(format!("event {i}: non-finite approach")));
                    }
                    if time_constant <= 0.0 {
                        return Err(invalid(format!(
                            "event {i}: time constant must be positive, got {time_constant}"
                        )));
                    }
                    if start < cursor {
                        return Err(invalid(format!(
                            "event {i}: approach starts at {start} before {cursor}"
                        )));
                    }
                    cursor = start;
                    after_approach = true;
                }
            }
        }
        Ok(())
    }

    /// Value of the curve at absolute time `t`.
    pub fn evaluate(&self, t: f64) -> f32 {
        if t <= self.origin {
            return self.initial;
        }
        let mut time = self.origin;
        let mut value = self.initial;
        for (i, event) in self.events.iter().enumerate() {
            match *event {
                Automation::LinearRamp { target, end } => {
                    if t < end {
                        let span = end - time;
                        if span <= 0.0 {
                            return target;
                        }
                        let frac = ((t - time) / span) as f32;
                        return value + (target - value) * frac;
                    }
                    time = end;
                    value = target;
                }
                Automation::TargetApproach {
                    target,
                    start,
                    time_constant,
                } => {
                    if t < start {
                        return value;
                    }
                    let until = self
                        .events
                        .get(i + 1)
                        .map(|next| next.onset(start))
                        .unwrap_or(f64::INFINITY);
                    if t < until {
                        return approach(value, target, t - start, time_constant);
                    }
                    value = approach(value, target, until - start, time_constant);
                    time = until;
                }
            }
        }
        value
    }

    /// Seconds after the origin once every event has effectively finished.
    pub fn settle_time(&self) -> f64 {
        self.events
            .iter()
            .map(|event| match *event {
                Automation::LinearRamp { end, .. } => end,
                Automation::TargetApproach {
                    start,
                    time_constant,
                    ..
                } => start + SETTLE_TIME_CONSTANTS * time_constant,
            })
            .fold(self.origin, f64::max)
            - self.origin
    }

    pub fn is_settled(&self, t: f64) -> bool {
        t >= self.origin + self.settle_time()
    }

    /// Sample the curve every `spacing` seconds from the origin through the
    /// settle time. Ramp ends and approach starts are always included, so a
    /// piecewise-linear replay reproduces ramps and holds exactly.
    pub fn breakpoints(&self, spacing: f64) -> Vec<(f64, f32)> {
        let end = self.origin + self.settle_time();
        let mut times = Vec::new();
        if spacing.is_finite() && spacing > 0.0 {
            let steps = ((end - self.origin) / spacing).ceil() as usize;
            times.extend((0..=steps).map(|k| (self.origin + k as f64 * spacing).min(end)));
        } else {
            times.push(self.origin);
            times.push(end);
        }
        for event in &self.events {
            times.push(match *event {
                Automation::LinearRamp { end, .. } => end,
                Automation::TargetApproach { start, .. } => start,
            });
        }
        times.sort_by(|a, b| a.total_cmp(b));
        times.dedup_by(|a, b| (*a - *b).abs() < 1e-6);
        times.into_iter().map(|t| (t, self.evaluate(t))).collect()
    }
}
