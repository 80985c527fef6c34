//! Step-based cadence of logging, evaluation and termination.
use serde::{Deserialize, Serialize};

/// Configuration of [`Schedule`].
///
/// Intervals are counted in environment steps summed over slots. An interval
/// of zero disables the corresponding trigger and `final_steps == 0` never
/// finishes.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ScheduleConfig {
    /// Number of environment steps after which training finishes.
    pub final_steps: usize,

    /// Interval of writing metrics.
    pub log_interval: usize,

    /// Interval of evaluation.
    pub eval_interval: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            final_steps: 1_000_000,
            log_interval: 1000,
            eval_interval: 100_000,
        }
    }
}

impl ScheduleConfig {
    /// Sets the number of environment steps after which training finishes.
    pub fn final_steps(mut self, v: usize) -> Self {
        self.final_steps = v;
        self
    }

    /// Sets the interval of writing metrics.
    pub fn log_interval(mut self, v: usize) -> Self {
        self.log_interval = v;
        self
    }

    /// Sets the interval of evaluation.
    pub fn eval_interval(mut self, v: usize) -> Self {
        self.eval_interval = v;
        self
    }
}

/// Fires once each time the step counter crosses a multiple of `every`.
#[derive(Debug, Clone)]
struct Interval {
    every: usize,
    next: usize,
}

impl Interval {
    fn new(every: usize) -> Self {
        Self { every, next: every }
    }

    fn is_due(&mut self, step: usize) -> bool {
        if self.every == 0 || step < self.next {
            return false;
        }
        self.next = (step / self.every + 1) * self.every;
        true
    }
}

/// Cadence of a controller, driven by its global step.
#[derive(Debug, Clone)]
pub struct Schedule {
    final_steps: usize,
    log: Interval,
    eval: Interval,
}

impl Schedule {
    /// Creates a schedule.
    pub fn new(config: &ScheduleConfig) -> Self {
        Self {
            final_steps: config.final_steps,
            log: Interval::new(config.log_interval),
            eval: Interval::new(config.eval_interval),
        }
    }

    /// Returns `true` at most once per log interval.
    pub fn should_log(&mut self, step: usize) -> bool {
        self.log.is_due(step)
    }

    /// Returns `true` at most once per evaluation interval.
    pub fn should_eval(&mut self, step: usize) -> bool {
        self.eval.is_due(step)
    }

    /// Returns `true` once `step` reaches `final_steps`.
    pub fn is_finished(&self, step: usize) -> bool {
        self.final_steps > 0 && step >= self.final_steps
    }
}
