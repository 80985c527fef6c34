//! Controller.
use super::StepInput;
use crate::record::{Metrics, Record};
use anyhow::Result;

/// The learning-side state machine driven by an interaction loop.
///
/// A controller turns observations into actions, accumulates experience and
/// decides when to learn from it. The loop asks [`Controller::should_update`]
/// after every step and calls [`Controller::update`] when it returns `true`.
pub trait Controller {
    /// Records the outcome of the previous action and returns the next action.
    ///
    /// `input.obs` is laid out as `[N, obs_dim]` and the returned action as
    /// `[N, act_dim]`.
    fn step(&mut self, input: &StepInput<'_>) -> Result<Vec<f32>>;

    /// Returns `true` when enough data has been collected for an update.
    fn should_update(&self) -> bool;

    /// Performs an update and returns its summary.
    ///
    /// Fails with [`PreconditionViolation`](crate::error::StrideError::PreconditionViolation)
    /// when [`Controller::should_update`] is `false`.
    fn update(&mut self) -> Result<Record>;

    /// Notifies the end of an episode of a single environment.
    ///
    /// `obs`, `reward` and `info` are the outcome of the last action of the
    /// episode.
    fn stop_episode(&mut self, obs: &[f32], reward: f32, info: &Record) -> Result<()>;

    /// Returns actions for observations without recording anything.
    fn act(&mut self, obs: &[f32]) -> Result<Vec<f32>>;

    /// Number of environment steps taken so far, summed over slots.
    fn global_step(&self) -> usize;

    /// Returns the metrics of the controller.
    fn metrics_mut(&mut self) -> &mut Metrics;

    /// Returns `true` when metrics should be written at the current step.
    fn should_log(&mut self) -> bool;

    /// Writes metrics.
    fn log(&mut self) -> Result<()>;

    /// Returns `true` when an evaluation should run at the current step.
    fn should_eval(&mut self) -> bool;

    /// Returns `true` when the interaction loop should stop.
    fn is_finished(&self) -> bool;
}
