//! Environment steps.
use crate::record::Record;
use std::collections::HashMap;

/// Key of the cumulative reward of a finished episode in step information.
pub const EPISODE_RETURN_KEY: &str = "reward";

/// Auxiliary information of a vectorized step, keyed by environment slot.
///
/// Slots without information are absent.
pub type SlotInfo = HashMap<usize, Record>;

/// Outcome of applying an action to a single environment,
/// the tuple `(o_t+1, r_t+1, done_t+1, info)`.
#[derive(Debug, Clone)]
pub struct Step {
    /// Observation.
    pub obs: Vec<f32>,

    /// Reward received after taking the action.
    pub reward: f32,

    /// Flag denoting if the episode ended with this step.
    pub is_done: bool,

    /// Information defined by the environment.
    pub info: Record,
}

impl Step {
    /// Constructs a [`Step`] object.
    pub fn new(obs: Vec<f32>, reward: f32, is_done: bool, info: Record) -> Self {
        Self {
            obs,
            reward,
            is_done,
            info,
        }
    }
}

/// Outcome of a step of `N` environments, one slot per environment.
///
/// `obs` is laid out as `[N, obs_dim]` in row-major order. A slot with
/// `is_done[i] == 1.0` has already been reset, so `obs` holds the first
/// observation of its next episode.
#[derive(Debug, Clone)]
pub struct VecStep {
    /// Observations.
    pub obs: Vec<f32>,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Termination flags, `0.0` or `1.0`.
    pub is_done: Vec<f32>,

    /// Information keyed by slot.
    pub info: SlotInfo,
}

/// Arguments of [`Controller::step`](crate::Controller::step).
///
/// `reward` and `is_done` are those returned by the environment together with
/// `obs`, i.e. they belong to the action taken *before* `obs` was observed.
#[derive(Debug, Clone, Copy)]
pub struct StepInput<'a> {
    /// Observations of all slots, `[N, obs_dim]`.
    pub obs: &'a [f32],

    /// Rewards of all slots.
    pub reward: &'a [f32],

    /// Termination flags of all slots.
    pub is_done: &'a [f32],

    /// Information keyed by slot.
    pub info: &'a SlotInfo,
}

impl<'a> StepInput<'a> {
    /// Number of environment slots.
    pub fn n_envs(&self) -> usize {
        self.reward.len()
    }
}
