//! Configurations of controllers.
use super::ScheduleConfig;
use crate::{replay_buffer::ReplayBufferConfig, rollout::RolloutConfig, ConfigFile};
use serde::{Deserialize, Serialize};

/// Configuration of [`PpoController`](super::PpoController).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PpoConfig {
    /// Configuration of the transition store.
    pub rollout: RolloutConfig,

    /// Number of passes over the collected data per update.
    pub epochs: usize,

    /// Number of transitions per gradient step.
    pub minibatch_size: usize,

    /// Discount factor.
    pub gamma: f32,

    /// Weighting of multi-step residuals in generalized advantage estimation.
    pub lambda: f32,

    /// Seed of minibatch shuffling.
    pub seed: u64,

    /// Cadence of logging, evaluation and termination.
    pub schedule: ScheduleConfig,
}

impl Default for PpoConfig {
    fn default() -> Self {
        Self {
            rollout: RolloutConfig::default(),
            epochs: 10,
            minibatch_size: 64,
            gamma: 0.99,
            lambda: 0.95,
            seed: 42,
            schedule: ScheduleConfig::default(),
        }
    }
}

impl PpoConfig {
    /// Sets the configuration of the transition store.
    pub fn rollout(mut self, v: RolloutConfig) -> Self {
        self.rollout = v;
        self
    }

    /// Sets the number of epochs.
    pub fn epochs(mut self, v: usize) -> Self {
        self.epochs = v;
        self
    }

    /// Sets the minibatch size.
    pub fn minibatch_size(mut self, v: usize) -> Self {
        self.minibatch_size = v;
        self
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the GAE parameter.
    pub fn lambda(mut self, v: f32) -> Self {
        self.lambda = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the schedule.
    pub fn schedule(mut self, v: ScheduleConfig) -> Self {
        self.schedule = v;
        self
    }
}

impl ConfigFile for PpoConfig {}

/// Configuration of [`DdpgController`](super::DdpgController).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DdpgConfig {
    /// Length of an observation.
    pub obs_dim: usize,

    /// Length of an action.
    pub act_dim: usize,

    /// Number of transitions sampled per update.
    pub batch_size: usize,

    /// Configuration of the replay buffer.
    pub replay_buffer: ReplayBufferConfig,

    /// Cadence of logging, evaluation and termination.
    pub schedule: ScheduleConfig,
}

impl Default for DdpgConfig {
    fn default() -> Self {
        Self {
            obs_dim: 1,
            act_dim: 1,
            batch_size: 64,
            replay_buffer: ReplayBufferConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}

impl DdpgConfig {
    /// Sets the length of an observation.
    pub fn obs_dim(mut self, v: usize) -> Self {
        self.obs_dim = v;
        self
    }

    /// Sets the length of an action.
    pub fn act_dim(mut self, v: usize) -> Self {
        self.act_dim = v;
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the configuration of the replay buffer.
    pub fn replay_buffer(mut self, v: ReplayBufferConfig) -> Self {
        self.replay_buffer = v;
        self
    }

    /// Sets the schedule.
    pub fn schedule(mut self, v: ScheduleConfig) -> Self {
        self.schedule = v;
        self
    }
}

impl ConfigFile for DdpgConfig {}

/// Configuration of evaluation runs.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EvalConfig {
    /// Number of episodes per evaluation.
    pub n_episodes: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self { n_episodes: 10 }
    }
}

impl EvalConfig {
    /// Sets the number of episodes per evaluation.
    pub fn n_episodes(mut self, v: usize) -> Self {
        self.n_episodes = v;
        self
    }
}

impl ConfigFile for EvalConfig {}
