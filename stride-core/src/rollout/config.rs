//! Configuration of [`Rollout`](super::Rollout).
use crate::{batch::FieldDims, ConfigFile};
use serde::{Deserialize, Serialize};

/// Configuration of [`Rollout`](super::Rollout).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct RolloutConfig {
    /// The number of environments stepped together.
    pub n_envs: usize,

    /// The number of steps collected per environment before an update.
    pub time_horizon: usize,

    /// Length of an observation.
    pub obs_dim: usize,

    /// Length of an action.
    pub act_dim: usize,

    /// Length of the log-probability of an action.
    pub log_prob_dim: usize,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            n_envs: 1,
            time_horizon: 2048,
            obs_dim: 1,
            act_dim: 1,
            log_prob_dim: 1,
        }
    }
}

impl RolloutConfig {
    /// Sets the number of environments.
    pub fn n_envs(mut self, v: usize) -> Self {
        self.n_envs = v;
        self
    }

    /// Sets the time horizon.
    pub fn time_horizon(mut self, v: usize) -> Self {
        self.time_horizon = v;
        self
    }

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

    /// Sets the length of the log-probability of an action.
    pub fn log_prob_dim(mut self, v: usize) -> Self {
        self.log_prob_dim = v;
        self
    }

    /// Per-transition lengths of the vector fields.
    pub fn dims(&self) -> FieldDims {
        FieldDims {
            obs_dim: self.obs_dim,
            act_dim: self.act_dim,
            log_prob_dim: self.log_prob_dim,
        }
    }
}

impl ConfigFile for RolloutConfig {}
