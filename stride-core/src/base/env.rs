//! Environment.
use super::{Step, VecStep};
use anyhow::Result;

/// Represents an environment, typically an MDP.
///
/// Observations and actions are flat `f32` vectors of fixed length.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Starts a new episode and returns its first observation.
    fn reset(&mut self) -> Result<Vec<f32>>;

    /// Performes an environment step.
    fn step(&mut self, act: &[f32]) -> Result<Step>;
}

/// `N` independent environments stepped together as one batched call.
///
/// Implementations reset terminated slots on their own; callers never reset
/// individual slots.
pub trait VecEnv {
    /// Number of environments.
    fn n_envs(&self) -> usize;

    /// Resets all environments, returning observations laid out as `[N, obs_dim]`.
    fn reset(&mut self) -> Result<Vec<f32>>;

    /// Applies actions laid out as `[N, act_dim]`.
    fn step(&mut self, act: &[f32]) -> Result<VecStep>;
}
