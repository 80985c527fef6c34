//! Function approximators.
//!
//! The library never looks inside a function approximator. It calls `infer`
//! while collecting data and `update` once per minibatch; how these are
//! computed, and on which device, is up to the implementation.
use crate::{batch::Minibatch, replay_buffer::TransitionBatch};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Device on which an approximator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Device {
    /// Host CPU.
    Cpu,

    /// CUDA device with the given ordinal.
    Cuda(usize),
}

/// Explicit execution context held by an approximator.
///
/// Inference and update calls run in the context owned by the approximator
/// they are called on; there is no process-wide session.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExecutionContext {
    /// Device.
    pub device: Device,

    /// Seed of the approximator's own random number generator.
    pub seed: u64,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            device: Device::Cpu,
            seed: 42,
        }
    }
}

impl ExecutionContext {
    /// Creates a context.
    pub fn new(device: Device, seed: u64) -> Self {
        Self { device, seed }
    }
}

/// Output of [`OnPolicyApproximator::infer`] for `N` observations.
#[derive(Debug, Clone, PartialEq)]
pub struct Inference {
    /// Sampled actions, `[N, act_dim]`.
    pub act: Vec<f32>,

    /// Value estimates, `[N]`.
    pub value: Vec<f32>,

    /// Log-likelihood of the sampled actions, `[N, log_prob_dim]`.
    pub log_prob: Vec<f32>,
}

/// A stochastic policy with a value function, trained on-policy.
pub trait OnPolicyApproximator {
    /// Returns the execution context.
    fn context(&self) -> &ExecutionContext;

    /// Samples actions for observations laid out as `[N, obs_dim]`.
    fn infer(&mut self, obs: &[f32]) -> Result<Inference>;

    /// Performs one gradient step on a minibatch and returns the loss.
    fn update(&mut self, minibatch: &Minibatch<'_>) -> Result<f32>;
}

/// A deterministic actor with a critic, trained off-policy.
pub trait OffPolicyApproximator {
    /// Returns the execution context.
    fn context(&self) -> &ExecutionContext;

    /// Returns actions for observations laid out as `[N, obs_dim]`.
    fn infer(&mut self, obs: &[f32]) -> Result<Vec<f32>>;

    /// Performs one gradient step and returns `(critic_loss, actor_loss)`.
    fn update(&mut self, batch: &TransitionBatch) -> Result<(f32, f32)>;
}
