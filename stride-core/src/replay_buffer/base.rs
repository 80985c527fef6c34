//! Uniform experience replay.
use super::ReplayBufferConfig;
use crate::error::StrideError;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A complete off-policy transition `(o_t, a_t, r_t+1, o_t+1, done_t+1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Experience {
    /// Observation.
    pub obs: Vec<f32>,

    /// Action taken on `obs`.
    pub act: Vec<f32>,

    /// Reward received after taking the action.
    pub reward: f32,

    /// Next observation.
    pub next_obs: Vec<f32>,

    /// `1.0` if the episode ended with this transition, `0.0` otherwise.
    pub is_terminated: f32,
}

/// Transitions sampled from a [`ReplayBuffer`].
///
/// Vector fields are laid out as `[len, dim]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionBatch {
    /// Observations.
    pub obs: Vec<f32>,

    /// Actions.
    pub act: Vec<f32>,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Next observations.
    pub next_obs: Vec<f32>,

    /// Termination flags.
    pub is_terminated: Vec<f32>,

    /// Indices of the sampled transitions in the buffer.
    pub ix_sample: Vec<usize>,
}

impl TransitionBatch {
    /// Number of transitions.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch has no transitions.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }
}

/// A ring buffer of [`Experience`]s with uniform sampling.
pub struct ReplayBuffer {
    capacity: usize,
    obs_dim: usize,
    act_dim: usize,

    /// Current insertion index.
    i: usize,
    size: usize,

    obs: Vec<f32>,
    act: Vec<f32>,
    reward: Vec<f32>,
    next_obs: Vec<f32>,
    is_terminated: Vec<f32>,
    rng: StdRng,
}

impl ReplayBuffer {
    /// Builds an empty buffer for transitions of the given dimensions.
    pub fn build(config: &ReplayBufferConfig, obs_dim: usize, act_dim: usize) -> Self {
        let capacity = config.capacity;
        Self {
            capacity,
            obs_dim,
            act_dim,
            i: 0,
            size: 0,
            obs: vec![0.; capacity * obs_dim],
            act: vec![0.; capacity * act_dim],
            reward: vec![0.; capacity],
            next_obs: vec![0.; capacity * obs_dim],
            is_terminated: vec![0.; capacity],
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Number of stored transitions.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if no transition is stored.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Maximum number of transitions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stores a transition, overwriting the oldest one when full.
    pub fn push(&mut self, exp: &Experience) -> Result<(), StrideError> {
        StrideError::check_len("obs", self.obs_dim, exp.obs.len())?;
        StrideError::check_len("act", self.act_dim, exp.act.len())?;
        StrideError::check_len("next_obs", self.obs_dim, exp.next_obs.len())?;
        if self.capacity == 0 {
            return Err(StrideError::CapacityExceeded { capacity: 0 });
        }

        let i = self.i;
        let (od, ad) = (self.obs_dim, self.act_dim);
        self.obs[i * od..(i + 1) * od].copy_from_slice(&exp.obs);
        self.act[i * ad..(i + 1) * ad].copy_from_slice(&exp.act);
        self.next_obs[i * od..(i + 1) * od].copy_from_slice(&exp.next_obs);
        self.reward[i] = exp.reward;
        self.is_terminated[i] = exp.is_terminated;

        self.i = (self.i + 1) % self.capacity;
        if self.size < self.capacity {
            self.size += 1;
        }
        Ok(())
    }

    /// Samples `size` transitions uniformly with replacement.
    pub fn batch(&mut self, size: usize) -> Result<TransitionBatch, StrideError> {
        if self.size == 0 {
            return Err(StrideError::PreconditionViolation(
                "cannot sample from an empty replay buffer".to_string(),
            ));
        }

        let n = self.size;
        let ixs: Vec<usize> = (0..size).map(|_| self.rng.gen_range(0..n)).collect();
        Ok(TransitionBatch {
            obs: gather(&self.obs, self.obs_dim, &ixs),
            act: gather(&self.act, self.act_dim, &ixs),
            reward: gather(&self.reward, 1, &ixs),
            next_obs: gather(&self.next_obs, self.obs_dim, &ixs),
            is_terminated: gather(&self.is_terminated, 1, &ixs),
            ix_sample: ixs,
        })
    }

    /// Returns the number of terminated episodes in the buffer.
    pub fn num_terminated_flags(&self) -> usize {
        self.is_terminated[..self.size]
            .iter()
            .filter(|&&d| d != 0.0)
            .count()
    }

    /// Returns the sum of all rewards in the buffer.
    pub fn sum_rewards(&self) -> f32 {
        self.reward[..self.size].iter().sum()
    }
}

fn gather(field: &[f32], dim: usize, ixs: &[usize]) -> Vec<f32> {
    let mut out = Vec::with_capacity(ixs.len() * dim);
    for &ix in ixs {
        out.extend_from_slice(&field[ix * dim..(ix + 1) * dim]);
    }
    out
}
