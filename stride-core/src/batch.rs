//! Flattening, shuffling and minibatching of on-policy training data.
//!
//! A [`TrainingBatch`] is built from a [`Segment`] with [`flatten`], permuted
//! in place with [`shuffle`] and consumed through [`minibatches`].
use crate::{error::StrideError, rollout::Segment};
use rand::{seq::SliceRandom, Rng};

/// Per-transition lengths of the vector fields of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDims {
    /// Length of an observation.
    pub obs_dim: usize,

    /// Length of an action.
    pub act_dim: usize,

    /// Length of the log-probability of an action.
    pub log_prob_dim: usize,
}

/// Flat collection of transitions with their returns and advantages.
///
/// All fields hold the same number of transitions; this is checked when the
/// batch is constructed and kept by every operation on it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingBatch {
    dims: FieldDims,
    obs: Vec<f32>,
    act: Vec<f32>,
    log_prob: Vec<f32>,
    returns: Vec<f32>,
    advantages: Vec<f32>,
}

impl TrainingBatch {
    /// Creates a batch, validating that every field holds `returns.len()`
    /// transitions.
    pub fn new(
        dims: FieldDims,
        obs: Vec<f32>,
        act: Vec<f32>,
        log_prob: Vec<f32>,
        returns: Vec<f32>,
        advantages: Vec<f32>,
    ) -> Result<Self, StrideError> {
        let batch = Self {
            dims,
            obs,
            act,
            log_prob,
            returns,
            advantages,
        };
        batch.check(batch.len())?;
        Ok(batch)
    }

    /// Number of transitions.
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    /// Returns `true` if the batch has no transitions.
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    /// Per-transition lengths of the vector fields.
    pub fn dims(&self) -> FieldDims {
        self.dims
    }

    /// Observations, `[len, obs_dim]`.
    pub fn obs(&self) -> &[f32] {
        &self.obs
    }

    /// Actions, `[len, act_dim]`.
    pub fn act(&self) -> &[f32] {
        &self.act
    }

    /// Log-probabilities at collection time, `[len, log_prob_dim]`.
    pub fn log_prob(&self) -> &[f32] {
        &self.log_prob
    }

    /// Discounted returns.
    pub fn returns(&self) -> &[f32] {
        &self.returns
    }

    /// Advantages.
    pub fn advantages(&self) -> &[f32] {
        &self.advantages
    }

    /// Checks that every field holds `size` transitions.
    fn check(&self, size: usize) -> Result<(), StrideError> {
        let d = &self.dims;
        StrideError::check_len("obs", size * d.obs_dim, self.obs.len())?;
        StrideError::check_len("act", size * d.act_dim, self.act.len())?;
        StrideError::check_len("log_prob", size * d.log_prob_dim, self.log_prob.len())?;
        StrideError::check_len("returns", size, self.returns.len())?;
        StrideError::check_len("advantages", size, self.advantages.len())
    }

    fn slice(&self, start: usize, end: usize) -> Minibatch<'_> {
        let d = &self.dims;
        Minibatch {
            obs: &self.obs[start * d.obs_dim..end * d.obs_dim],
            act: &self.act[start * d.act_dim..end * d.act_dim],
            log_prob: &self.log_prob[start * d.log_prob_dim..end * d.log_prob_dim],
            returns: &self.returns[start..end],
            advantages: &self.advantages[start..end],
        }
    }
}

/// Reshapes a segment laid out as `(T, N, ...)` into a batch of `T * N`
/// transitions.
///
/// Transition `(t, e)` lands at row `t * N + e` with all its fields.
pub fn flatten(segment: Segment) -> Result<TrainingBatch, StrideError> {
    TrainingBatch::new(
        segment.dims,
        segment.obs,
        segment.act,
        segment.log_prob,
        segment.returns,
        segment.advantages,
    )
}

/// Applies one uniformly drawn permutation of `[0, size)` to every field.
///
/// Fails with [`StrideError::ShapeMismatch`] if a field does not hold `size`
/// transitions, in which case the batch is left untouched.
pub fn shuffle<R: Rng + ?Sized>(
    batch: &mut TrainingBatch,
    size: usize,
    rng: &mut R,
) -> Result<(), StrideError> {
    batch.check(size)?;

    let mut perm: Vec<usize> = (0..size).collect();
    perm.shuffle(rng);

    let d = batch.dims;
    batch.obs = permute(&batch.obs, d.obs_dim, &perm);
    batch.act = permute(&batch.act, d.act_dim, &perm);
    batch.log_prob = permute(&batch.log_prob, d.log_prob_dim, &perm);
    batch.returns = permute(&batch.returns, 1, &perm);
    batch.advantages = permute(&batch.advantages, 1, &perm);
    Ok(())
}

fn permute(field: &[f32], dim: usize, perm: &[usize]) -> Vec<f32> {
    let mut out = Vec::with_capacity(field.len());
    for &i in perm {
        out.extend_from_slice(&field[i * dim..(i + 1) * dim]);
    }
    out
}

/// Returns contiguous minibatches of exactly `minibatch_size` transitions.
///
/// The last `batch.len() % minibatch_size` transitions are not visited. A
/// minibatch size of zero yields nothing.
pub fn minibatches(batch: &TrainingBatch, minibatch_size: usize) -> Minibatches<'_> {
    Minibatches {
        batch,
        minibatch_size,
        start: 0,
    }
}

/// Iterator returned by [`minibatches`].
pub struct Minibatches<'a> {
    batch: &'a TrainingBatch,
    minibatch_size: usize,
    start: usize,
}

impl<'a> Minibatches<'a> {
    /// Number of transitions that will not be visited.
    pub fn dropped(&self) -> usize {
        match self.minibatch_size {
            0 => self.batch.len(),
            n => self.batch.len() % n,
        }
    }
}

impl<'a> Iterator for Minibatches<'a> {
    type Item = Minibatch<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let end = self.start + self.minibatch_size;
        if self.minibatch_size == 0 || end > self.batch.len() {
            return None;
        }
        let mb = self.batch.slice(self.start, end);
        self.start = end;
        Some(mb)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = match self.minibatch_size {
            0 => 0,
            m => (self.batch.len() - self.start) / m,
        };
        (n, Some(n))
    }
}

impl<'a> ExactSizeIterator for Minibatches<'a> {}

/// A view of consecutive transitions of a [`TrainingBatch`].
#[derive(Debug, Clone, Copy)]
pub struct Minibatch<'a> {
    /// Observations, `[len, obs_dim]`.
    pub obs: &'a [f32],

    /// Actions, `[len, act_dim]`.
    pub act: &'a [f32],

    /// Log-probabilities at collection time.
    pub log_prob: &'a [f32],

    /// Discounted returns.
    pub returns: &'a [f32],

    /// Advantages.
    pub advantages: &'a [f32],
}

impl<'a> Minibatch<'a> {
    /// Number of transitions.
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    /// Returns `true` if the minibatch has no transitions.
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }
}
