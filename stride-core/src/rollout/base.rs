//! Fixed-capacity store of on-policy transitions.
use super::RolloutConfig;
use crate::{batch::FieldDims, error::StrideError, gae};

/// Fields of one step of `N` environments, passed to [`Rollout::add`].
///
/// Vector fields are laid out as `[N, dim]`, scalar fields as `[N]`.
#[derive(Debug, Clone, Copy)]
pub struct RolloutStep<'a> {
    /// Observations.
    pub obs: &'a [f32],

    /// Actions.
    pub act: &'a [f32],

    /// Rewards of the previous actions.
    pub reward: &'a [f32],

    /// Value estimates of `obs`.
    pub value: &'a [f32],

    /// Log-probabilities of `act`.
    pub log_prob: &'a [f32],

    /// Termination flags of the previous actions.
    pub terminal: &'a [f32],
}

/// Read-only view of the stored steps, returned by [`Rollout::fetch`].
///
/// Fields are laid out time-major as `[size, N, ...]`.
#[derive(Debug, Clone, Copy)]
pub struct RolloutView<'a> {
    /// Number of stored steps.
    pub size: usize,

    /// Number of environments.
    pub n_envs: usize,

    /// Observations.
    pub obs: &'a [f32],

    /// Actions.
    pub act: &'a [f32],

    /// Rewards.
    pub reward: &'a [f32],

    /// Value estimates.
    pub value: &'a [f32],

    /// Log-probabilities.
    pub log_prob: &'a [f32],

    /// Termination flags.
    pub terminal: &'a [f32],
}

/// The first `T` stored steps with their returns and advantages.
///
/// Fields are laid out time-major as `[T, N, ...]`. The last stored step only
/// contributes its value estimate as bootstrap and is not part of the segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Number of steps, `T`.
    pub horizon: usize,

    /// Number of environments, `N`.
    pub n_envs: usize,

    /// Per-transition lengths of the vector fields.
    pub dims: FieldDims,

    /// Observations.
    pub obs: Vec<f32>,

    /// Actions.
    pub act: Vec<f32>,

    /// Log-probabilities at collection time.
    pub log_prob: Vec<f32>,

    /// Value estimates at collection time.
    pub value: Vec<f32>,

    /// Discounted returns.
    pub returns: Vec<f32>,

    /// Generalized advantage estimates.
    pub advantages: Vec<f32>,
}

/// Trajectory segment of `N` environments holding up to `T + 1` steps.
///
/// Steps are added for all environments at once, so every field always holds
/// the same number of steps. The store refuses to grow past `T + 1` steps
/// until [`Rollout::flush`] is called.
pub struct Rollout {
    n_envs: usize,
    time_horizon: usize,
    dims: FieldDims,
    size: usize,
    obs: Vec<f32>,
    act: Vec<f32>,
    reward: Vec<f32>,
    value: Vec<f32>,
    log_prob: Vec<f32>,
    terminal: Vec<f32>,
}

impl Rollout {
    /// Builds an empty store.
    pub fn build(config: &RolloutConfig) -> Self {
        let n = config.n_envs;
        let capacity = config.time_horizon + 1;
        let dims = config.dims();
        Self {
            n_envs: n,
            time_horizon: config.time_horizon,
            dims,
            size: 0,
            obs: vec![0f32; capacity * n * dims.obs_dim],
            act: vec![0f32; capacity * n * dims.act_dim],
            reward: vec![0f32; capacity * n],
            value: vec![0f32; capacity * n],
            log_prob: vec![0f32; capacity * n * dims.log_prob_dim],
            terminal: vec![0f32; capacity * n],
        }
    }

    /// Number of steps the store can hold, `T + 1`.
    pub fn capacity(&self) -> usize {
        self.time_horizon + 1
    }

    /// Number of environments.
    pub fn n_envs(&self) -> usize {
        self.n_envs
    }

    /// The number of steps collected per environment before an update, `T`.
    pub fn time_horizon(&self) -> usize {
        self.time_horizon
    }

    /// Number of stored steps.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns `true` if the store holds `T + 1` steps.
    pub fn is_full(&self) -> bool {
        self.size == self.capacity()
    }

    /// Appends one step of all environments.
    ///
    /// Fails with [`StrideError::CapacityExceeded`] if the store is full and
    /// with [`StrideError::ShapeMismatch`] if a field has a wrong length.
    /// Nothing is written on failure.
    pub fn add(&mut self, step: RolloutStep<'_>) -> Result<(), StrideError> {
        if self.is_full() {
            return Err(StrideError::CapacityExceeded {
                capacity: self.capacity(),
            });
        }

        let n = self.n_envs;
        let d = self.dims;
        StrideError::check_len("obs", n * d.obs_dim, step.obs.len())?;
        StrideError::check_len("act", n * d.act_dim, step.act.len())?;
        StrideError::check_len("reward", n, step.reward.len())?;
        StrideError::check_len("value", n, step.value.len())?;
        StrideError::check_len("log_prob", n * d.log_prob_dim, step.log_prob.len())?;
        StrideError::check_len("terminal", n, step.terminal.len())?;

        let t = self.size;
        write_row(&mut self.obs, t, step.obs);
        write_row(&mut self.act, t, step.act);
        write_row(&mut self.reward, t, step.reward);
        write_row(&mut self.value, t, step.value);
        write_row(&mut self.log_prob, t, step.log_prob);
        write_row(&mut self.terminal, t, step.terminal);
        self.size += 1;

        Ok(())
    }

    /// Returns the stored steps.
    pub fn fetch(&self) -> RolloutView<'_> {
        let n = self.n_envs;
        let d = &self.dims;
        let t = self.size;
        RolloutView {
            size: t,
            n_envs: n,
            obs: &self.obs[..t * n * d.obs_dim],
            act: &self.act[..t * n * d.act_dim],
            reward: &self.reward[..t * n],
            value: &self.value[..t * n],
            log_prob: &self.log_prob[..t * n * d.log_prob_dim],
            terminal: &self.terminal[..t * n],
        }
    }

    /// Returns the first `size - 1` stored steps with returns and advantages
    /// computed per environment by [`gae::estimate`].
    ///
    /// The segment is empty if fewer than two steps are stored.
    pub fn fetch_with_estimates(&self, gamma: f32, lambda: f32) -> Result<Segment, StrideError> {
        let n = self.n_envs;
        let d = self.dims;
        let horizon = self.size.saturating_sub(1);
        let mut returns = vec![0f32; horizon * n];
        let mut advantages = vec![0f32; horizon * n];

        if horizon > 0 {
            let view = self.fetch();
            for e in 0..n {
                let column = |field: &[f32]| -> Vec<f32> {
                    field.iter().skip(e).step_by(n).copied().collect()
                };
                let est = gae::estimate(
                    &column(view.reward),
                    &column(view.value),
                    &column(view.terminal),
                    gamma,
                    lambda,
                )?;
                for t in 0..horizon {
                    returns[t * n + e] = est.returns[t];
                    advantages[t * n + e] = est.advantages[t];
                }
            }
        }

        Ok(Segment {
            horizon,
            n_envs: n,
            dims: d,
            obs: self.obs[..horizon * n * d.obs_dim].to_vec(),
            act: self.act[..horizon * n * d.act_dim].to_vec(),
            log_prob: self.log_prob[..horizon * n * d.log_prob_dim].to_vec(),
            value: self.value[..horizon * n].to_vec(),
            returns,
            advantages,
        })
    }

    /// Empties the store. The buffers are kept and overwritten by later steps.
    pub fn flush(&mut self) {
        self.size = 0;
    }
}

fn write_row(field: &mut [f32], t: usize, row: &[f32]) {
    let len = row.len();
    field[t * len..(t + 1) * len].copy_from_slice(row);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch;

    fn config(n_envs: usize, time_horizon: usize) -> RolloutConfig {
        RolloutConfig::default()
            .n_envs(n_envs)
            .time_horizon(time_horizon)
            .obs_dim(2)
    }

    /// Adds a step where every field of environment `e` at time `t` encodes
    /// `(t, e)`, with reward 1 and no terminals.
    fn add_step(rollout: &mut Rollout, t: usize) -> Result<(), StrideError> {
        let n = rollout.n_envs();
        let tag: Vec<f32> = (0..n).map(|e| (10 * t + e) as f32).collect();
        let obs: Vec<f32> = tag.iter().flat_map(|&x| vec![x, -x]).collect();
        rollout.add(RolloutStep {
            obs: &obs,
            act: &tag,
            reward: &vec![1.0; n],
            value: &vec![0.0; n],
            log_prob: &tag,
            terminal: &vec![0.0; n],
        })
    }

    #[test]
    fn test_capacity() -> Result<(), StrideError> {
        let mut rollout = Rollout::build(&config(2, 3));
        assert_eq!(rollout.capacity(), 4);
        for t in 0..4 {
            assert!(!rollout.is_full());
            assert_eq!(rollout.size(), t);
            add_step(&mut rollout, t)?;
        }
        assert!(rollout.is_full());
        assert_eq!(
            add_step(&mut rollout, 4).unwrap_err(),
            StrideError::CapacityExceeded { capacity: 4 }
        );
        assert_eq!(rollout.size(), 4);

        rollout.flush();
        assert_eq!(rollout.size(), 0);
        add_step(&mut rollout, 0)?;
        assert_eq!(rollout.size(), 1);
        Ok(())
    }

    #[test]
    fn test_shape_mismatch_writes_nothing() -> Result<(), StrideError> {
        let mut rollout = Rollout::build(&config(2, 3));
        add_step(&mut rollout, 0)?;
        let err = rollout
            .add(RolloutStep {
                obs: &[0.0; 4],
                act: &[0.0; 2],
                reward: &[0.0; 2],
                value: &[0.0; 3],
                log_prob: &[0.0; 2],
                terminal: &[0.0; 2],
            })
            .unwrap_err();
        assert_eq!(err, StrideError::shape("value", 2, 3));
        assert_eq!(rollout.size(), 1);
        Ok(())
    }

    #[test]
    fn test_fetch_is_time_major() -> Result<(), StrideError> {
        let mut rollout = Rollout::build(&config(2, 3));
        add_step(&mut rollout, 0)?;
        add_step(&mut rollout, 1)?;

        let view = rollout.fetch();
        assert_eq!(view.size, 2);
        assert_eq!(view.act, &[0.0, 1.0, 10.0, 11.0]);
        assert_eq!(view.obs, &[0.0, -0.0, 1.0, -1.0, 10.0, -10.0, 11.0, -11.0]);
        Ok(())
    }

    #[test]
    fn test_flush_overwrites_old_steps() -> Result<(), StrideError> {
        let mut rollout = Rollout::build(&config(1, 2));
        for t in 0..3 {
            add_step(&mut rollout, t)?;
        }
        rollout.flush();
        add_step(&mut rollout, 7)?;
        assert_eq!(rollout.fetch().act, &[70.0]);
        Ok(())
    }

    #[test]
    fn test_segment_excludes_bootstrap_step() -> Result<(), StrideError> {
        let mut rollout = Rollout::build(&config(2, 4));
        for t in 0..5 {
            add_step(&mut rollout, t)?;
        }
        let segment = rollout.fetch_with_estimates(0.99, 0.95)?;
        assert_eq!(segment.horizon, 4);
        assert_eq!(segment.act.len(), 8);
        assert_eq!(segment.obs.len(), 16);
        assert_eq!(segment.act[6..], [30.0, 31.0]);

        // Both environments see the four-step scenario with zero values
        let returns = [3.940399, 2.9701, 1.99, 1.0];
        let advantages = [3.6569504, 2.8250403, 1.9405, 1.0];
        for t in 0..4 {
            for e in 0..2 {
                assert!((segment.returns[t * 2 + e] - returns[t]).abs() < 1e-5);
                assert!((segment.advantages[t * 2 + e] - advantages[t]).abs() < 1e-5);
            }
        }
        Ok(())
    }

    #[test]
    fn test_environments_are_estimated_independently() -> Result<(), StrideError> {
        let mut rollout = Rollout::build(&RolloutConfig::default().n_envs(2).time_horizon(2));
        let steps: [([f32; 2], [f32; 2]); 3] = [
            ([0.0, 0.0], [0.0, 0.0]),
            ([1.0, 5.0], [0.0, 1.0]),
            ([1.0, 5.0], [0.0, 0.0]),
        ];
        for (reward, terminal) in steps.iter() {
            rollout.add(RolloutStep {
                obs: &[0.0, 0.0],
                act: &[0.0, 0.0],
                reward,
                value: &[0.0, 0.0],
                log_prob: &[0.0, 0.0],
                terminal,
            })?;
        }
        let segment = rollout.fetch_with_estimates(0.5, 1.0)?;
        assert_eq!(segment.returns, vec![1.5, 5.0, 1.0, 5.0]);
        Ok(())
    }

    #[test]
    fn test_short_store_gives_empty_segment() -> Result<(), StrideError> {
        let mut rollout = Rollout::build(&config(3, 4));
        assert_eq!(rollout.fetch_with_estimates(0.99, 0.95)?.horizon, 0);
        add_step(&mut rollout, 0)?;
        let segment = rollout.fetch_with_estimates(0.99, 0.95)?;
        assert!(segment.returns.is_empty());
        assert!(batch::flatten(segment)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_flatten_keeps_fields_paired() -> Result<(), StrideError> {
        let mut rollout = Rollout::build(&config(3, 2));
        for t in 0..3 {
            add_step(&mut rollout, t)?;
        }
        let batch = batch::flatten(rollout.fetch_with_estimates(0.99, 0.95)?)?;
        assert_eq!(batch.len(), 6);
        for (row, &a) in batch.act().iter().enumerate() {
            let (t, e) = (row / 3, row % 3);
            assert_eq!(a, (10 * t + e) as f32);
            assert_eq!(batch.log_prob()[row], a);
            assert_eq!(batch.obs()[2 * row], a);
        }
        Ok(())
    }
}
