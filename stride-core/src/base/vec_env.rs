//! Synchronous vectorization of single environments.
use super::{Env, SlotInfo, VecEnv, VecStep, EPISODE_RETURN_KEY};
use crate::{error::StrideError, record::RecordValue};
use anyhow::Result;
use log::trace;

/// Runs `N` environments one after another on the calling thread.
///
/// Terminated slots are reset immediately; the cumulative reward of the
/// finished episode is reported under [`EPISODE_RETURN_KEY`] in the slot's
/// information.
pub struct SyncVecEnv<E: Env> {
    envs: Vec<E>,
    returns: Vec<f32>,
}

impl<E: Env> SyncVecEnv<E> {
    /// Builds `n_envs` environments, the `i`-th one with seed `seed + i`.
    pub fn build(config: &E::Config, seed: i64, n_envs: usize) -> Result<Self> {
        let envs = (0..n_envs)
            .map(|i| E::build(config, seed + i as i64))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_envs(envs))
    }

    /// Wraps already constructed environments.
    pub fn from_envs(envs: Vec<E>) -> Self {
        let returns = vec![0.0; envs.len()];
        Self { envs, returns }
    }
}

impl<E: Env> VecEnv for SyncVecEnv<E> {
    fn n_envs(&self) -> usize {
        self.envs.len()
    }

    fn reset(&mut self) -> Result<Vec<f32>> {
        let mut obs = Vec::new();
        for (env, r) in self.envs.iter_mut().zip(self.returns.iter_mut()) {
            obs.extend(env.reset()?);
            *r = 0.0;
        }
        Ok(obs)
    }

    fn step(&mut self, act: &[f32]) -> Result<VecStep> {
        let n_envs = self.envs.len();
        if n_envs == 0 || act.len() % n_envs != 0 {
            return Err(StrideError::shape("act", n_envs, act.len()).into());
        }
        let act_dim = act.len() / n_envs;

        let mut obs = Vec::new();
        let mut reward = Vec::with_capacity(n_envs);
        let mut is_done = Vec::with_capacity(n_envs);
        let mut info = SlotInfo::new();

        for (i, env) in self.envs.iter_mut().enumerate() {
            let step = env.step(&act[i * act_dim..(i + 1) * act_dim])?;
            self.returns[i] += step.reward;
            reward.push(step.reward);

            if step.is_done {
                trace!("Slot {} finished an episode, return = {}", i, self.returns[i]);
                let mut slot_info = step.info;
                slot_info.insert(EPISODE_RETURN_KEY, RecordValue::Scalar(self.returns[i]));
                info.insert(i, slot_info);
                self.returns[i] = 0.0;
                is_done.push(1.0);
                obs.extend(env.reset()?);
            } else {
                if !step.info.is_empty() {
                    info.insert(i, step.info);
                }
                is_done.push(0.0);
                obs.extend(step.obs);
            }
        }

        Ok(VecStep {
            obs,
            reward,
            is_done,
            info,
        })
    }
}
