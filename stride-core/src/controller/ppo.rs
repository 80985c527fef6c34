//! Proximal policy optimization.
use super::{PpoConfig, Schedule};
use crate::{
    batch,
    error::StrideError,
    record::{MetricKind, Metrics, Record, RecordValue, Recorder},
    rollout::{Rollout, RolloutStep},
    Controller, OnPolicyApproximator, StepInput, EPISODE_RETURN_KEY,
};
use anyhow::Result;
use log::{debug, info, warn};
use rand::{rngs::StdRng, SeedableRng};

/// On-policy controller collecting `T + 1` steps of `N` environments before
/// each update.
///
/// Rewards and terminal flags given to [`Controller::step`] belong to the
/// previous action, so they are stored one step after the observation they
/// follow. This is the alignment expected by [`crate::gae`].
///
/// With a single environment driven episode by episode, the last reward of an
/// episode arrives through [`Controller::stop_episode`]. It is held back and
/// stored with the first observation of the next episode, flagged terminal.
/// With more than one environment, `stop_episode` does nothing and episode
/// boundaries are read from the `is_done` flags of each slot.
pub struct PpoController<A> {
    approximator: A,
    rollout: Rollout,
    metrics: Metrics,
    schedule: Schedule,
    n_envs: usize,
    epochs: usize,
    minibatch_size: usize,
    gamma: f32,
    lambda: f32,
    rng: StdRng,
    global_step: usize,
    episode_returns: Vec<f32>,
    pending_terminal: Option<f32>,
}

impl<A: OnPolicyApproximator> PpoController<A> {
    /// Builds a controller.
    ///
    /// Metrics are written to `recorder`; the configuration is written once
    /// as hyperparameters.
    pub fn build(config: &PpoConfig, approximator: A, recorder: Box<dyn Recorder>) -> Result<Self> {
        let mut metrics = Metrics::new(recorder);
        metrics.register("step", MetricKind::Single);
        metrics.register("loss", MetricKind::Queue);
        metrics.register("reward", MetricKind::Queue);
        metrics.log_parameters(config)?;

        let n_envs = config.rollout.n_envs;
        info!(
            "Build PPO controller: {} envs, time horizon {}, device {:?}",
            n_envs,
            config.rollout.time_horizon,
            approximator.context().device
        );

        Ok(Self {
            approximator,
            rollout: Rollout::build(&config.rollout),
            metrics,
            schedule: Schedule::new(&config.schedule),
            n_envs,
            epochs: config.epochs,
            minibatch_size: config.minibatch_size,
            gamma: config.gamma,
            lambda: config.lambda,
            rng: StdRng::seed_from_u64(config.seed),
            global_step: 0,
            episode_returns: vec![0.0; n_envs],
            pending_terminal: None,
        })
    }

    /// Returns the transition store.
    pub fn rollout(&self) -> &Rollout {
        &self.rollout
    }

    /// Returns the function approximator.
    pub fn approximator(&self) -> &A {
        &self.approximator
    }

    /// Returns the function approximator.
    pub fn approximator_mut(&mut self) -> &mut A {
        &mut self.approximator
    }

    /// Returns the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    fn finish_episode(&mut self, slot: usize, info: Option<&Record>) -> Result<(), StrideError> {
        let ret = info
            .and_then(|info| info.get_scalar(EPISODE_RETURN_KEY).ok())
            .unwrap_or(self.episode_returns[slot]);
        debug!("Episode finished in slot {}, return = {}", slot, ret);
        self.episode_returns[slot] = 0.0;
        self.metrics.add("reward", ret)
    }
}

impl<A: OnPolicyApproximator> Controller for PpoController<A> {
    fn step(&mut self, input: &StepInput<'_>) -> Result<Vec<f32>> {
        let n = self.n_envs;
        StrideError::check_len("reward", n, input.reward.len())?;
        StrideError::check_len("is_done", n, input.is_done.len())?;

        let inference = self.approximator.infer(input.obs)?;

        let mut reward = input.reward.to_vec();
        let mut terminal = input.is_done.to_vec();
        if let Some(r) = self.pending_terminal {
            reward[0] = r;
            terminal[0] = 1.0;
        }

        self.rollout.add(RolloutStep {
            obs: input.obs,
            act: &inference.act,
            reward: &reward,
            value: &inference.value,
            log_prob: &inference.log_prob,
            terminal: &terminal,
        })?;
        self.pending_terminal = None;

        self.global_step += n;
        self.metrics.add("step", n as f32)?;

        for slot in 0..n {
            self.episode_returns[slot] += input.reward[slot];
            if input.is_done[slot] != 0.0 {
                self.finish_episode(slot, input.info.get(&slot))?;
            }
        }

        Ok(inference.act)
    }

    fn should_update(&self) -> bool {
        self.rollout.is_full()
    }

    fn update(&mut self) -> Result<Record> {
        if !self.should_update() {
            return Err(StrideError::PreconditionViolation(format!(
                "update requires {} stored steps, found {}",
                self.rollout.capacity(),
                self.rollout.size()
            ))
            .into());
        }

        let segment = self.rollout.fetch_with_estimates(self.gamma, self.lambda)?;
        self.rollout.flush();

        let mut batch = batch::flatten(segment)?;
        let size = batch.len();
        let mut loss_sum = 0f32;
        let mut n_minibatches = 0usize;
        let mut dropped = 0usize;

        for _ in 0..self.epochs {
            batch::shuffle(&mut batch, size, &mut self.rng)?;
            let minibatches = batch::minibatches(&batch, self.minibatch_size);
            dropped = minibatches.dropped();
            for minibatch in minibatches {
                loss_sum += self.approximator.update(&minibatch)?;
                n_minibatches += 1;
            }
        }

        let loss = if n_minibatches > 0 {
            loss_sum / n_minibatches as f32
        } else {
            if self.epochs == 0 {
                warn!("Update with 0 epochs, the approximator was not trained");
            } else {
                warn!(
                    "No minibatch of size {} in a batch of {} transitions",
                    self.minibatch_size, size
                );
            }
            0.0
        };
        debug!(
            "Update at step {}: loss = {}, {} minibatches, {} transitions dropped per epoch",
            self.global_step, loss, n_minibatches, dropped
        );
        self.metrics.add("loss", loss)?;

        Ok(Record::from_slice(&[
            ("loss", RecordValue::Scalar(loss)),
            ("n_minibatches", RecordValue::Scalar(n_minibatches as f32)),
            ("dropped", RecordValue::Scalar(dropped as f32)),
        ]))
    }

    fn stop_episode(&mut self, _obs: &[f32], reward: f32, info: &Record) -> Result<()> {
        if self.n_envs != 1 {
            return Ok(());
        }
        self.episode_returns[0] += reward;
        self.finish_episode(0, Some(info))?;
        self.pending_terminal = Some(reward);
        Ok(())
    }

    fn act(&mut self, obs: &[f32]) -> Result<Vec<f32>> {
        Ok(self.approximator.infer(obs)?.act)
    }

    fn global_step(&self) -> usize {
        self.global_step
    }

    fn metrics_mut(&mut self) -> &mut Metrics {
        &mut self.metrics
    }

    fn should_log(&mut self) -> bool {
        self.schedule.should_log(self.global_step)
    }

    fn log(&mut self) -> Result<()> {
        let step = self.global_step;
        self.metrics.log_metric("reward", step)?;
        self.metrics.log_metric("loss", step)?;
        Ok(())
    }

    fn should_eval(&mut self) -> bool {
        self.schedule.should_eval(self.global_step)
    }

    fn is_finished(&self) -> bool {
        self.schedule.is_finished(self.global_step)
    }
}
