//! Deep deterministic policy gradient.
use super::{DdpgConfig, Schedule};
use crate::{
    error::StrideError,
    record::{MetricKind, Metrics, Record, RecordValue, Recorder},
    replay_buffer::{Experience, ReplayBuffer},
    Controller, OffPolicyApproximator, StepInput, EPISODE_RETURN_KEY,
};
use anyhow::Result;
use log::{debug, info};

/// Off-policy controller for a single environment.
///
/// The observation and action of the previous call are kept until the outcome
/// of the action is known, then pushed to the replay buffer as a complete
/// transition `(o_t, a_t, r_t+1, o_t+1, done_t+1)`. The last transition of an
/// episode is pushed by [`Controller::stop_episode`].
pub struct DdpgController<A> {
    approximator: A,
    buffer: ReplayBuffer,
    metrics: Metrics,
    schedule: Schedule,
    batch_size: usize,
    global_step: usize,
    prev: Option<(Vec<f32>, Vec<f32>)>,
    episode_return: f32,
}

impl<A: OffPolicyApproximator> DdpgController<A> {
    /// Builds a controller.
    pub fn build(
        config: &DdpgConfig,
        approximator: A,
        recorder: Box<dyn Recorder>,
    ) -> Result<Self> {
        let mut metrics = Metrics::new(recorder);
        metrics.register("step", MetricKind::Single);
        metrics.register("critic_loss", MetricKind::Queue);
        metrics.register("actor_loss", MetricKind::Queue);
        metrics.register("reward", MetricKind::Queue);
        metrics.log_parameters(config)?;

        info!(
            "Build DDPG controller: batch size {}, replay buffer capacity {}, device {:?}",
            config.batch_size,
            config.replay_buffer.capacity,
            approximator.context().device
        );

        Ok(Self {
            approximator,
            buffer: ReplayBuffer::build(&config.replay_buffer, config.obs_dim, config.act_dim),
            metrics,
            schedule: Schedule::new(&config.schedule),
            batch_size: config.batch_size,
            global_step: 0,
            prev: None,
            episode_return: 0.0,
        })
    }

    /// Returns the replay buffer.
    pub fn buffer(&self) -> &ReplayBuffer {
        &self.buffer
    }

    /// Returns the function approximator.
    pub fn approximator(&self) -> &A {
        &self.approximator
    }

    /// Returns the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    fn finish_episode(&mut self, info: Option<&Record>) -> Result<(), StrideError> {
        let ret = info
            .and_then(|info| info.get_scalar(EPISODE_RETURN_KEY).ok())
            .unwrap_or(self.episode_return);
        debug!("Episode finished, return = {}", ret);
        self.episode_return = 0.0;
        self.metrics.add("reward", ret)
    }
}

impl<A: OffPolicyApproximator> Controller for DdpgController<A> {
    fn step(&mut self, input: &StepInput<'_>) -> Result<Vec<f32>> {
        StrideError::check_len("reward", 1, input.reward.len())?;
        StrideError::check_len("is_done", 1, input.is_done.len())?;
        let reward = input.reward[0];
        let is_done = input.is_done[0] != 0.0;

        if let Some((obs, act)) = self.prev.take() {
            // A terminated slot already carries the next episode's observation,
            // which the terminal flag masks out of the target
            self.buffer.push(&Experience {
                obs,
                act,
                reward,
                next_obs: input.obs.to_vec(),
                is_terminated: if is_done { 1.0 } else { 0.0 },
            })?;
        }
        self.episode_return += reward;
        if is_done {
            self.finish_episode(input.info.get(&0))?;
        }

        let act = self.approximator.infer(input.obs)?;
        self.prev = Some((input.obs.to_vec(), act.clone()));
        self.global_step += 1;
        self.metrics.add("step", 1.0)?;
        Ok(act)
    }

    fn should_update(&self) -> bool {
        self.batch_size > 0 && self.buffer.len() >= self.batch_size
    }

    fn update(&mut self) -> Result<Record> {
        if !self.should_update() {
            return Err(StrideError::PreconditionViolation(format!(
                "update requires {} transitions, found {}",
                self.batch_size,
                self.buffer.len()
            ))
            .into());
        }

        let batch = self.buffer.batch(self.batch_size)?;
        let (critic_loss, actor_loss) = self.approximator.update(&batch)?;
        self.metrics.add("critic_loss", critic_loss)?;
        self.metrics.add("actor_loss", actor_loss)?;

        Ok(Record::from_slice(&[
            ("critic_loss", RecordValue::Scalar(critic_loss)),
            ("actor_loss", RecordValue::Scalar(actor_loss)),
        ]))
    }

    fn stop_episode(&mut self, obs: &[f32], reward: f32, info: &Record) -> Result<()> {
        if let Some((prev_obs, act)) = self.prev.take() {
            self.buffer.push(&Experience {
                obs: prev_obs,
                act,
                reward,
                next_obs: obs.to_vec(),
                is_terminated: 1.0,
            })?;
        }
        self.episode_return += reward;
        self.finish_episode(Some(info))?;
        Ok(())
    }

    fn act(&mut self, obs: &[f32]) -> Result<Vec<f32>> {
        self.approximator.infer(obs)
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
        for name in ["reward", "critic_loss", "actor_loss"].iter() {
            self.metrics.log_metric(name, step)?;
        }
        Ok(())
    }

    fn should_eval(&mut self) -> bool {
        self.schedule.should_eval(self.global_step)
    }

    fn is_finished(&self) -> bool {
        self.schedule.is_finished(self.global_step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        record::NullRecorder, replay_buffer::ReplayBufferConfig, replay_buffer::TransitionBatch,
        ExecutionContext, SlotInfo,
    };

    /// Acts with the negated observation and counts updates.
    #[derive(Default)]
    struct Probe {
        context: ExecutionContext,
        n_updates: usize,
        last_batch_len: usize,
    }

    impl OffPolicyApproximator for Probe {
        fn context(&self) -> &ExecutionContext {
            &self.context
        }

        fn infer(&mut self, obs: &[f32]) -> Result<Vec<f32>> {
            Ok(obs.iter().map(|x| -x).collect())
        }

        fn update(&mut self, batch: &TransitionBatch) -> Result<(f32, f32)> {
            self.n_updates += 1;
            self.last_batch_len = batch.len();
            Ok((1.0, -1.0))
        }
    }

    fn build(batch_size: usize) -> DdpgController<Probe> {
        let config = DdpgConfig::default()
            .batch_size(batch_size)
            .replay_buffer(ReplayBufferConfig::default().capacity(100));
        DdpgController::build(&config, Probe::default(), Box::new(NullRecorder::default())).unwrap()
    }

    fn step(ctrl: &mut DdpgController<Probe>, obs: f32, reward: f32, is_done: f32) -> Result<Vec<f32>> {
        ctrl.step(&StepInput {
            obs: &[obs],
            reward: &[reward],
            is_done: &[is_done],
            info: &SlotInfo::new(),
        })
    }

    #[test]
    fn test_transitions_pair_consecutive_steps() -> Result<()> {
        let mut ctrl = build(2);
        assert_eq!(step(&mut ctrl, 1.0, 0.0, 0.0)?, vec![-1.0]);
        assert!(ctrl.buffer().is_empty());

        step(&mut ctrl, 2.0, 0.5, 0.0)?;
        ctrl.stop_episode(&[3.0], 1.5, &Record::empty())?;
        assert_eq!(ctrl.buffer().len(), 2);
        assert_eq!(ctrl.buffer().sum_rewards(), 2.0);
        assert_eq!(ctrl.buffer().num_terminated_flags(), 1);
        assert_eq!(ctrl.metrics().get("reward")?, Some(2.0));

        // No transition spans two episodes
        step(&mut ctrl, 0.0, 0.0, 0.0)?;
        assert_eq!(ctrl.buffer().len(), 2);
        assert_eq!(ctrl.global_step(), 3);
        Ok(())
    }

    #[test]
    fn test_update_after_batch_size_transitions() -> Result<()> {
        let mut ctrl = build(3);
        for i in 0..3 {
            step(&mut ctrl, i as f32, 1.0, 0.0)?;
            assert!(!ctrl.should_update());
        }
        let err = ctrl.update().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StrideError>(),
            Some(StrideError::PreconditionViolation(_))
        ));

        step(&mut ctrl, 3.0, 1.0, 0.0)?;
        assert!(ctrl.should_update());
        let record = ctrl.update()?;
        assert_eq!(record.get_scalar("critic_loss")?, 1.0);
        assert_eq!(record.get_scalar("actor_loss")?, -1.0);
        assert_eq!(ctrl.approximator().n_updates, 1);
        assert_eq!(ctrl.approximator().last_batch_len, 3);
        // Replay keeps the data
        assert!(ctrl.should_update());
        Ok(())
    }

    #[test]
    fn test_done_flag_ends_episode() -> Result<()> {
        let mut ctrl = build(8);
        step(&mut ctrl, 0.0, 0.0, 0.0)?;
        step(&mut ctrl, 1.0, 2.0, 0.0)?;
        step(&mut ctrl, 0.0, 3.0, 1.0)?;
        assert_eq!(ctrl.buffer().num_terminated_flags(), 1);
        assert_eq!(ctrl.metrics().get("reward")?, Some(5.0));
        Ok(())
    }

    #[test]
    fn test_single_env_only() {
        let mut ctrl = build(8);
        let err = ctrl
            .step(&StepInput {
                obs: &[0.0, 0.0],
                reward: &[0.0, 0.0],
                is_done: &[0.0, 0.0],
                info: &SlotInfo::new(),
            })
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<StrideError>(),
            Some(&StrideError::shape("reward", 1, 2))
        );
    }
}
