//! Evaluation of a trained controller.
use crate::{
    error::StrideError,
    record::{MetricKind, Metrics, NullRecorder, Record},
    Controller, StepInput, EPISODE_RETURN_KEY,
};
use anyhow::Result;

/// Runs the policy of another controller without learning.
///
/// Actions come from [`Controller::act`] of the borrowed controller, so
/// nothing is stored and its global step does not advance. The evaluation is
/// finished once `n_episodes` episodes have ended, counted from per-slot
/// `is_done` flags and from [`Controller::stop_episode`].
pub struct EvalController<'a, C: ?Sized> {
    inner: &'a mut C,
    n_episodes: usize,
    running: Vec<f32>,
    returns: Vec<f32>,
    steps: usize,
    metrics: Metrics,
}

impl<'a, C: Controller + ?Sized> EvalController<'a, C> {
    /// Evaluates `inner` over `n_episodes` episodes.
    pub fn new(inner: &'a mut C, n_episodes: usize) -> Self {
        let mut metrics = Metrics::new(Box::new(NullRecorder::default()));
        metrics.register("reward", MetricKind::Queue);
        Self {
            inner,
            n_episodes,
            running: Vec::new(),
            returns: Vec::new(),
            steps: 0,
            metrics,
        }
    }

    /// Returns of the finished episodes in the order they ended.
    pub fn episode_returns(&self) -> &[f32] {
        &self.returns
    }

    /// Mean return over the finished episodes, `None` if none has finished.
    pub fn mean_return(&self) -> Option<f32> {
        if self.returns.is_empty() {
            None
        } else {
            Some(self.returns.iter().sum::<f32>() / self.returns.len() as f32)
        }
    }

    fn finish_episode(&mut self, slot: usize, info: Option<&Record>) -> Result<(), StrideError> {
        let ret = info
            .and_then(|info| info.get_scalar(EPISODE_RETURN_KEY).ok())
            .unwrap_or(self.running[slot]);
        self.running[slot] = 0.0;
        self.returns.push(ret);
        self.metrics.add("reward", ret)
    }
}

impl<'a, C: Controller + ?Sized> Controller for EvalController<'a, C> {
    fn step(&mut self, input: &StepInput<'_>) -> Result<Vec<f32>> {
        let n = input.n_envs();
        StrideError::check_len("is_done", n, input.is_done.len())?;
        if self.running.len() != n {
            self.running = vec![0.0; n];
        }

        for slot in 0..n {
            self.running[slot] += input.reward[slot];
            if input.is_done[slot] != 0.0 && !self.is_finished() {
                self.finish_episode(slot, input.info.get(&slot))?;
            }
        }
        self.steps += n;
        self.inner.act(input.obs)
    }

    fn should_update(&self) -> bool {
        false
    }

    fn update(&mut self) -> Result<Record> {
        Err(StrideError::PreconditionViolation("evaluation never updates".to_string()).into())
    }

    fn stop_episode(&mut self, _obs: &[f32], reward: f32, info: &Record) -> Result<()> {
        if self.running.is_empty() {
            self.running.push(0.0);
        }
        self.running[0] += reward;
        self.finish_episode(0, Some(info))?;
        Ok(())
    }

    fn act(&mut self, obs: &[f32]) -> Result<Vec<f32>> {
        self.inner.act(obs)
    }

    fn global_step(&self) -> usize {
        self.steps
    }

    fn metrics_mut(&mut self) -> &mut Metrics {
        &mut self.metrics
    }

    fn should_log(&mut self) -> bool {
        false
    }

    fn log(&mut self) -> Result<()> {
        Ok(())
    }

    fn should_eval(&mut self) -> bool {
        false
    }

    fn is_finished(&self) -> bool {
        self.returns.len() >= self.n_episodes
    }
}
