#![allow(dead_code)]
use anyhow::Result;
use stride_core::{
    batch::Minibatch, record::Record, replay_buffer::TransitionBatch, Env, ExecutionContext,
    Inference, OffPolicyApproximator, OnPolicyApproximator, Step,
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Episodes of fixed length with reward 1 per step and noisy observations.
pub struct Walk {
    len: usize,
    t: usize,
    rng: fastrand::Rng,
}

impl Env for Walk {
    type Config = usize;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        Ok(Self {
            len: *config,
            t: 0,
            rng: fastrand::Rng::with_seed(seed as u64),
        })
    }

    fn reset(&mut self) -> Result<Vec<f32>> {
        self.t = 0;
        Ok(vec![0.0, self.rng.f32()])
    }

    fn step(&mut self, act: &[f32]) -> Result<Step> {
        anyhow::ensure!(act.len() == 1, "expected a single action, got {}", act.len());
        self.t += 1;
        let obs = vec![self.t as f32, self.rng.f32()];
        Ok(Step::new(obs, 1.0, self.t == self.len, Record::empty()))
    }
}

pub const OBS_DIM: usize = 2;

/// Constant stochastic policy counting gradient steps.
#[derive(Default)]
pub struct ConstantPolicy {
    pub context: ExecutionContext,
    pub n_infers: usize,
    pub n_updates: usize,
    pub minibatch_lens: Vec<usize>,
}

impl OnPolicyApproximator for ConstantPolicy {
    fn context(&self) -> &ExecutionContext {
        &self.context
    }

    fn infer(&mut self, obs: &[f32]) -> Result<Inference> {
        self.n_infers += 1;
        let n = obs.len() / OBS_DIM;
        Ok(Inference {
            act: vec![0.5; n],
            value: vec![0.0; n],
            log_prob: vec![-0.7; n],
        })
    }

    fn update(&mut self, minibatch: &Minibatch<'_>) -> Result<f32> {
        self.n_updates += 1;
        self.minibatch_lens.push(minibatch.len());
        Ok(1.0)
    }
}

/// Constant deterministic policy counting gradient steps.
#[derive(Default)]
pub struct ConstantActor {
    pub context: ExecutionContext,
    pub n_updates: usize,
}

impl OffPolicyApproximator for ConstantActor {
    fn context(&self) -> &ExecutionContext {
        &self.context
    }

    fn infer(&mut self, obs: &[f32]) -> Result<Vec<f32>> {
        Ok(vec![0.5; obs.len() / OBS_DIM])
    }

    fn update(&mut self, batch: &TransitionBatch) -> Result<(f32, f32)> {
        self.n_updates += 1;
        Ok((batch.len() as f32, 0.0))
    }
}
