//! Observers invoked after each interaction step.
use super::Driver;
use crate::{
    controller::EvalController,
    record::MetricKind,
    Controller,
};
use anyhow::Result;
use log::info;

/// Key of the mean evaluation return in the training controller's metrics.
pub const EVAL_REWARD_KEY: &str = "eval_reward";

/// Called by a [`Driver`] after every interaction step, in registration order.
pub trait Observer<C: ?Sized> {
    /// Inspects or acts on the controller after a step.
    fn on_step(&mut self, controller: &mut C) -> Result<()>;
}

impl<C: ?Sized, F> Observer<C> for F
where
    F: FnMut(&mut C) -> Result<()>,
{
    fn on_step(&mut self, controller: &mut C) -> Result<()> {
        self(controller)
    }
}

/// Runs an evaluation whenever [`Controller::should_eval`] fires.
///
/// The evaluation is driven to completion by its own driver, which owns a
/// separate environment, before control returns to the training loop. The
/// mean return is added to the training controller's metrics under
/// [`EVAL_REWARD_KEY`] and logged at the current global step.
pub struct EvalObserver<D> {
    driver: D,
    n_episodes: usize,
    last: Option<f32>,
}

impl<D: Driver> EvalObserver<D> {
    /// Creates an observer running `n_episodes` episodes per evaluation.
    pub fn new(driver: D, n_episodes: usize) -> Self {
        Self {
            driver,
            n_episodes,
            last: None,
        }
    }

    /// Mean return of the latest evaluation.
    pub fn last_eval_reward(&self) -> Option<f32> {
        self.last
    }

    /// Returns the driver of evaluation runs.
    pub fn driver(&self) -> &D {
        &self.driver
    }
}

impl<C: Controller + ?Sized, D: Driver> Observer<C> for EvalObserver<D> {
    fn on_step(&mut self, controller: &mut C) -> Result<()> {
        if !controller.should_eval() {
            return Ok(());
        }

        let step = controller.global_step();
        info!("Start evaluation at step {}", step);
        let mean = {
            let mut eval = EvalController::new(controller, self.n_episodes);
            let mut observers: Vec<Box<dyn Observer<EvalController<'_, C>>>> = Vec::new();
            self.driver.run(&mut eval, &mut observers)?;
            eval.mean_return()
        };

        match mean {
            Some(mean) => {
                info!("Evaluation at step {}: mean return = {}", step, mean);
                let metrics = controller.metrics_mut();
                metrics.register(EVAL_REWARD_KEY, MetricKind::Queue);
                metrics.add(EVAL_REWARD_KEY, mean)?;
                metrics.log_metric(EVAL_REWARD_KEY, step)?;
                self.last = Some(mean);
            }
            None => info!("Evaluation at step {} finished no episode", step),
        }
        Ok(())
    }
}
