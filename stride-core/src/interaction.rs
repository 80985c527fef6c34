//! Interaction between controllers and environments.
//!
//! A [`Driver`] owns an environment and runs a controller through it.
//! [`EpisodeDriver`] loops over episodes of a single [`Env`](crate::Env),
//! [`BatchDriver`] steps a [`VecEnv`](crate::VecEnv) without ever resetting
//! it explicitly. [`Observer`]s registered with a driver run after every step;
//! [`EvalObserver`] uses this to evaluate the controller periodically.
//!
//! [`interact`] and [`batch_interact`] assemble the usual setup: a training
//! driver, an optional evaluation overlay and caller-supplied observers.
mod driver;
mod observer;
use crate::{controller::EvalConfig, Controller, Env, VecEnv};
use anyhow::Result;
pub use driver::{BatchDriver, Driver, EpisodeDriver};
pub use observer::{EvalObserver, Observer, EVAL_REWARD_KEY};

/// Trains `controller` episode by episode on `env` until it is finished.
///
/// If `eval_env` is given, the controller is evaluated on it whenever
/// [`Controller::should_eval`] fires. The evaluation runs before `observers`.
pub fn interact<'o, E, C>(
    env: E,
    controller: &mut C,
    eval_env: Option<E>,
    eval_config: &EvalConfig,
    observers: Vec<Box<dyn Observer<C> + 'o>>,
) -> Result<E>
where
    E: Env + 'o,
    C: Controller,
{
    let mut all: Vec<Box<dyn Observer<C> + 'o>> = Vec::new();
    if let Some(eval_env) = eval_env {
        all.push(Box::new(EvalObserver::new(
            EpisodeDriver::new(eval_env),
            eval_config.n_episodes,
        )));
    }
    all.extend(observers);

    let mut driver = EpisodeDriver::new(env);
    driver.run(controller, &mut all)?;
    Ok(driver.into_inner())
}

/// Trains `controller` on `N` environments stepped together until it is
/// finished.
///
/// If `eval_env` is given, the controller is evaluated on it whenever
/// [`Controller::should_eval`] fires. The evaluation runs before `observers`.
pub fn batch_interact<'o, V, C>(
    env: V,
    controller: &mut C,
    eval_env: Option<V>,
    eval_config: &EvalConfig,
    observers: Vec<Box<dyn Observer<C> + 'o>>,
) -> Result<V>
where
    V: VecEnv + 'o,
    C: Controller,
{
    let mut all: Vec<Box<dyn Observer<C> + 'o>> = Vec::new();
    if let Some(eval_env) = eval_env {
        all.push(Box::new(EvalObserver::new(
            BatchDriver::new(eval_env),
            eval_config.n_episodes,
        )));
    }
    all.extend(observers);

    let mut driver = BatchDriver::new(env);
    driver.run(controller, &mut all)?;
    Ok(driver.into_inner())
}
