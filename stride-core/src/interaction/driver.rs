//! Interaction loops.
use super::Observer;
use crate::{Controller, Env, SlotInfo, StepInput, VecEnv};
use anyhow::Result;
use log::{debug, info};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Drives a controller through an environment until it is finished.
///
/// Every interaction step runs the following sequence; nothing else is
/// called between two steps.
///
/// ```mermaid
/// graph LR
///     A[Controller::step]-->|action|B[environment step]
///     B-->C{should_update}
///     C-->|yes|D[Controller::update]
///     C-->|no|E{should_log}
///     D-->E
///     E-->|yes|F[Controller::log]
///     E-->|no|G[observers]
///     F-->G
///     G-->H{is_finished}
///     H-->|no|A
/// ```
///
/// The environment step's outcome is handed to the controller with the next
/// call to [`Controller::step`].
pub trait Driver {
    /// Runs the loop. Observers are called after each step in slice order.
    fn run<'o, C: Controller + ?Sized>(
        &mut self,
        controller: &mut C,
        observers: &mut [Box<dyn Observer<C> + 'o>],
    ) -> Result<()>;
}

/// Update, log and notify after an environment step.
fn after_step<'o, C: Controller + ?Sized>(
    controller: &mut C,
    observers: &mut [Box<dyn Observer<C> + 'o>],
) -> Result<()> {
    if controller.should_update() {
        let record = controller.update()?;
        debug!(
            "Update at step {}: {:?}",
            controller.global_step(),
            record.get_scalar("loss").ok()
        );
    }
    if controller.should_log() {
        controller.log()?;
    }
    for observer in observers.iter_mut() {
        observer.on_step(controller)?;
    }
    Ok(())
}

/// Episodic loop over a single environment.
///
/// Each episode starts from [`Env::reset`]. When an episode ends, the last
/// observation, reward and information go to [`Controller::stop_episode`]
/// instead of [`Controller::step`], and a new episode begins.
pub struct EpisodeDriver<E> {
    env: E,
}

impl<E: Env> EpisodeDriver<E> {
    /// Creates a driver owning `env`.
    pub fn new(env: E) -> Self {
        Self { env }
    }

    /// Returns the environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Returns the environment.
    pub fn into_inner(self) -> E {
        self.env
    }
}

impl<E: Env> Driver for EpisodeDriver<E> {
    fn run<'o, C: Controller + ?Sized>(
        &mut self,
        controller: &mut C,
        observers: &mut [Box<dyn Observer<C> + 'o>],
    ) -> Result<()> {
        loop {
            let mut obs = self.env.reset()?;
            let mut reward = 0f32;
            let mut info = SlotInfo::new();

            loop {
                let act = controller.step(&StepInput {
                    obs: &obs,
                    reward: &[reward],
                    is_done: &[0.0],
                    info: &info,
                })?;
                let step = self.env.step(&act)?;
                after_step(controller, observers)?;

                if step.is_done {
                    controller.stop_episode(&step.obs, step.reward, &step.info)?;
                    break;
                }
                if controller.is_finished() {
                    return Ok(());
                }

                obs = step.obs;
                reward = step.reward;
                info.clear();
                if !step.info.is_empty() {
                    info.insert(0, step.info);
                }
            }

            if controller.is_finished() {
                return Ok(());
            }
        }
    }
}

/// Unbounded loop over `N` environments stepped together.
///
/// The loop never resets individual slots; the [`VecEnv`] does.
pub struct BatchDriver<V> {
    env: V,
}

impl<V: VecEnv> BatchDriver<V> {
    /// Creates a driver owning `env`.
    pub fn new(env: V) -> Self {
        Self { env }
    }

    /// Returns the environment.
    pub fn env(&self) -> &V {
        &self.env
    }

    /// Returns the environment.
    pub fn into_inner(self) -> V {
        self.env
    }
}

impl<V: VecEnv> Driver for BatchDriver<V> {
    fn run<'o, C: Controller + ?Sized>(
        &mut self,
        controller: &mut C,
        observers: &mut [Box<dyn Observer<C> + 'o>],
    ) -> Result<()> {
        let n = self.env.n_envs();
        info!("Start batched interaction with {} environments", n);

        let mut obs = self.env.reset()?;
        let mut reward = vec![0f32; n];
        let mut is_done = vec![0f32; n];
        let mut info = SlotInfo::new();

        loop {
            let act = controller.step(&StepInput {
                obs: &obs,
                reward: &reward,
                is_done: &is_done,
                info: &info,
            })?;
            let step = self.env.step(&act)?;
            after_step(controller, observers)?;
            if controller.is_finished() {
                return Ok(());
            }

            obs = step.obs;
            reward = step.reward;
            is_done = step.is_done;
            info = step.info;
        }
    }
}
