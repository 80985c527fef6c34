mod common;
use anyhow::Result;
use common::{init_logger, ConstantPolicy, Walk, OBS_DIM};
use std::{cell::Cell, rc::Rc};
use stride_core::{
    controller::{EvalConfig, PpoConfig, PpoController, ScheduleConfig},
    interaction::{self, Observer, EVAL_REWARD_KEY},
    record::BufferedRecorder,
    rollout::RolloutConfig,
    Controller, Env, SyncVecEnv,
};

fn ppo_config(n_envs: usize, time_horizon: usize) -> PpoConfig {
    PpoConfig::default().rollout(
        RolloutConfig::default()
            .n_envs(n_envs)
            .time_horizon(time_horizon)
            .obs_dim(OBS_DIM),
    )
}

fn eval_rewards(recorder: &BufferedRecorder) -> Vec<f32> {
    recorder
        .records()
        .iter()
        .filter_map(|r| r.get_scalar(EVAL_REWARD_KEY).ok())
        .collect()
}

#[test]
fn test_episodic_training() -> Result<()> {
    init_logger();
    let config = ppo_config(1, 8).epochs(2).minibatch_size(4).schedule(
        ScheduleConfig::default()
            .final_steps(40)
            .log_interval(10)
            .eval_interval(20),
    );
    let recorder = BufferedRecorder::new();
    let mut ctrl = PpoController::build(&config, ConstantPolicy::default(), Box::new(recorder.clone()))?;

    let n_calls = Rc::new(Cell::new(0usize));
    let counter = n_calls.clone();
    let observers: Vec<Box<dyn Observer<PpoController<ConstantPolicy>>>> =
        vec![Box::new(move |_: &mut PpoController<ConstantPolicy>| -> Result<()> {
            counter.set(counter.get() + 1);
            Ok(())
        })];

    interaction::interact(
        Walk::build(&5, 0)?,
        &mut ctrl,
        Some(Walk::build(&5, 100)?),
        &EvalConfig::default().n_episodes(3),
        observers,
    )?;

    assert_eq!(ctrl.global_step(), 40);
    assert_eq!(n_calls.get(), 40);

    // Updates at steps 9, 18, 27 and 36, each with 2 epochs of 2 minibatches
    assert_eq!(ctrl.approximator().n_updates, 16);
    assert!(ctrl.approximator().minibatch_lens.iter().all(|&n| n == 4));
    assert_eq!(ctrl.metrics().count("loss")?, 4);
    assert_eq!(ctrl.rollout().size(), 4);

    assert_eq!(ctrl.metrics().count("reward")?, 8);
    assert_eq!(ctrl.metrics().get("reward")?, Some(5.0));

    assert_eq!(eval_rewards(&recorder), vec![5.0, 5.0]);
    Ok(())
}

#[test]
fn test_batched_training() -> Result<()> {
    init_logger();
    let config = ppo_config(4, 5).epochs(1).minibatch_size(8).schedule(
        ScheduleConfig::default()
            .final_steps(48)
            .log_interval(0)
            .eval_interval(24),
    );
    let recorder = BufferedRecorder::new();
    let mut ctrl = PpoController::build(&config, ConstantPolicy::default(), Box::new(recorder.clone()))?;

    interaction::batch_interact(
        SyncVecEnv::<Walk>::build(&3, 0, 4)?,
        &mut ctrl,
        Some(SyncVecEnv::<Walk>::build(&3, 100, 2)?),
        &EvalConfig::default().n_episodes(4),
        vec![],
    )?;

    assert_eq!(ctrl.global_step(), 48);

    // 20 transitions per update give 2 minibatches of 8 and drop 4
    assert_eq!(ctrl.approximator().n_updates, 4);
    assert_eq!(ctrl.rollout().size(), 0);

    // Episodes ending on the last environment step are never reported
    assert_eq!(ctrl.metrics().count("reward")?, 12);
    assert_eq!(ctrl.metrics().get("reward")?, Some(3.0));

    assert_eq!(eval_rewards(&recorder), vec![3.0, 3.0]);
    Ok(())
}

#[test]
fn test_slot_mismatch_stops_training() -> Result<()> {
    init_logger();
    // The controller expects two slots, the environment has one
    let config = ppo_config(2, 4);
    let mut ctrl = PpoController::build(&config, ConstantPolicy::default(), Box::new(BufferedRecorder::new()))?;
    let env = SyncVecEnv::<Walk>::build(&3, 0, 1)?;

    let result = interaction::batch_interact(env, &mut ctrl, None, &EvalConfig::default(), vec![]);
    assert!(result.is_err());
    assert_eq!(ctrl.global_step(), 0);
    Ok(())
}
