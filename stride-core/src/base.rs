//! Core functionalities.
mod approximator;
mod controller;
mod env;
mod step;
mod vec_env;
pub use approximator::{
    Device, ExecutionContext, Inference, OffPolicyApproximator, OnPolicyApproximator,
};
pub use controller::Controller;
pub use env::{Env, VecEnv};
pub use step::{SlotInfo, Step, StepInput, VecStep, EPISODE_RETURN_KEY};
pub use vec_env::SyncVecEnv;
