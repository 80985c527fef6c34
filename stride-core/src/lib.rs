#![warn(missing_docs)]
//! On-policy and off-policy reinforcement learning loops.
//!
//! A [`Controller`] turns observations into actions and learns from the
//! outcomes. [`controller::PpoController`] collects fixed-length rollouts of
//! `N` environments into a [`rollout::Rollout`], estimates returns and
//! advantages with [`gae`], and replays the data in shuffled minibatches built
//! by [`batch`]. [`controller::DdpgController`] learns from a
//! [`replay_buffer::ReplayBuffer`] instead. Drivers in [`interaction`] run a
//! controller through an [`Env`] or a [`VecEnv`].
//!
//! Function approximators are external: they implement
//! [`OnPolicyApproximator`] or [`OffPolicyApproximator`] and are never
//! inspected by this crate.
pub mod batch;
pub mod controller;
pub mod error;
pub mod gae;
pub mod interaction;
pub mod record;
pub mod replay_buffer;
pub mod rollout;

mod base;
pub use base::{
    Controller, Device, Env, ExecutionContext, Inference, OffPolicyApproximator,
    OnPolicyApproximator, SlotInfo, Step, StepInput, SyncVecEnv, VecEnv, VecStep,
    EPISODE_RETURN_KEY,
};

mod config;
pub use config::ConfigFile;
