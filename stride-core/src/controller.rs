//! Controllers for training and evaluation.
//!
//! A controller implements [`Controller`](crate::Controller) and is driven by
//! an interaction loop in [`crate::interaction`]. [`PpoController`] learns
//! on-policy from fixed-length rollouts, [`DdpgController`] off-policy from a
//! replay buffer, and [`EvalController`] runs the policy of either without
//! learning.
mod config;
mod ddpg;
mod eval;
mod ppo;
mod schedule;
pub use config::{DdpgConfig, EvalConfig, PpoConfig};
pub use ddpg::DdpgController;
pub use eval::EvalController;
pub use ppo::PpoController;
pub use schedule::{Schedule, ScheduleConfig};
