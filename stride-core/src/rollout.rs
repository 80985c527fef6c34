//! Transition store of on-policy controllers.
mod base;
mod config;
pub use base::{Rollout, RolloutStep, RolloutView, Segment};
pub use config::RolloutConfig;
