//! Replay buffer of off-policy controllers.
mod base;
mod config;
pub use base::{Experience, ReplayBuffer, TransitionBatch};
pub use config::ReplayBufferConfig;
