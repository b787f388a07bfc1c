//! PPO agent.
//!
//! The actor outputs the logits of three categorical distributions: the
//! game function, with unavailable functions masked out, and the `x` and
//! `y` coordinates of the screen point. The critic estimates the value of
//! the encoded observation.
mod base;
mod buffer;
mod config;
pub use base::Ppo;
pub use buffer::{discount_cumsum, gae, PpoBatch, PpoStep, TrajectoryBuffer};
pub use config::PpoConfig;
