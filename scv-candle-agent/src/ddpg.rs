//! DDPG agent.
//!
//! The actor outputs one score per game function followed by a screen
//! point, all squashed into `[-1, 1]`. The function with the highest score
//! among the available ones is called at the point. The critic scores the
//! concatenation of the encoded observation and that action vector.
mod base;
mod config;
pub use base::Ddpg;
pub use config::DdpgConfig;
