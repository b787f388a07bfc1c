//! Reinforcement learning driver for StarCraft II.
//!
//! A run is described by a [`RunConfig`]. [`run`] looks the algorithm up in
//! an [`AgentRegistry`](scv_core::AgentRegistry), typically the one returned
//! by [`registry`], then trains from scratch or resumes from a checkpoint.
//!
//! ```rust
//! use scv::{registry, run, RunConfig};
//! use scv_core::{dummy::{DummySc2Env, DummySc2EnvConfig}, ShutdownSignal};
//!
//! let registry = registry::<DummySc2Env>(DummySc2EnvConfig::default(), ShutdownSignal::new());
//! run(&RunConfig::default().algorithm("A2C"), &registry).unwrap();
//! ```
mod agents;
mod config;
mod driver;
pub use agents::registry;
pub use config::{
    CommonConfig, DdpgParams, MapConfig, PpoParams, RestoreConfig, RunConfig, SavingConfig,
};
pub use driver::run;
