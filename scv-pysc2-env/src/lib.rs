//! A wrapper of the StarCraft II learning environment
//! [pysc2](https://github.com/deepmind/pysc2) on Python.
//!
//! [`Sc2Env`] builds `pysc2.env.sc2_env.SC2Env` through
//! [`PyO3`](https://github.com/PyO3/pyo3) and converts its timesteps and
//! specs into the [`scv_core::sc2`] data model. Actions are converted to
//! `pysc2.lib.actions.FunctionCall` objects.
//!
//! The Python interpreter must have pysc2 installed and the game binary
//! must be reachable through `SC2PATH`.
mod base;
mod config;
mod convert;
pub use base::Sc2Env;
pub use config::Sc2EnvConfig;
