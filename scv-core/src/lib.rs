#![warn(missing_docs)]
//! Core of scv, a reinforcement learning driver for StarCraft II.
//!
//! The simulator and the learning algorithms are collaborators reached
//! through the traits in this crate:
//!
//! * [`Env`] wraps the simulator and emits [`TimeStep`]s.
//! * [`Policy`] maps a timestep to an action.
//! * [`Agent`] is a policy that also learns from [`Transition`]s and
//!   persists its parameters.
//! * [`TrainableAgent`] is the top-level capability the binary drives:
//!   `learn` and `restore`.
//!
//! [`EpisodeLoop`] runs one episode, [`Trainer`] repeats it for a number of
//! epochs and [`Learner`] glues an environment, an agent and a trainer into
//! a [`TrainableAgent`].
pub mod checkpoint;
pub mod dummy;
pub mod error;
pub mod record;
pub mod sc2;

mod base;
pub use base::{Agent, Env, Policy, StepType, TimeStep, TrainableAgent, Transition};

mod episode;
pub use episode::{EpisodeEnd, EpisodeLoop, EpisodeStats};

mod registry;
pub use registry::{AgentFactory, AgentRegistry};

mod shutdown;
pub use shutdown::ShutdownSignal;

mod trainer;
pub use trainer::{Learner, Trainer, TrainerConfig, TrainingOutcome};
