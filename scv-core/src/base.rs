//! Core functionalities.
mod agent;
mod env;
mod policy;
mod step;
pub use agent::{Agent, TrainableAgent};
pub use env::Env;
pub use policy::Policy;
pub use step::{StepType, TimeStep, Transition};
