//! Environment.
use super::TimeStep;
use anyhow::Result;
use std::fmt::Debug;

/// Represents an environment, typically a StarCraft II game.
///
/// Every method is per-agent: specs and timesteps come back as one element
/// per controlled player, and [`Env::step`] takes one action per player.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Clone + Debug;

    /// Action of the environment.
    type Act: Clone + Debug;

    /// Description of the observation.
    type ObsSpec: Clone + Debug;

    /// Description of the action space.
    type ActSpec: Clone + Debug;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Returns the observation spec of each controlled agent.
    fn observation_spec(&self) -> Vec<Self::ObsSpec>;

    /// Returns the action spec of each controlled agent.
    fn action_spec(&self) -> Vec<Self::ActSpec>;

    /// Starts a new episode.
    fn reset(&mut self) -> Result<Vec<TimeStep<Self::Obs>>>;

    /// Performs an environment step with one action per controlled agent.
    fn step(&mut self, acts: &[Self::Act]) -> Result<Vec<TimeStep<Self::Obs>>>;

    /// Releases the resources held by the environment.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
