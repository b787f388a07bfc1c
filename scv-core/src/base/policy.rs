//! Policy.
use super::{Env, TimeStep};
use anyhow::Result;

/// A policy on an environment.
///
/// Policy is a mapping from an observation to an action.
/// The mapping can be either of deterministic or stochastic.
pub trait Policy<E: Env> {
    /// Receives the specs of the controlled agent before the first episode.
    fn setup(&mut self, obs_spec: &E::ObsSpec, act_spec: &E::ActSpec) -> Result<()>;

    /// Called at the start of every episode.
    fn reset(&mut self) {}

    /// Computes exactly one action from the current timestep.
    fn step(&mut self, timestep: &TimeStep<E::Obs>) -> Result<E::Act>;
}
