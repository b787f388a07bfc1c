//! Agent.
use super::{Env, Policy, Transition};
use crate::{record::Record, EpisodeStats};
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy on an environment.
///
/// The learning schedule (warm-up, update cadence, trajectory truncation)
/// lives behind [`Agent::observe`] and [`Agent::end_episode`]; the training
/// driver only feeds transitions and never decides when to update.
pub trait Agent<E: Env>: Policy<E> {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Receives the transition produced by the last action.
    ///
    /// Returns a record when an optimization step was performed.
    fn observe(&mut self, transition: Transition<E>) -> Result<Option<Record>>;

    /// Called once an episode has ended, with the final observation.
    ///
    /// Returns a record when an optimization step was performed.
    #[allow(unused_variables)]
    fn end_episode(&mut self, last_obs: &E::Obs, stats: &EpisodeStats) -> Result<Option<Record>> {
        Ok(None)
    }

    /// Save the parameters of the agent in the given directory.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}

/// The capability the binary drives: act, train from scratch, or resume.
pub trait TrainableAgent<E: Env>: Policy<E> {
    /// Trains for `epochs` epochs from scratch.
    fn learn(&mut self, epochs: usize) -> Result<()>;

    /// Loads the checkpoint `token` and trains until `epochs` epochs are done.
    ///
    /// `restore_token` tells this resumed run apart from the one that wrote
    /// the checkpoint.
    fn restore(&mut self, token: &str, epochs: usize, restore_token: usize) -> Result<()>;
}
