//! Environment step.
use super::Env;

/// Position of a [`TimeStep`] within an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepType {
    /// The timestep returned by `reset()`.
    First,

    /// Any timestep that is neither first nor last.
    Mid,

    /// The final timestep of an episode.
    Last,
}

/// An observation, reward and termination snapshot emitted by an [`Env`].
///
/// Environments return one [`TimeStep`] per controlled agent.
#[derive(Debug, Clone)]
pub struct TimeStep<O> {
    /// Position within the episode.
    pub step_type: StepType,

    /// Reward for the action that produced this timestep.
    pub reward: f32,

    /// Discount, `0.0` at a true terminal state.
    pub discount: f32,

    /// Observation.
    pub observation: O,
}

impl<O> TimeStep<O> {
    /// Constructs a [`TimeStep`].
    pub fn new(step_type: StepType, reward: f32, discount: f32, observation: O) -> Self {
        Self {
            step_type,
            reward,
            discount,
            observation,
        }
    }

    /// Returns `true` for the first timestep of an episode.
    #[inline]
    pub fn first(&self) -> bool {
        self.step_type == StepType::First
    }

    /// Returns `true` for intermediate timesteps.
    #[inline]
    pub fn mid(&self) -> bool {
        self.step_type == StepType::Mid
    }

    /// Returns `true` if the episode ended at this timestep.
    #[inline]
    pub fn last(&self) -> bool {
        self.step_type == StepType::Last
    }
}

/// Represents a transition `(o_t, a_t, r_t, o_t+1)` handed to learning agents.
///
/// The episode loop builds one [`Transition`] after every environment step.
pub struct Transition<E: Env> {
    /// Observation the action was computed from.
    pub obs: E::Obs,

    /// Action submitted to the environment.
    pub act: E::Act,

    /// Reward returned with the next observation.
    pub reward: f32,

    /// Observation after the action.
    pub next_obs: E::Obs,

    /// `true` if the environment ended the episode at `next_obs`.
    pub is_terminated: bool,
}
