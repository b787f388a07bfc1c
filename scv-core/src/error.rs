//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum ScvError {
    /// The environment returned an empty per-agent tuple.
    #[error("Environment returned no {0} for the controlled agent")]
    EmptyAgentTuple(&'static str),

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// A policy was asked for an action before `setup()` was called.
    #[error("Policy is not set up, call setup() with the environment specs first")]
    NotSetUp,

    /// An observation does not list any available action.
    #[error("No action is available in the observation")]
    NoAvailableAction,

    /// The function id is not declared in the action spec.
    #[error("Unknown function id: {0}")]
    UnknownFunction(usize),

    /// Not enough transitions to draw a batch.
    #[error("Replay buffer holds {len} transitions, {required} required")]
    InsufficientTransitions {
        /// Transitions currently stored.
        len: usize,
        /// Transitions needed.
        required: usize,
    },
}
