//! StarCraft II observations, actions and the template agent.
//!
//! These types mirror what pysc2 hands to its agents. They are produced by
//! an environment adapter and consumed read-only by policies.
mod act;
mod obs;
mod random;
pub use act::{ArgumentSpec, FunctionCall, FunctionSpec, Sc2ActSpec};
pub use obs::{Sc2Obs, Sc2ObsSpec, PLAYER_STATS};
pub use random::RandomAgent;
