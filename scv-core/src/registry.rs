//! Maps algorithm names to agent constructors.
use crate::{Env, TrainableAgent};
use anyhow::Result;
use std::collections::BTreeMap;

/// Builds a trainable agent, including its environment, from a configuration.
pub type AgentFactory<E, C> = Box<dyn Fn(&C) -> Result<Box<dyn TrainableAgent<E>>>>;

/// A registry of algorithms, looked up by case-insensitive name.
///
/// ```rust
/// use scv_core::{dummy::DummySc2Env, AgentRegistry};
///
/// let registry = AgentRegistry::<DummySc2Env, ()>::new();
/// assert!(registry.get("DDPG").is_none());
/// ```
pub struct AgentRegistry<E: Env, C> {
    factories: BTreeMap<String, AgentFactory<E, C>>,
}

impl<E: Env, C> Default for AgentRegistry<E, C> {
    fn default() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }
}

impl<E: Env, C> AgentRegistry<E, C> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `name`, replacing any previous entry.
    pub fn register<F>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn(&C) -> Result<Box<dyn TrainableAgent<E>>> + 'static,
    {
        self.factories.insert(name.to_lowercase(), Box::new(factory));
        self
    }

    /// Returns the constructor registered under `name`.
    pub fn get(&self, name: &str) -> Option<&AgentFactory<E, C>> {
        self.factories.get(&name.to_lowercase())
    }

    /// Returns `true` if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names, in lowercase.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(|k| k.as_str()).collect()
    }
}
