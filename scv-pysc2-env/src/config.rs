//! Configuration of [`Sc2Env`](super::Sc2Env).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Sc2Env`](super::Sc2Env).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Sc2EnvConfig {
    /// Name of the map, e.g. `CollectMineralsAndGas`.
    pub map_name: String,

    /// Side of the screen feature layers.
    pub screen_size: usize,

    /// Side of the minimap feature layers.
    pub minimap_size: usize,

    /// Game steps per agent step.
    pub step_mul: usize,

    /// Shows the feature layers in a window.
    pub visualize: bool,

    /// Race of the agent, a member name of `pysc2.env.sc2_env.Race`.
    pub race: String,
}

impl Default for Sc2EnvConfig {
    fn default() -> Self {
        Self {
            map_name: "CollectMineralsAndGas".to_string(),
            screen_size: 64,
            minimap_size: 64,
            step_mul: 16,
            visualize: false,
            race: "terran".to_string(),
        }
    }
}

impl Sc2EnvConfig {
    /// Sets the map.
    pub fn map_name(mut self, v: impl Into<String>) -> Self {
        self.map_name = v.into();
        self
    }

    /// Sets the side of both screen and minimap layers.
    pub fn map_size(mut self, v: usize) -> Self {
        self.screen_size = v;
        self.minimap_size = v;
        self
    }

    /// Sets the number of game steps per agent step.
    pub fn step_mul(mut self, v: usize) -> Self {
        self.step_mul = v;
        self
    }

    /// Enables the feature layer window.
    pub fn visualize(mut self, v: bool) -> Self {
        self.visualize = v;
        self
    }

    /// Sets the race of the agent.
    pub fn race(mut self, v: impl Into<String>) -> Self {
        self.race = v.into();
        self
    }

    /// Constructs [`Sc2EnvConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`Sc2EnvConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
