//! Configuration of PPO agent.
use crate::{encoder::EncoderConfig, Device};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Constructs [`Ppo`](super::Ppo).
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct PpoConfig {
    pub(super) gamma: f32,
    pub(super) lambda: f32,
    pub(super) clip_ratio: f64,
    pub(super) actor_lr: f64,
    pub(super) critic_lr: f64,
    pub(super) actor_train_iterations: usize,
    pub(super) critic_train_iterations: usize,
    pub(super) target_kl: f32,
    pub(super) max_trajectory_length: usize,
    pub(super) units: Vec<usize>,
    pub(super) encoder: EncoderConfig,
    pub(super) seed: u64,
    pub(super) device: Device,
}

impl Default for PpoConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            lambda: 0.97,
            clip_ratio: 0.2,
            actor_lr: 3e-4,
            critic_lr: 1e-3,
            actor_train_iterations: 80,
            critic_train_iterations: 80,
            target_kl: 10.0,
            max_trajectory_length: 1000,
            units: vec![256, 256],
            encoder: EncoderConfig::default(),
            seed: 1234,
            device: Device::Cpu,
        }
    }
}

impl PpoConfig {
    /// Discount factor.
    pub fn discount_factor(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    /// Lambda of the generalised advantage estimation.
    pub fn lambda(mut self, v: f32) -> Self {
        self.lambda = v;
        self
    }

    /// Clipping range of the probability ratio.
    pub fn clip_ratio(mut self, v: f64) -> Self {
        self.clip_ratio = v;
        self
    }

    /// Learning rate of the actor.
    pub fn actor_lr(mut self, v: f64) -> Self {
        self.actor_lr = v;
        self
    }

    /// Learning rate of the critic.
    pub fn critic_lr(mut self, v: f64) -> Self {
        self.critic_lr = v;
        self
    }

    /// Maximum number of actor gradient steps per trajectory.
    pub fn actor_train_iterations(mut self, v: usize) -> Self {
        self.actor_train_iterations = v;
        self
    }

    /// Number of critic gradient steps per trajectory.
    pub fn critic_train_iterations(mut self, v: usize) -> Self {
        self.critic_train_iterations = v;
        self
    }

    /// Actor updates stop once the approximate KL divergence exceeds
    /// `1.5 * target_kl`.
    pub fn target_kl(mut self, v: f32) -> Self {
        self.target_kl = v;
        self
    }

    /// Length at which a trajectory is cut and used for an update.
    pub fn max_trajectory_length(mut self, v: usize) -> Self {
        self.max_trajectory_length = v;
        self
    }

    /// Hidden layer sizes of actor and critic.
    pub fn units(mut self, v: Vec<usize>) -> Self {
        self.units = v;
        self
    }

    /// Observation encoder.
    pub fn encoder(mut self, v: EncoderConfig) -> Self {
        self.encoder = v;
        self
    }

    /// Random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Constructs [`PpoConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`PpoConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
