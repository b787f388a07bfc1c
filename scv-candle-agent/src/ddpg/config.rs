//! Configuration of DDPG agent.
use crate::{encoder::EncoderConfig, Device};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Constructs [`Ddpg`](super::Ddpg).
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct DdpgConfig {
    pub(super) gamma: f64,
    pub(super) tau: f64,
    pub(super) actor_lr: f64,
    pub(super) critic_lr: f64,
    pub(super) batch_size: usize,
    pub(super) replay_buffer_size: usize,
    pub(super) warmup_steps: usize,
    pub(super) update_steps: usize,
    pub(super) noise_std: f32,
    pub(super) units: Vec<usize>,
    pub(super) encoder: EncoderConfig,
    pub(super) seed: u64,
    pub(super) device: Device,
}

impl Default for DdpgConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            tau: 0.005,
            actor_lr: 3e-4,
            critic_lr: 1e-3,
            batch_size: 32,
            replay_buffer_size: 10000,
            warmup_steps: 1000,
            update_steps: 1000,
            noise_std: 0.1,
            units: vec![256, 256],
            encoder: EncoderConfig::default(),
            seed: 1234,
            device: Device::Cpu,
        }
    }
}

impl DdpgConfig {
    /// Discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Sets soft update coefficient.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
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

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Replay buffer capacity.
    pub fn replay_buffer_size(mut self, v: usize) -> Self {
        self.replay_buffer_size = v;
        self
    }

    /// Environment steps taken with random actions before any update.
    pub fn warmup_steps(mut self, v: usize) -> Self {
        self.warmup_steps = v;
        self
    }

    /// Interval of updates in environment steps; also the number of
    /// gradient steps per update.
    pub fn update_steps(mut self, v: usize) -> Self {
        self.update_steps = v;
        self
    }

    /// Standard deviation of the Gaussian exploration noise.
    pub fn noise_std(mut self, v: f32) -> Self {
        self.noise_std = v;
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

    /// Constructs [`DdpgConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DdpgConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
