//! Configuration of a run.
use anyhow::Result;
use scv_candle_agent::{ddpg::DdpgConfig, ppo::PpoConfig};
use scv_core::{checkpoint::Checkpointer, TrainerConfig};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

/// The game to play.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    /// Name of the map.
    pub map_name: String,

    /// Side of the screen and minimap feature layers.
    pub map_size: usize,

    /// Game steps per agent step.
    pub step_interval: usize,

    /// Shows the feature layers in a window.
    pub visualize: bool,

    /// Race of the agent.
    pub race: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            map_name: "CollectMineralsAndGas".to_string(),
            map_size: 64,
            step_interval: 16,
            visualize: false,
            race: "terran".to_string(),
        }
    }
}

/// Hyper-parameters shared by all algorithms.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CommonConfig {
    /// Discount factor.
    pub gamma: f64,

    /// Learning rate of the actor.
    pub actor_lr: f64,

    /// Learning rate of the critic.
    pub critic_lr: f64,

    /// Seed of the game and of the agent.
    pub seed: u64,

    /// Number of epochs, one episode each.
    pub epochs: usize,

    /// Step ceiling of an episode.
    pub max_steps_per_episode: usize,

    /// Hidden layer sizes of the networks.
    pub units: Vec<usize>,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            actor_lr: 3e-4,
            critic_lr: 1e-3,
            seed: 1234,
            epochs: 10000,
            max_steps_per_episode: 1000,
            units: vec![256, 256],
        }
    }
}

/// Hyper-parameters of DDPG.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DdpgParams {
    pub replay_buffer_size: usize,
    pub tau: f64,
    pub batch_size: usize,
    pub warmup_steps: usize,
    pub update_steps: usize,
}

impl Default for DdpgParams {
    fn default() -> Self {
        Self {
            replay_buffer_size: 10000,
            tau: 0.005,
            batch_size: 32,
            warmup_steps: 1000,
            update_steps: 1000,
        }
    }
}

/// Hyper-parameters of PPO.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PpoParams {
    pub clip_ratio: f64,
    pub actor_train_iterations: usize,
    pub critic_train_iterations: usize,
    pub lambda: f32,
    pub target_kl: f32,
    pub max_trajectory_length: usize,
}

impl Default for PpoParams {
    fn default() -> Self {
        Self {
            clip_ratio: 0.2,
            actor_train_iterations: 80,
            critic_train_iterations: 80,
            lambda: 0.97,
            target_kl: 10.0,
            max_trajectory_length: 1000,
        }
    }
}

/// Where and how often checkpoints are written.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SavingConfig {
    /// Root directory of checkpoints.
    pub save_path: PathBuf,

    /// Name of the model, a subdirectory of `save_path`.
    pub model_name: String,

    /// Interval of saving checkpoints in epochs.
    pub save_epochs: usize,
}

impl Default for SavingConfig {
    fn default() -> Self {
        Self {
            save_path: PathBuf::from("./Saves/"),
            model_name: "CMAG_V1_RE".to_string(),
            save_epochs: 500,
        }
    }
}

/// Resuming from a checkpoint.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RestoreConfig {
    /// Resume instead of training from scratch.
    pub enabled: bool,

    /// Checkpoint to load, usually the epoch it was written at.
    pub token: String,

    /// Tells the resumed run apart from the one that wrote the checkpoint.
    pub restore_token: usize,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            token: "5000".to_string(),
            restore_token: 1,
        }
    }
}

/// Configuration of a run.
///
/// Every field has a default, so a YAML file only needs the values it
/// changes:
///
/// ```rust
/// use scv::RunConfig;
///
/// let config: RunConfig = serde_yaml::from_str("algorithm: PPO\nrestore:\n  enabled: true\n").unwrap();
/// assert_eq!(config.algorithm, "PPO");
/// assert!(config.restore.enabled);
/// assert_eq!(config.restore.token, "5000");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    /// Name of the algorithm, matched case-insensitively.
    pub algorithm: String,

    pub map: MapConfig,

    pub common: CommonConfig,

    pub ddpg: DdpgParams,

    pub ppo: PpoParams,

    pub saving: SavingConfig,

    pub restore: RestoreConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            algorithm: "DDPG".to_string(),
            map: MapConfig::default(),
            common: CommonConfig::default(),
            ddpg: DdpgParams::default(),
            ppo: PpoParams::default(),
            saving: SavingConfig::default(),
            restore: RestoreConfig::default(),
        }
    }
}

impl RunConfig {
    /// Sets the algorithm.
    pub fn algorithm(mut self, v: impl Into<String>) -> Self {
        self.algorithm = v.into();
        self
    }

    /// Constructs [`RunConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`RunConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }

    /// Configuration of the training loop.
    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig::default()
            .max_steps_per_episode(self.common.max_steps_per_episode)
            .save_epochs(self.saving.save_epochs)
    }

    /// Checkpointer writing under `save_path/model_name`.
    pub fn checkpointer(&self) -> Checkpointer {
        Checkpointer::new(&self.saving.save_path, &self.saving.model_name)
            .algorithm(self.algorithm.to_lowercase())
    }

    /// Configuration of [`Ddpg`](scv_candle_agent::ddpg::Ddpg).
    pub fn ddpg_config(&self) -> DdpgConfig {
        let p = &self.ddpg;
        DdpgConfig::default()
            .discount_factor(self.common.gamma)
            .actor_lr(self.common.actor_lr)
            .critic_lr(self.common.critic_lr)
            .units(self.common.units.clone())
            .seed(self.common.seed)
            .replay_buffer_size(p.replay_buffer_size)
            .tau(p.tau)
            .batch_size(p.batch_size)
            .warmup_steps(p.warmup_steps)
            .update_steps(p.update_steps)
    }

    /// Configuration of [`Ppo`](scv_candle_agent::ppo::Ppo).
    pub fn ppo_config(&self) -> PpoConfig {
        let p = &self.ppo;
        PpoConfig::default()
            .discount_factor(self.common.gamma as f32)
            .actor_lr(self.common.actor_lr)
            .critic_lr(self.common.critic_lr)
            .units(self.common.units.clone())
            .seed(self.common.seed)
            .clip_ratio(p.clip_ratio)
            .actor_train_iterations(p.actor_train_iterations)
            .critic_train_iterations(p.critic_train_iterations)
            .lambda(p.lambda)
            .target_kl(p.target_kl)
            .max_trajectory_length(p.max_trajectory_length)
    }
}
