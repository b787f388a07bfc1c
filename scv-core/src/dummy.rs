//! A small stand-in for the StarCraft II environment, used in tests.
//!
//! [`DummySc2Env`] emits observations of the right shapes, ends an episode
//! after a configured number of steps and keeps count of the calls it
//! receives.
use crate::{
    sc2::{ArgumentSpec, FunctionCall, FunctionSpec, Sc2ActSpec, Sc2Obs, Sc2ObsSpec, PLAYER_STATS},
    Env, StepType, TimeStep,
};
use anyhow::{bail, Result};
use ndarray::Array3;

const SCREEN_CHANNELS: usize = 2;
const MINIMAP_CHANNELS: usize = 1;

/// Action spec with four functions: `no_op`, `select_army(select_add)`,
/// `Move_screen(queued, screen)` and `Move_minimap(queued, minimap)`.
pub fn dummy_act_spec(size: usize) -> Sc2ActSpec {
    let queued = ArgumentSpec {
        id: 1,
        name: "queued".to_string(),
        sizes: vec![2],
    };
    Sc2ActSpec::new(vec![
        FunctionSpec {
            id: 0,
            name: "no_op".to_string(),
            args: vec![],
        },
        FunctionSpec {
            id: 1,
            name: "select_army".to_string(),
            args: vec![ArgumentSpec {
                id: 7,
                name: "select_add".to_string(),
                sizes: vec![2],
            }],
        },
        FunctionSpec {
            id: 2,
            name: "Move_screen".to_string(),
            args: vec![
                queued.clone(),
                ArgumentSpec {
                    id: 0,
                    name: "screen".to_string(),
                    sizes: vec![size, size],
                },
            ],
        },
        FunctionSpec {
            id: 3,
            name: "Move_minimap".to_string(),
            args: vec![
                queued,
                ArgumentSpec {
                    id: 2,
                    name: "minimap".to_string(),
                    sizes: vec![size, size],
                },
            ],
        },
    ])
}

/// Observation spec matching [`dummy_obs`].
pub fn dummy_obs_spec(size: usize) -> Sc2ObsSpec {
    Sc2ObsSpec::new(
        [SCREEN_CHANNELS, size, size],
        [MINIMAP_CHANNELS, size, size],
    )
}

/// An observation whose feature layers are zero except for a marker
/// derived from `available`.
pub fn dummy_obs(size: usize, available: Vec<usize>) -> Sc2Obs {
    let mut feature_screen = Array3::zeros((SCREEN_CHANNELS, size, size));
    feature_screen[[0, 0, 0]] = available.len() as f32;
    Sc2Obs {
        available_actions: available,
        feature_screen,
        feature_minimap: Array3::zeros((MINIMAP_CHANNELS, size, size)),
        player: vec![0.0; PLAYER_STATS],
    }
}

/// Configuration of [`DummySc2Env`].
#[derive(Debug, Clone)]
pub struct DummySc2EnvConfig {
    /// Width and height of the feature layers.
    pub size: usize,

    /// Steps after which the episode ends; `None` never ends it.
    pub episode_len: Option<usize>,

    /// Reward of every step.
    pub reward: f32,
}

impl Default for DummySc2EnvConfig {
    fn default() -> Self {
        Self {
            size: 8,
            episode_len: Some(5),
            reward: 1.0,
        }
    }
}

impl DummySc2EnvConfig {
    /// Sets the episode length.
    pub fn episode_len(mut self, v: Option<usize>) -> Self {
        self.episode_len = v;
        self
    }

    /// Sets the size of the feature layers.
    pub fn size(mut self, v: usize) -> Self {
        self.size = v;
        self
    }
}

/// Counters kept by [`DummySc2Env`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DummyEnvStats {
    /// Calls of `reset()`.
    pub resets: usize,

    /// Calls of `step()`.
    pub steps: usize,

    /// Number of actions passed to each `step()` call.
    pub actions_per_step: Vec<usize>,

    /// Every submitted action.
    pub actions: Vec<FunctionCall>,

    /// `true` once `close()` was called.
    pub closed: bool,
}

/// A deterministic environment with StarCraft II shaped observations.
pub struct DummySc2Env {
    config: DummySc2EnvConfig,
    act_spec: Sc2ActSpec,
    episode_steps: usize,
    stats: DummyEnvStats,
}

impl DummySc2Env {
    /// Returns the call counters.
    pub fn stats(&self) -> &DummyEnvStats {
        &self.stats
    }

    fn obs(&self) -> Sc2Obs {
        dummy_obs(self.config.size, vec![0, 1, 2, 3])
    }
}

impl Env for DummySc2Env {
    type Config = DummySc2EnvConfig;
    type Obs = Sc2Obs;
    type Act = FunctionCall;
    type ObsSpec = Sc2ObsSpec;
    type ActSpec = Sc2ActSpec;

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            act_spec: dummy_act_spec(config.size),
            config: config.clone(),
            episode_steps: 0,
            stats: DummyEnvStats::default(),
        })
    }

    fn observation_spec(&self) -> Vec<Sc2ObsSpec> {
        vec![dummy_obs_spec(self.config.size)]
    }

    fn action_spec(&self) -> Vec<Sc2ActSpec> {
        vec![self.act_spec.clone()]
    }

    fn reset(&mut self) -> Result<Vec<TimeStep<Sc2Obs>>> {
        self.stats.resets += 1;
        self.episode_steps = 0;
        Ok(vec![TimeStep::new(StepType::First, 0.0, 1.0, self.obs())])
    }

    fn step(&mut self, acts: &[FunctionCall]) -> Result<Vec<TimeStep<Sc2Obs>>> {
        if self.stats.closed {
            bail!("step() on a closed environment");
        }
        self.stats.steps += 1;
        self.stats.actions_per_step.push(acts.len());
        self.stats.actions.extend(acts.iter().cloned());
        self.episode_steps += 1;

        let last = matches!(self.config.episode_len, Some(n) if self.episode_steps >= n);
        let (step_type, discount) = match last {
            true => (StepType::Last, 0.0),
            false => (StepType::Mid, 1.0),
        };
        Ok(vec![TimeStep::new(
            step_type,
            self.config.reward,
            discount,
            self.obs(),
        )])
    }

    fn close(&mut self) -> Result<()> {
        self.stats.closed = true;
        Ok(())
    }
}
