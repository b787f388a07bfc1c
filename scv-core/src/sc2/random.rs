//! The template agent: uniformly random valid actions.
use super::{FunctionCall, Sc2ActSpec, Sc2Obs, Sc2ObsSpec};
use crate::{error::ScvError, record::Record, Agent, Env, Policy, TimeStep, Transition};
use anyhow::Result;
use std::path::Path;

/// Picks a uniformly random available function and uniformly random
/// arguments within their declared sizes.
///
/// As an [`Agent`] it never learns; it is useful as a baseline and for
/// exercising an environment.
pub struct RandomAgent {
    rng: fastrand::Rng,
    act_spec: Option<Sc2ActSpec>,
    train: bool,
}

impl RandomAgent {
    /// Constructs the agent with a random seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            act_spec: None,
            train: true,
        }
    }

    /// Sets the action spec without going through [`Policy::setup`].
    pub fn with_act_spec(mut self, act_spec: Sc2ActSpec) -> Self {
        self.act_spec = Some(act_spec);
        self
    }

    /// Samples an action for the given observation.
    pub fn sample(&mut self, obs: &Sc2Obs) -> Result<FunctionCall> {
        let act_spec = self.act_spec.as_ref().ok_or(ScvError::NotSetUp)?;
        if obs.available_actions.is_empty() {
            return Err(ScvError::NoAvailableAction.into());
        }
        let function = obs.available_actions[self.rng.usize(..obs.available_actions.len())];
        let spec = act_spec
            .function(function)
            .ok_or(ScvError::UnknownFunction(function))?;
        let arguments = spec
            .args
            .iter()
            .map(|arg| {
                arg.sizes
                    .iter()
                    .map(|&size| self.rng.u64(..size.max(1) as u64) as i64)
                    .collect()
            })
            .collect();
        Ok(FunctionCall::new(function, arguments))
    }
}

impl<E> Policy<E> for RandomAgent
where
    E: Env<Obs = Sc2Obs, Act = FunctionCall, ObsSpec = Sc2ObsSpec, ActSpec = Sc2ActSpec>,
{
    fn setup(&mut self, _obs_spec: &Sc2ObsSpec, act_spec: &Sc2ActSpec) -> Result<()> {
        self.act_spec = Some(act_spec.clone());
        Ok(())
    }

    fn step(&mut self, timestep: &TimeStep<Sc2Obs>) -> Result<FunctionCall> {
        self.sample(&timestep.observation)
    }
}

impl<E> Agent<E> for RandomAgent
where
    E: Env<Obs = Sc2Obs, Act = FunctionCall, ObsSpec = Sc2ObsSpec, ActSpec = Sc2ActSpec>,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn observe(&mut self, _transition: Transition<E>) -> Result<Option<Record>> {
        Ok(None)
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)?;
        Ok(())
    }

    fn load_params(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }
}
