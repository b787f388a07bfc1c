//! The algorithms a run can select.
use crate::RunConfig;
use anyhow::Result;
use scv_candle_agent::{ddpg::Ddpg, ppo::Ppo};
use scv_core::{
    sc2::{FunctionCall, RandomAgent, Sc2ActSpec, Sc2Obs, Sc2ObsSpec},
    Agent, AgentRegistry, Env, Learner, ShutdownSignal, TrainableAgent, Trainer,
};

/// Builds the environment and a [`Learner`] around `agent`.
fn learner<E, A>(
    env_config: &E::Config,
    config: &RunConfig,
    agent: A,
    shutdown: &ShutdownSignal,
) -> Result<Box<dyn TrainableAgent<E>>>
where
    E: Env + 'static,
    A: Agent<E> + 'static,
{
    let env = E::build(env_config, config.common.seed as i64)?;
    let trainer = Trainer::build(config.trainer_config()).shutdown_signal(shutdown.clone());
    Ok(Box::new(Learner::new(
        env,
        agent,
        trainer,
        config.checkpointer(),
    )))
}

/// Registers `ddpg`, `ppo` and `random` on environments built from `env_config`.
///
/// Constructors build their own environment, so looking up an unknown name
/// never launches a game.
pub fn registry<E>(env_config: E::Config, shutdown: ShutdownSignal) -> AgentRegistry<E, RunConfig>
where
    E: Env<Obs = Sc2Obs, Act = FunctionCall, ObsSpec = Sc2ObsSpec, ActSpec = Sc2ActSpec>
        + 'static,
    E::Config: 'static,
{
    let (c1, s1) = (env_config.clone(), shutdown.clone());
    let (c2, s2) = (env_config.clone(), shutdown.clone());
    let (c3, s3) = (env_config, shutdown);

    AgentRegistry::new()
        .register("ddpg", move |config: &RunConfig| {
            let agent = Ddpg::build(config.ddpg_config())?;
            learner::<E, _>(&c1, config, agent, &s1)
        })
        .register("ppo", move |config: &RunConfig| {
            let agent = Ppo::build(config.ppo_config())?;
            learner::<E, _>(&c2, config, agent, &s2)
        })
        .register("random", move |config: &RunConfig| {
            let agent = RandomAgent::new(config.common.seed);
            learner::<E, _>(&c3, config, agent, &s3)
        })
}
