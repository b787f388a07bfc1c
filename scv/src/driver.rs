//! Entry point of a run.
use crate::RunConfig;
use anyhow::Result;
use log::{info, warn};
use scv_core::{AgentRegistry, Env};

/// Runs the algorithm named in `config`.
///
/// An unknown algorithm prints a message and returns `Ok(())` without
/// building an environment. Otherwise the agent either resumes from
/// `config.restore.token` or trains from scratch, for `config.common.epochs`
/// epochs in total.
pub fn run<E: Env>(config: &RunConfig, registry: &AgentRegistry<E, RunConfig>) -> Result<()> {
    let Some(factory) = registry.get(&config.algorithm) else {
        let msg = format!("The algorithm {} is not supported for now.", config.algorithm);
        println!("{}", msg);
        warn!("{} Registered algorithms: {:?}", msg, registry.names());
        return Ok(());
    };

    info!("Algorithm: {}", config.algorithm);
    let mut agent = factory(config)?;
    let epochs = config.common.epochs;
    match config.restore.enabled {
        true => agent.restore(
            &config.restore.token,
            epochs,
            config.restore.restore_token,
        ),
        false => agent.learn(epochs),
    }
}
