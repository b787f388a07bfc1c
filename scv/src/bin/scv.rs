use anyhow::Result;
use clap::Parser;
use scv::{registry, run, RunConfig};
use scv_core::ShutdownSignal;
use scv_pysc2_env::{Sc2Env, Sc2EnvConfig};

/// Train an agent on a StarCraft II map
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// YAML file of the run configuration; defaults are used when omitted
    #[arg(long)]
    config: Option<String>,

    /// Algorithm, overriding the configuration (ddpg, ppo or random)
    #[arg(long)]
    algorithm: Option<String>,

    /// Print the configuration in YAML and exit
    #[arg(long, default_value_t = false)]
    show_config: bool,
}

fn env_config(config: &RunConfig) -> Sc2EnvConfig {
    Sc2EnvConfig::default()
        .map_name(config.map.map_name.clone())
        .map_size(config.map.map_size)
        .step_mul(config.map.step_interval)
        .visualize(config.map.visualize)
        .race(config.map.race.clone())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match args.config.as_ref() {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(algorithm) = args.algorithm {
        config.algorithm = algorithm;
    }
    if args.show_config {
        println!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    let shutdown = ShutdownSignal::install()?;
    let registry = registry::<Sc2Env>(env_config(&config), shutdown.clone());
    run(&config, &registry)?;
    if shutdown.is_triggered() {
        log::info!("Shut down after the user interrupt");
    }
    Ok(())
}
