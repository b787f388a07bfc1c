use anyhow::Result;
use scv_candle_agent::{
    ddpg::{Ddpg, DdpgConfig},
    encoder::EncoderConfig,
};
use scv_core::{
    checkpoint::Checkpointer,
    dummy::{dummy_act_spec, DummySc2Env, DummySc2EnvConfig},
    Agent, EpisodeLoop, Env, Learner, TrainableAgent, Trainer, TrainerConfig,
};
use tempdir::TempDir;

fn config() -> DdpgConfig {
    DdpgConfig::default()
        .units(vec![8])
        .encoder(EncoderConfig { grid: 2 })
        .batch_size(4)
        .warmup_steps(10)
        .update_steps(5)
}

fn env(episode_len: Option<usize>) -> DummySc2Env {
    DummySc2Env::build(&DummySc2EnvConfig::default().episode_len(episode_len), 0).unwrap()
}

/// Runs one episode and returns the number of records the agent emitted.
fn run_episode(env: &mut DummySc2Env, agent: &mut Ddpg, max_steps: usize) -> Result<usize> {
    let mut records = 0;
    EpisodeLoop::new(max_steps).run_with(env, agent, |agent, transition| {
        if agent.observe(transition)?.is_some() {
            records += 1;
        }
        Ok(())
    })?;
    Ok(records)
}

#[test]
fn no_update_during_warmup_then_updates_on_cadence() -> Result<()> {
    let mut env = env(None);
    let mut agent = Ddpg::build(config())?;
    EpisodeLoop::setup(&env, &mut agent)?;

    // 9 steps: still warming up
    assert_eq!(run_episode(&mut env, &mut agent, 8)?, 0);
    assert_eq!(agent.env_steps(), 9);
    assert_eq!(agent.n_updates(), 0);
    assert_eq!(agent.buffer_len(), 9);

    // steps 10..=18: updates at steps 10 and 15, 5 gradient steps each
    assert_eq!(run_episode(&mut env, &mut agent, 8)?, 2);
    assert_eq!(agent.env_steps(), 18);
    assert_eq!(agent.n_updates(), 10);
    Ok(())
}

#[test]
fn actions_are_valid_before_and_after_warmup() -> Result<()> {
    let mut env = env(None);
    let mut agent = Ddpg::build(config())?;
    EpisodeLoop::setup(&env, &mut agent)?;
    run_episode(&mut env, &mut agent, 29)?;

    let spec = dummy_act_spec(8);
    assert_eq!(env.stats().actions.len(), 30);
    for call in env.stats().actions.iter() {
        assert!(spec.is_valid(call, &[0, 1, 2, 3]), "{:?}", call);
    }
    Ok(())
}

#[test]
fn eval_mode_does_not_learn() -> Result<()> {
    let mut env = env(None);
    let mut agent = Ddpg::build(config().warmup_steps(0).update_steps(1).batch_size(1))?;
    EpisodeLoop::setup(&env, &mut agent)?;
    Agent::<DummySc2Env>::eval(&mut agent);

    assert_eq!(run_episode(&mut env, &mut agent, 9)?, 0);
    assert_eq!(agent.env_steps(), 0);
    assert_eq!(agent.buffer_len(), 0);
    Ok(())
}

#[test]
fn parameters_round_trip_through_a_checkpoint() -> Result<()> {
    let dir = TempDir::new("scv_ddpg")?;
    let checkpointer = Checkpointer::new(dir.path(), "model").algorithm("ddpg");
    let trainer = || {
        Trainer::build(
            TrainerConfig::default()
                .max_steps_per_episode(100)
                .save_epochs(2),
        )
    };

    let mut learner = Learner::new(env(Some(6)), Ddpg::build(config())?, trainer(), checkpointer.clone());
    learner.learn(2)?;
    assert_eq!(learner.agent().env_steps(), 12);
    assert_eq!(learner.agent().n_updates(), 5);

    let ckpt = checkpointer.dir("2");
    for file in [
        "actor.safetensors",
        "actor_tgt.safetensors",
        "critic.safetensors",
        "critic_tgt.safetensors",
        "ddpg_state.yaml",
        "replay_buffer.bin",
        "checkpoint.yaml",
    ] {
        assert!(ckpt.join(file).is_file(), "{} missing", file);
    }

    // The restored agent keeps its step counter and replay buffer, skips
    // warm-up and updates at step 15 without refilling a batch first.
    let mut resumed = Learner::new(env(Some(6)), Ddpg::build(config())?, trainer(), checkpointer);
    resumed.restore("2", 3, 1)?;
    assert_eq!(resumed.agent().env_steps(), 18);
    assert_eq!(resumed.agent().buffer_len(), 18);
    assert_eq!(resumed.agent().n_updates(), 10);
    assert!(!dir.path().join("model_r1").join("2").exists());
    Ok(())
}
