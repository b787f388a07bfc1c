use anyhow::Result;
use scv_candle_agent::{
    encoder::EncoderConfig,
    ppo::{Ppo, PpoConfig},
};
use scv_core::{
    checkpoint::Checkpointer,
    dummy::{dummy_act_spec, DummySc2Env, DummySc2EnvConfig},
    record::BufferedRecorder,
    EpisodeLoop, Env, Learner, TrainableAgent, Trainer, TrainerConfig,
};
use tempdir::TempDir;

fn config(max_trajectory_length: usize) -> PpoConfig {
    PpoConfig::default()
        .units(vec![8])
        .encoder(EncoderConfig { grid: 2 })
        .actor_train_iterations(2)
        .critic_train_iterations(2)
        .max_trajectory_length(max_trajectory_length)
}

fn dummy_env(episode_len: Option<usize>) -> DummySc2Env {
    DummySc2Env::build(&DummySc2EnvConfig::default().episode_len(episode_len), 0).unwrap()
}

fn train_one_epoch(env: &mut DummySc2Env, agent: &mut Ppo, max_steps: usize) -> Result<BufferedRecorder> {
    let dir = TempDir::new("scv_ppo")?;
    let checkpointer = Checkpointer::new(dir.path(), "model");
    let trainer = Trainer::build(
        TrainerConfig::default()
            .max_steps_per_episode(max_steps)
            .save_epochs(0),
    );
    let mut recorder = BufferedRecorder::new();
    EpisodeLoop::setup(&*env, agent)?;
    trainer.train(env, agent, &checkpointer, &mut recorder, 0, 1)?;
    Ok(recorder)
}

#[test]
fn trajectories_are_cut_at_the_maximum_length() -> Result<()> {
    // 8 steps, never terminal: cut at 3 and 6, the rest at the step ceiling.
    let mut env = dummy_env(None);
    let mut agent = Ppo::build(config(3))?;
    train_one_epoch(&mut env, &mut agent, 7)?;
    assert_eq!(env.stats().steps, 8);
    assert_eq!(agent.trajectory_lengths(), &[3, 3, 2]);
    Ok(())
}

#[test]
fn terminal_step_ends_the_trajectory() -> Result<()> {
    let mut env = dummy_env(Some(5));
    let mut agent = Ppo::build(config(3))?;
    train_one_epoch(&mut env, &mut agent, 100)?;
    assert_eq!(agent.trajectory_lengths(), &[3, 2]);

    let mut env = dummy_env(Some(4));
    let mut agent = Ppo::build(config(1000))?;
    let recorder = train_one_epoch(&mut env, &mut agent, 100)?;
    assert_eq!(agent.n_trajectories(), 1);
    let record = recorder.iter().last().unwrap();
    assert_eq!(record.get_scalar("trajectory_length")?, 4.0);
    assert_eq!(record.get_scalar("actor_iterations")?, 2.0);
    Ok(())
}

#[test]
fn actions_are_valid() -> Result<()> {
    let mut env = dummy_env(None);
    let mut agent = Ppo::build(config(4))?;
    train_one_epoch(&mut env, &mut agent, 20)?;

    let spec = dummy_act_spec(8);
    for call in env.stats().actions.iter() {
        assert!(spec.is_valid(call, &[0, 1, 2, 3]), "{:?}", call);
    }
    Ok(())
}

#[test]
fn learn_and_restore() -> Result<()> {
    let dir = TempDir::new("scv_ppo")?;
    let checkpointer = Checkpointer::new(dir.path(), "model").algorithm("ppo");
    let trainer = || {
        Trainer::build(
            TrainerConfig::default()
                .max_steps_per_episode(100)
                .save_epochs(1),
        )
    };

    let mut learner = Learner::new(dummy_env(Some(3)), Ppo::build(config(10))?, trainer(), checkpointer.clone());
    learner.learn(2)?;
    assert!(checkpointer.dir("2").join("actor.safetensors").is_file());
    assert!(checkpointer.dir("2").join("critic.safetensors").is_file());

    let mut resumed = Learner::new(dummy_env(Some(3)), Ppo::build(config(10))?, trainer(), checkpointer);
    resumed.restore("2", 3, 2)?;
    assert_eq!(resumed.agent().n_trajectories(), 1);
    assert!(dir.path().join("model_r2").join("3").is_dir());
    assert!(resumed.env().stats().closed);
    Ok(())
}
