use anyhow::Result;
use scv_core::{
    checkpoint::{CheckpointInfo, Checkpointer},
    dummy::{DummySc2Env, DummySc2EnvConfig},
    record::BufferedRecorder,
    sc2::RandomAgent,
    EpisodeLoop, Env, Learner, ShutdownSignal, TrainableAgent, Trainer, TrainerConfig,
};
use tempdir::TempDir;

fn env(episode_len: Option<usize>) -> DummySc2Env {
    let config = DummySc2EnvConfig::default().episode_len(episode_len);
    DummySc2Env::build(&config, 0).unwrap()
}

fn trainer(save_epochs: usize) -> Trainer {
    Trainer::build(
        TrainerConfig::default()
            .max_steps_per_episode(50)
            .save_epochs(save_epochs),
    )
}

#[test]
fn checkpoints_are_written_every_save_epochs() -> Result<()> {
    let dir = TempDir::new("scv_trainer")?;
    let checkpointer = Checkpointer::new(dir.path(), "model").algorithm("random");
    let mut env = env(Some(3));
    let mut agent = RandomAgent::new(0);
    EpisodeLoop::setup(&env, &mut agent)?;
    let mut recorder = BufferedRecorder::new();

    let outcome = trainer(2).train(&mut env, &mut agent, &checkpointer, &mut recorder, 0, 5)?;
    assert_eq!(outcome.epochs, 5);
    assert!(!outcome.interrupted);

    assert!(checkpointer.dir("2").is_dir());
    assert!(checkpointer.dir("4").is_dir());
    assert!(!checkpointer.dir("5").exists());
    let info = CheckpointInfo::load(checkpointer.dir("4").join("checkpoint.yaml"))?;
    assert_eq!(info.epoch, 4);
    assert_eq!(info.algorithm, "random");
    assert_eq!(info.model_name, "model");

    // One flushed aggregate per epoch.
    assert_eq!(recorder.len(), 5);
    for record in recorder.iter() {
        assert_eq!(record.get_scalar("episode_steps")?, 3.0);
        assert_eq!(record.get_scalar("episode_reward")?, 3.0);
    }
    assert_eq!(env.stats().resets, 5);
    assert_eq!(env.stats().steps, 15);
    Ok(())
}

#[test]
fn step_limit_ends_an_epoch() -> Result<()> {
    let dir = TempDir::new("scv_trainer")?;
    let checkpointer = Checkpointer::new(dir.path(), "model");
    let mut env = env(None);
    let mut agent = RandomAgent::new(0);
    EpisodeLoop::setup(&env, &mut agent)?;
    let mut recorder = BufferedRecorder::new();

    let outcome = trainer(0).train(&mut env, &mut agent, &checkpointer, &mut recorder, 0, 2)?;
    assert_eq!(outcome.epochs, 2);
    assert_eq!(env.stats().steps, 2 * 51);
    assert!(!dir.path().join("model").exists());
    Ok(())
}

#[test]
fn interrupt_stops_training_without_counting_the_epoch() -> Result<()> {
    let dir = TempDir::new("scv_trainer")?;
    let checkpointer = Checkpointer::new(dir.path(), "model");
    let shutdown = ShutdownSignal::new();
    shutdown.trigger();
    let mut env = env(Some(3));
    let mut agent = RandomAgent::new(0);
    EpisodeLoop::setup(&env, &mut agent)?;
    let mut recorder = BufferedRecorder::new();

    let outcome = trainer(1).shutdown_signal(shutdown).train(
        &mut env,
        &mut agent,
        &checkpointer,
        &mut recorder,
        0,
        10,
    )?;
    assert_eq!(outcome.epochs, 0);
    assert!(outcome.interrupted);
    assert_eq!(env.stats().steps, 0);
    assert!(recorder.is_empty());
    Ok(())
}

#[test]
fn learn_trains_from_scratch_and_closes_the_env() -> Result<()> {
    let dir = TempDir::new("scv_learner")?;
    let checkpointer = Checkpointer::new(dir.path(), "model");
    let mut learner = Learner::new(env(Some(2)), RandomAgent::new(0), trainer(3), checkpointer);

    learner.learn(6)?;
    let outcome = learner.last_outcome().unwrap();
    assert_eq!(outcome.epochs, 6);
    assert!(learner.env().stats().closed);
    assert_eq!(learner.env().stats().resets, 6);
    assert!(dir.path().join("model").join("3").is_dir());
    assert!(dir.path().join("model").join("6").is_dir());
    Ok(())
}

#[test]
fn restore_resumes_from_the_checkpoint_epoch() -> Result<()> {
    let dir = TempDir::new("scv_learner")?;
    let checkpointer = Checkpointer::new(dir.path(), "model");
    let mut learner = Learner::new(
        env(Some(2)),
        RandomAgent::new(0),
        trainer(2),
        checkpointer.clone(),
    );
    learner.learn(4)?;

    let mut resumed = Learner::new(env(Some(2)), RandomAgent::new(1), trainer(2), checkpointer);
    resumed.restore("4", 8, 1)?;
    let outcome = resumed.last_outcome().unwrap();
    assert_eq!(outcome.epochs, 8);
    // Only the remaining epochs are run.
    assert_eq!(resumed.env().stats().resets, 4);
    assert!(resumed.env().stats().closed);

    // The resumed run writes under its own generation.
    let resumed_dir = dir.path().join("model_r1");
    assert!(resumed_dir.join("6").is_dir());
    assert!(resumed_dir.join("8").is_dir());
    assert!(!dir.path().join("model").join("6").exists());
    Ok(())
}

#[test]
fn restore_of_a_missing_checkpoint_fails_and_closes_the_env() {
    let dir = TempDir::new("scv_learner").unwrap();
    let checkpointer = Checkpointer::new(dir.path(), "model");
    let mut learner = Learner::new(env(Some(2)), RandomAgent::new(0), trainer(2), checkpointer);

    assert!(learner.restore("5000", 10, 1).is_err());
    assert!(learner.env().stats().closed);
    assert_eq!(learner.env().stats().steps, 0);
}

#[test]
fn checkpoint_without_metadata_takes_its_epoch_from_the_token() -> Result<()> {
    let dir = TempDir::new("scv_learner")?;
    let checkpointer = Checkpointer::new(dir.path(), "model");
    std::fs::create_dir_all(checkpointer.dir("7"))?;

    let mut learner = Learner::new(env(Some(2)), RandomAgent::new(0), trainer(0), checkpointer);
    learner.restore("7", 9, 2)?;
    assert_eq!(learner.last_outcome().unwrap().epochs, 9);
    assert_eq!(learner.env().stats().resets, 2);
    Ok(())
}
