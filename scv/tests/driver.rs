use anyhow::Result;
use scv::{registry, run, RunConfig};
use scv_core::{
    checkpoint::CheckpointInfo,
    dummy::{DummySc2Env, DummySc2EnvConfig},
    sc2::{FunctionCall, Sc2ActSpec, Sc2Obs, Sc2ObsSpec},
    AgentRegistry, Policy, ShutdownSignal, TimeStep, TrainableAgent,
};
use std::{cell::RefCell, rc::Rc};
use tempdir::TempDir;

type Calls = Rc<RefCell<Vec<String>>>;

/// Records the capability calls it receives.
struct FakeAgent {
    name: &'static str,
    calls: Calls,
}

impl Policy<DummySc2Env> for FakeAgent {
    fn setup(&mut self, _: &Sc2ObsSpec, _: &Sc2ActSpec) -> Result<()> {
        Ok(())
    }

    fn step(&mut self, _: &TimeStep<Sc2Obs>) -> Result<FunctionCall> {
        Ok(FunctionCall::no_op())
    }
}

impl TrainableAgent<DummySc2Env> for FakeAgent {
    fn learn(&mut self, epochs: usize) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("{}.learn({})", self.name, epochs));
        Ok(())
    }

    fn restore(&mut self, token: &str, epochs: usize, restore_token: usize) -> Result<()> {
        self.calls.borrow_mut().push(format!(
            "{}.restore({}, {}, {})",
            self.name, token, epochs, restore_token
        ));
        Ok(())
    }
}

/// A registry of fake `ddpg` and `ppo` agents; building one is logged as `build`.
fn fake_registry(calls: &Calls) -> AgentRegistry<DummySc2Env, RunConfig> {
    let mut registry = AgentRegistry::new();
    for name in ["ddpg", "ppo"] {
        let calls = calls.clone();
        registry = registry.register(name, move |_: &RunConfig| {
            calls.borrow_mut().push(format!("{}.build", name));
            let agent: Box<dyn TrainableAgent<DummySc2Env>> = Box::new(FakeAgent {
                name,
                calls: calls.clone(),
            });
            Ok(agent)
        });
    }
    registry
}

fn small_config(dir: &TempDir, algorithm: &str) -> RunConfig {
    let mut config = RunConfig::default().algorithm(algorithm);
    config.common.epochs = 3;
    config.common.units = vec![8];
    config.ddpg.warmup_steps = 4;
    config.ddpg.update_steps = 4;
    config.ddpg.batch_size = 2;
    config.ppo.actor_train_iterations = 2;
    config.ppo.critic_train_iterations = 2;
    config.saving.save_path = dir.path().to_path_buf();
    config.saving.model_name = "model".to_string();
    config.saving.save_epochs = 1;
    config
}

#[test]
fn unknown_algorithm_builds_nothing() -> Result<()> {
    let calls = Calls::default();
    run(&RunConfig::default().algorithm("A2C"), &fake_registry(&calls))?;
    assert!(calls.borrow().is_empty());

    // The real registry would launch a game for a known name.
    let dir = TempDir::new("scv_driver")?;
    let registry = registry::<DummySc2Env>(DummySc2EnvConfig::default(), ShutdownSignal::new());
    run(&small_config(&dir, "sarsa"), &registry)?;
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}

#[test]
fn restore_disabled_only_learns() -> Result<()> {
    let calls = Calls::default();
    let mut config = RunConfig::default();
    config.common.epochs = 12;
    run(&config, &fake_registry(&calls))?;
    assert_eq!(*calls.borrow(), vec!["ddpg.build", "ddpg.learn(12)"]);
    Ok(())
}

#[test]
fn restore_enabled_restores_before_any_epoch() -> Result<()> {
    let calls = Calls::default();
    let mut config = RunConfig::default();
    config.common.epochs = 12;
    config.restore.enabled = true;
    config.restore.token = "10".to_string();
    config.restore.restore_token = 3;
    run(&config, &fake_registry(&calls))?;
    assert_eq!(*calls.borrow(), vec!["ddpg.build", "ddpg.restore(10, 12, 3)"]);
    Ok(())
}

#[test]
fn ppo_name_selects_ppo() -> Result<()> {
    for name in ["PPO", "ppo", "Ppo"] {
        let calls = Calls::default();
        run(&RunConfig::default().algorithm(name), &fake_registry(&calls))?;
        assert_eq!(*calls.borrow(), vec!["ppo.build", "ppo.learn(10000)"]);
    }

    let calls = Calls::default();
    run(&RunConfig::default().algorithm("DDPG"), &fake_registry(&calls))?;
    assert_eq!(calls.borrow()[0], "ddpg.build");
    Ok(())
}

#[test]
fn registered_algorithms_train_and_checkpoint() -> Result<()> {
    for name in ["DDPG", "PPO", "random"] {
        let dir = TempDir::new("scv_driver")?;
        let config = small_config(&dir, name);
        let registry =
            registry::<DummySc2Env>(DummySc2EnvConfig::default(), ShutdownSignal::new());
        run(&config, &registry)?;

        let checkpointer = config.checkpointer();
        for epoch in ["1", "2", "3"] {
            assert!(checkpointer.dir(epoch).is_dir(), "{} {}", name, epoch);
        }
        let info = CheckpointInfo::load(checkpointer.dir("3").join("checkpoint.yaml"))?;
        assert_eq!(info.algorithm, name.to_lowercase());
        assert_eq!(info.epoch, 3);
    }
    Ok(())
}

#[test]
fn random_agent_resumes_under_a_new_model_name() -> Result<()> {
    let dir = TempDir::new("scv_driver")?;
    let mut config = small_config(&dir, "random");
    let registry = registry::<DummySc2Env>(DummySc2EnvConfig::default(), ShutdownSignal::new());
    run(&config, &registry)?;

    config.common.epochs = 5;
    config.restore.enabled = true;
    config.restore.token = "2".to_string();
    config.restore.restore_token = 1;
    run(&config, &registry)?;

    let resumed = dir.path().join("model_r1");
    assert!(!resumed.join("2").exists());
    for epoch in ["3", "4", "5"] {
        assert!(resumed.join(epoch).is_dir(), "{}", epoch);
    }
    // The original checkpoints are left untouched.
    assert!(!dir.path().join("model").join("4").exists());
    Ok(())
}
