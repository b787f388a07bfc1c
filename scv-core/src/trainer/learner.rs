use super::{Trainer, TrainingOutcome};
use crate::{
    checkpoint::Checkpointer,
    record::{LogRecorder, Recorder},
    Agent, EpisodeLoop, Env, Policy, TimeStep, TrainableAgent,
};
use anyhow::Result;
use log::{info, warn};

/// Owns an environment, an agent and a [`Trainer`] for the lifetime of a run
/// and exposes them as a [`TrainableAgent`].
///
/// The environment is closed when `learn` or `restore` returns, whether
/// training finished, was interrupted or failed.
pub struct Learner<E: Env, A: Agent<E>> {
    env: E,
    agent: A,
    trainer: Trainer,
    checkpointer: Checkpointer,
    recorder: Box<dyn Recorder>,
    is_setup: bool,
    last_outcome: Option<TrainingOutcome>,
}

impl<E, A> Learner<E, A>
where
    E: Env,
    A: Agent<E>,
{
    /// Constructs a learner logging its records with [`LogRecorder`].
    pub fn new(env: E, agent: A, trainer: Trainer, checkpointer: Checkpointer) -> Self {
        Self {
            env,
            agent,
            trainer,
            checkpointer,
            recorder: Box::new(LogRecorder::new()),
            is_setup: false,
            last_outcome: None,
        }
    }

    /// Sets the recorder.
    pub fn recorder(mut self, recorder: Box<dyn Recorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// Returns the environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Returns the agent.
    pub fn agent(&self) -> &A {
        &self.agent
    }

    /// Returns the outcome of the last `learn` or `restore`.
    pub fn last_outcome(&self) -> Option<TrainingOutcome> {
        self.last_outcome
    }

    fn setup_agent(&mut self) -> Result<()> {
        if !self.is_setup {
            EpisodeLoop::setup(&self.env, &mut self.agent)?;
            self.is_setup = true;
        }
        Ok(())
    }

    fn close_env(&mut self) {
        match self.env.close() {
            Ok(()) => info!("Closed the environment"),
            Err(e) => warn!("Failed to close the environment: {:#}", e),
        }
    }

    fn train_range(
        &mut self,
        checkpointer: &Checkpointer,
        start_epoch: usize,
        epochs: usize,
    ) -> Result<TrainingOutcome> {
        let outcome = self.trainer.train(
            &mut self.env,
            &mut self.agent,
            checkpointer,
            self.recorder.as_mut(),
            start_epoch,
            epochs,
        )?;
        self.last_outcome = Some(outcome);
        Ok(outcome)
    }

    fn resume(&mut self, token: &str, epochs: usize, restore_token: usize) -> Result<()> {
        self.setup_agent()?;
        let info = self
            .checkpointer
            .restore::<E, A>(&mut self.agent, token)?;

        // Later checkpoints of the resumed run go next to, not over, the original ones.
        let checkpointer = self.checkpointer.renamed(format!(
            "{}_r{}",
            self.checkpointer.model_name(),
            restore_token
        ));
        if info.epoch >= epochs {
            info!(
                "Checkpoint {} already covers {} of {} epochs",
                token, info.epoch, epochs
            );
        }
        self.train_range(&checkpointer, info.epoch, epochs)?;
        Ok(())
    }
}

impl<E, A> Policy<E> for Learner<E, A>
where
    E: Env,
    A: Agent<E>,
{
    fn setup(&mut self, obs_spec: &E::ObsSpec, act_spec: &E::ActSpec) -> Result<()> {
        self.agent.setup(obs_spec, act_spec)?;
        self.is_setup = true;
        Ok(())
    }

    fn reset(&mut self) {
        self.agent.reset();
    }

    fn step(&mut self, timestep: &TimeStep<E::Obs>) -> Result<E::Act> {
        self.agent.step(timestep)
    }
}

impl<E, A> TrainableAgent<E> for Learner<E, A>
where
    E: Env,
    A: Agent<E>,
{
    fn learn(&mut self, epochs: usize) -> Result<()> {
        info!("Start training for {} epochs", epochs);
        let result = self.setup_agent().and_then(|_| {
            let checkpointer = self.checkpointer.clone();
            self.train_range(&checkpointer, 0, epochs).map(|_| ())
        });
        self.close_env();
        result
    }

    fn restore(&mut self, token: &str, epochs: usize, restore_token: usize) -> Result<()> {
        info!(
            "Restore checkpoint {} of {} and train until epoch {}",
            token,
            self.checkpointer.model_name(),
            epochs
        );
        let result = self.resume(token, epochs, restore_token);
        self.close_env();
        result
    }
}
