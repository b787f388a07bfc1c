//! Train [`Agent`].
mod config;
mod learner;
use crate::{
    checkpoint::Checkpointer,
    record::{Record, RecordValue, RecordValue::Scalar, Recorder},
    Agent, EpisodeEnd, EpisodeLoop, Env, ShutdownSignal,
};
use anyhow::Result;
use chrono::Local;
pub use config::TrainerConfig;
pub use learner::Learner;
use log::{info, warn};

/// Result of a call to [`Trainer::train`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingOutcome {
    /// Number of completed epochs, counted from the start of training.
    pub epochs: usize,

    /// `true` if the user stopped the run.
    pub interrupted: bool,
}

/// Manages the epoch loop.
///
/// # Training loop
///
/// 0. Given an environment, an agent implementing [`Agent`], a
///    [`Checkpointer`] and a [`Recorder`].
/// 1. Run an episode with [`EpisodeLoop`]. Every transition is handed to
///    [`Agent::observe`], which decides on its own whether to update its
///    parameters (warm-up, update cadence, trajectory truncation).
/// 2. Unless the user interrupted the episode, call [`Agent::end_episode`]
///    and count the epoch.
/// 3. Store episode length and return in the recorder; flush every
///    `record_interval` epochs.
/// 4. Every `save_epochs` epochs, save a checkpoint.
/// 5. Back to 1 until the requested number of epochs is reached.
///
/// An interrupt ends the loop after the current step; the partial epoch is
/// neither counted nor checkpointed.
pub struct Trainer {
    config: TrainerConfig,
    shutdown: ShutdownSignal,
}

impl Trainer {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig) -> Self {
        Self {
            config,
            shutdown: ShutdownSignal::new(),
        }
    }

    /// Sets the signal that interrupts training.
    pub fn shutdown_signal(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    fn save_checkpoint<E, A>(checkpointer: &Checkpointer, agent: &A, epoch: usize)
    where
        E: Env,
        A: Agent<E> + ?Sized,
    {
        if let Err(e) = checkpointer.save::<E, A>(agent, epoch) {
            warn!("Failed to save checkpoint of epoch {}: {:#}", epoch, e);
        }
    }

    /// Trains `agent` from epoch `start_epoch` until `epochs` epochs are done.
    pub fn train<E, A>(
        &self,
        env: &mut E,
        agent: &mut A,
        checkpointer: &Checkpointer,
        recorder: &mut dyn Recorder,
        start_epoch: usize,
        epochs: usize,
    ) -> Result<TrainingOutcome>
    where
        E: Env,
        A: Agent<E> + ?Sized,
    {
        let episode_loop = EpisodeLoop::new(self.config.max_steps_per_episode)
            .shutdown_signal(self.shutdown.clone());
        let mut epoch = start_epoch;
        let mut interrupted = false;
        agent.train();

        while epoch < epochs {
            let (stats, last_obs) = episode_loop.run_with(env, agent, |agent, transition| {
                if let Some(record) = agent.observe(transition)? {
                    recorder.store(record);
                }
                Ok(())
            })?;

            if stats.end == EpisodeEnd::Interrupted {
                interrupted = true;
                break;
            }

            if let Some(record) = agent.end_episode(&last_obs, &stats)? {
                recorder.store(record);
            }
            epoch += 1;

            recorder.store(Record::from_slice(&[
                ("episode_steps", Scalar(stats.steps as f32)),
                ("episode_reward", Scalar(stats.total_reward)),
                ("finished_at", RecordValue::DateTime(Local::now())),
            ]));
            if self.config.record_interval > 0 && epoch % self.config.record_interval == 0 {
                recorder.flush(epoch as i64);
            }

            if self.config.save_epochs > 0 && epoch % self.config.save_epochs == 0 {
                Self::save_checkpoint::<E, A>(checkpointer, agent, epoch);
            }
        }

        match interrupted {
            true => info!("Training interrupted by the user after {} epochs", epoch),
            false => info!("Training finished after {} epochs", epoch),
        }

        Ok(TrainingOutcome {
            epochs: epoch,
            interrupted,
        })
    }
}
