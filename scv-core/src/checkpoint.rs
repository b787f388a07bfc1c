//! Named, versioned snapshots of agent parameters.
//!
//! A checkpoint lives in `{save_path}/{model_name}/{token}`, where the token
//! is the number of epochs trained when it was written. Besides whatever
//! files [`Agent::save_params`] creates, the directory holds a
//! `checkpoint.yaml` describing the snapshot.
use crate::{Agent, Env};
use anyhow::{Context, Result};
use chrono::Local;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

const INFO_FILE: &str = "checkpoint.yaml";

/// Metadata written next to the parameters of a checkpoint.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CheckpointInfo {
    /// Model name the checkpoint belongs to.
    pub model_name: String,

    /// Algorithm that produced the parameters.
    pub algorithm: String,

    /// Epochs trained when the checkpoint was written.
    pub epoch: usize,

    /// Local time of writing.
    pub saved_at: String,
}

impl CheckpointInfo {
    /// Constructs [`CheckpointInfo`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let info = serde_yaml::from_reader(rdr)?;
        Ok(info)
    }

    /// Saves [`CheckpointInfo`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Writes and reads checkpoints of one model.
#[derive(Debug, Clone)]
pub struct Checkpointer {
    save_path: PathBuf,
    model_name: String,
    algorithm: String,
}

impl Checkpointer {
    /// Constructs a checkpointer for `model_name` under `save_path`.
    pub fn new(save_path: impl Into<PathBuf>, model_name: impl Into<String>) -> Self {
        Self {
            save_path: save_path.into(),
            model_name: model_name.into(),
            algorithm: String::new(),
        }
    }

    /// Sets the algorithm name recorded in the metadata.
    pub fn algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = algorithm.into();
        self
    }

    /// Returns the model name.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Returns a checkpointer writing under another model name.
    pub fn renamed(&self, model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            ..self.clone()
        }
    }

    /// Directory of the checkpoint identified by `token`.
    pub fn dir(&self, token: &str) -> PathBuf {
        self.save_path.join(&self.model_name).join(token)
    }

    /// Saves the parameters of `agent` as the checkpoint of `epoch`.
    pub fn save<E, A>(&self, agent: &A, epoch: usize) -> Result<PathBuf>
    where
        E: Env,
        A: Agent<E> + ?Sized,
    {
        let dir = self.dir(&epoch.to_string());
        std::fs::create_dir_all(&dir)?;
        agent.save_params(&dir)?;
        CheckpointInfo {
            model_name: self.model_name.clone(),
            algorithm: self.algorithm.clone(),
            epoch,
            saved_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
        .save(dir.join(INFO_FILE))?;
        info!("Saved checkpoint {:?}", &dir);
        Ok(dir)
    }

    /// Loads the checkpoint `token` into `agent`.
    ///
    /// Checkpoints without metadata are accepted when the token itself is an
    /// epoch number.
    pub fn restore<E, A>(&self, agent: &mut A, token: &str) -> Result<CheckpointInfo>
    where
        E: Env,
        A: Agent<E> + ?Sized,
    {
        let dir = self.dir(token);
        if !dir.is_dir() {
            anyhow::bail!("Checkpoint {:?} does not exist", dir);
        }
        agent.load_params(&dir)?;

        let info_path = dir.join(INFO_FILE);
        let info = if info_path.is_file() {
            CheckpointInfo::load(&info_path)?
        } else {
            let epoch = token
                .parse::<usize>()
                .with_context(|| format!("No {} in {:?} and token is not an epoch", INFO_FILE, dir))?;
            CheckpointInfo {
                model_name: self.model_name.clone(),
                algorithm: self.algorithm.clone(),
                epoch,
                saved_at: String::new(),
            }
        };
        info!("Restored checkpoint {:?} (epoch {})", &dir, info.epoch);
        Ok(info)
    }
}
