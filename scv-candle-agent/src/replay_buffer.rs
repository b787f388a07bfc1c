//! Replay buffer of encoded transitions.
use anyhow::Result;
use scv_core::error::ScvError;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

/// A transition with encoded observations and actions.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EncodedTransition {
    /// Observation before the action.
    pub obs: Vec<f32>,

    /// Action vector.
    pub act: Vec<f32>,

    /// Reward.
    pub reward: f32,

    /// Observation after the action.
    pub next_obs: Vec<f32>,

    /// `true` if the episode terminated with this transition.
    pub is_terminated: bool,
}

/// A batch sampled from [`ReplayBuffer`].
#[derive(Debug, Default)]
pub struct Batch {
    /// Observations.
    pub obs: Vec<Vec<f32>>,

    /// Actions.
    pub act: Vec<Vec<f32>>,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Next observations.
    pub next_obs: Vec<Vec<f32>>,

    /// `1.0` where the episode terminated, `0.0` otherwise.
    pub is_terminated: Vec<f32>,
}

impl Batch {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch has no sample.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }
}

/// Stored contents of [`ReplayBuffer`]; `i` is the next slot to overwrite.
#[derive(Deserialize, Serialize)]
struct Contents<T> {
    i: usize,
    data: T,
}

/// A ring buffer of transitions with uniform sampling.
pub struct ReplayBuffer {
    capacity: usize,
    i: usize,
    data: Vec<EncodedTransition>,
    rng: fastrand::Rng,
}

impl ReplayBuffer {
    /// Constructs an empty buffer.
    pub fn new(capacity: usize, seed: u64) -> Self {
        Self {
            capacity: capacity.max(1),
            i: 0,
            data: Vec::with_capacity(capacity.clamp(1, 1 << 16)),
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Number of stored transitions.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing was pushed yet.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Adds a transition, overwriting the oldest one when full.
    pub fn push(&mut self, tr: EncodedTransition) {
        if self.data.len() < self.capacity {
            self.data.push(tr);
        } else {
            self.data[self.i] = tr;
        }
        self.i = (self.i + 1) % self.capacity;
    }

    /// Writes the stored transitions to `path` with bincode.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = BufWriter::new(File::create(path)?);
        let contents = Contents {
            i: self.i,
            data: &self.data,
        };
        bincode::serialize_into(file, &contents)?;
        Ok(())
    }

    /// Replaces the stored transitions with those saved at `path`.
    ///
    /// Transitions beyond the capacity of this buffer are dropped.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let rdr = BufReader::new(File::open(path)?);
        let contents: Contents<Vec<EncodedTransition>> = bincode::deserialize_from(rdr)?;
        self.data = contents.data;
        self.data.truncate(self.capacity);
        self.i = match self.data.len() < self.capacity {
            true => self.data.len(),
            false => contents.i % self.capacity,
        };
        Ok(())
    }

    /// Samples `size` transitions uniformly, with replacement.
    pub fn batch(&mut self, size: usize) -> Result<Batch> {
        if self.data.len() < size || self.data.is_empty() {
            return Err(ScvError::InsufficientTransitions {
                len: self.data.len(),
                required: size.max(1),
            }
            .into());
        }

        let mut batch = Batch::default();
        for _ in 0..size {
            let tr = &self.data[self.rng.usize(..self.data.len())];
            batch.obs.push(tr.obs.clone());
            batch.act.push(tr.act.clone());
            batch.reward.push(tr.reward);
            batch.next_obs.push(tr.next_obs.clone());
            batch.is_terminated.push(tr.is_terminated as i32 as f32);
        }
        Ok(batch)
    }
}
