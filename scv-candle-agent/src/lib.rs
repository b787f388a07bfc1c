//! DDPG and PPO agents for StarCraft II, implemented with
//! [candle](https://crates.io/crates/candle-core).
//!
//! Both agents implement [`scv_core::Agent`] for any environment speaking
//! the [`scv_core::sc2`] data model. Their networks are built in
//! [`Policy::setup`](scv_core::Policy::setup) from the specs the
//! environment reports.
pub mod ddpg;
pub mod encoder;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod ppo;
pub mod replay_buffer;
pub mod util;
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq, Default)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    #[default]
    Cpu,

    /// The GPU device of the given ordinal.
    Cuda(usize),
}

impl Device {
    /// Opens the device.
    pub fn build(&self) -> Result<candle_core::Device> {
        Ok(match self {
            Self::Cpu => candle_core::Device::Cpu,
            Self::Cuda(n) => candle_core::Device::new_cuda(*n)?,
        })
    }
}
