//! A network owning its variables and its optimizer.
use crate::{
    mlp::{Mlp, MlpConfig},
    opt::{Optimizer, OptimizerConfig},
};
use anyhow::{bail, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use std::path::Path;

/// An [`Mlp`] together with the [`VarMap`] holding its parameters.
///
/// Target networks are built without an optimizer and only change through
/// [`track`](crate::util::track).
pub struct Model {
    varmap: VarMap,
    mlp: Mlp,
    opt: Option<Optimizer>,
}

impl Model {
    /// Builds a network whose variables are prefixed with `prefix`.
    ///
    /// A network and its target must share the prefix so that their
    /// variables can be matched by name.
    pub fn build(
        prefix: &str,
        config: MlpConfig,
        opt_config: Option<&OptimizerConfig>,
        device: &Device,
    ) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let mlp = Mlp::build(vb.pp(prefix), config)?;
        let opt = match opt_config {
            Some(opt_config) => Some(opt_config.build(varmap.all_vars())?),
            None => None,
        };

        Ok(Self { varmap, mlp, opt })
    }

    /// Forward pass.
    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        self.mlp.forward(xs)
    }

    /// Takes one optimization step on `loss`.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        match self.opt.as_mut() {
            Some(opt) => opt.backward_step(loss),
            None => bail!("Network has no optimizer"),
        }
    }

    /// Returns the variables.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Saves the parameters as a safetensors file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.varmap.save(path.as_ref())?;
        info!("Save network to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads the parameters from a safetensors file.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.varmap.load(path.as_ref())?;
        info!("Load network from {:?}", path.as_ref());
        Ok(())
    }
}
