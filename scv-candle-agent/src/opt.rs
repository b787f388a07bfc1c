//! Optimizers.
use anyhow::Result;
use candle_core::{Tensor, Var};
use candle_nn::{AdamW, Optimizer as _, ParamsAdamW};
use serde::{Deserialize, Serialize};

/// Configuration of the Adam optimizer used by both actor and critic.
///
/// A non-zero `weight_decay` turns it into AdamW.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Learning rate.
    pub lr: f64,

    /// Decay rates of the first and second moments.
    pub betas: (f64, f64),

    /// Term added to the denominator for numerical stability.
    pub eps: f64,

    /// Decoupled weight decay; zero gives plain Adam.
    pub weight_decay: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        let p = ParamsAdamW::default();
        Self {
            lr: 3e-4,
            betas: (p.beta1, p.beta2),
            eps: p.eps,
            weight_decay: 0.0,
        }
    }
}

impl OptimizerConfig {
    /// Adam with the given learning rate.
    pub fn adam(lr: f64) -> Self {
        Self {
            lr,
            ..Self::default()
        }
    }

    /// Sets the weight decay.
    pub fn weight_decay(mut self, v: f64) -> Self {
        self.weight_decay = v;
        self
    }

    /// Constructs the optimizer over `vars`.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        let params = ParamsAdamW {
            lr: self.lr,
            beta1: self.betas.0,
            beta2: self.betas.1,
            eps: self.eps,
            weight_decay: self.weight_decay,
        };
        Ok(Optimizer {
            inner: AdamW::new(vars, params)?,
            n_steps: 0,
        })
    }
}

/// Wraps [`candle_nn::AdamW`] and counts the steps taken.
pub struct Optimizer {
    inner: AdamW,
    n_steps: usize,
}

impl Optimizer {
    /// Backpropagates `loss` and updates the parameters.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.inner.backward_step(loss)?;
        self.n_steps += 1;
        Ok(())
    }

    /// Number of updates applied so far.
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// Current learning rate.
    pub fn learning_rate(&self) -> f64 {
        self.inner.learning_rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};

    #[test]
    fn steps_move_parameters_downhill() -> Result<()> {
        let w = Var::zeros(1, DType::F32, &Device::Cpu)?;
        let mut opt = OptimizerConfig::adam(0.1).build(vec![w.clone()])?;
        assert_eq!(opt.learning_rate(), 0.1);

        // loss = (w - 1)^2
        for _ in 0..5 {
            let loss = (w.as_tensor() - 1.0)?.sqr()?.sum_all()?;
            opt.backward_step(&loss)?;
        }
        assert_eq!(opt.n_steps(), 5);
        let w = w.as_tensor().to_vec1::<f32>()?[0];
        assert!(w > 0.0 && w <= 1.0, "{}", w);
        Ok(())
    }
}
