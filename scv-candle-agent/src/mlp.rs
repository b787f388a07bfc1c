//! Multilayer perceptron.
mod config;
use anyhow::Result;
use candle_core::{Module, Tensor};
use candle_nn::{linear, Linear, VarBuilder};
pub use config::{Activation, MlpConfig};

/// Returns vector of linear modules from [`MlpConfig`].
fn create_linear_layers(vb: VarBuilder, config: &MlpConfig) -> Result<Vec<Linear>> {
    let mut dims = vec![config.in_dim];
    dims.extend(config.units.iter().copied());
    dims.push(config.out_dim);

    dims.windows(2)
        .enumerate()
        .map(|(i, w)| Ok(linear(w[0], w[1], vb.pp(format!("ln{}", i)))?))
        .collect()
}

/// Multilayer perceptron with ReLU activation in the hidden layers.
pub struct Mlp {
    config: MlpConfig,
    layers: Vec<Linear>,
}

impl Mlp {
    /// Builds the network, registering its variables under `vb`.
    pub fn build(vb: VarBuilder, config: MlpConfig) -> Result<Self> {
        let layers = create_linear_layers(vb, &config)?;
        Ok(Self { config, layers })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MlpConfig {
        &self.config
    }

    /// Forward pass on a batch of shape `[batch_size, in_dim]`.
    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let n_layers = self.layers.len();
        let mut xs = xs.clone();

        for layer in &self.layers[..n_layers - 1] {
            xs = layer.forward(&xs)?.relu()?;
        }
        let xs = self.layers[n_layers - 1].forward(&xs)?;

        Ok(match self.config.activation_out {
            Activation::None => xs,
            Activation::Tanh => xs.tanh()?,
            Activation::Relu => xs.relu()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    #[test]
    fn output_shape_and_activation() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let config = MlpConfig::new(5, vec![16, 16], 3, Activation::Tanh);
        let mlp = Mlp::build(vb.pp("actor"), config)?;

        let xs = Tensor::randn(0f32, 10f32, (4, 5), &Device::Cpu)?;
        let ys = mlp.forward(&xs)?;
        assert_eq!(ys.dims(), &[4, 3]);
        for row in ys.to_vec2::<f32>()? {
            assert!(row.iter().all(|v| v.abs() <= 1.0));
        }

        // three layers, weight and bias each
        assert_eq!(varmap.all_vars().len(), 6);
        Ok(())
    }
}
