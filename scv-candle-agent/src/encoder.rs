//! Flattens StarCraft II observations into network inputs.
use anyhow::{anyhow, Result};
use scv_core::sc2::{Sc2Obs, Sc2ObsSpec};
use serde::{Deserialize, Serialize};

/// Configuration of [`ObsEncoder`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct EncoderConfig {
    /// Side of the grid the screen layers are pooled into.
    pub grid: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self { grid: 8 }
    }
}

/// Sum-pools every screen layer into a `grid x grid` map and appends the
/// player statistics. Every value goes through `ln(1 + x)`, since feature
/// layers carry unit ids and counters in the thousands.
#[derive(Debug, Clone)]
pub struct ObsEncoder {
    grid: usize,
    screen: [usize; 3],
    player_len: usize,
}

fn squash(x: f32) -> f32 {
    x.max(0.0).ln_1p()
}

impl ObsEncoder {
    /// Builds the encoder for observations described by `obs_spec`.
    pub fn build(config: &EncoderConfig, obs_spec: &Sc2ObsSpec) -> Result<Self> {
        let screen = obs_spec
            .screen_shape()
            .ok_or_else(|| anyhow!("Observation spec has no feature_screen shape"))?;
        Ok(Self {
            grid: config.grid.max(1),
            screen,
            player_len: obs_spec.player_len(),
        })
    }

    /// Length of an encoded observation.
    pub fn dim(&self) -> usize {
        self.screen[0] * self.grid * self.grid + self.player_len
    }

    /// Encodes one observation.
    pub fn encode(&self, obs: &Sc2Obs) -> Vec<f32> {
        let g = self.grid;
        let [c, h, w] = self.screen;
        let mut pooled = vec![0f32; c * g * g];

        for ((ch, y, x), &v) in obs.feature_screen.indexed_iter() {
            if ch >= c || y >= h || x >= w {
                continue;
            }
            let cell = (y * g / h) * g + x * g / w;
            pooled[ch * g * g + cell] += v;
        }

        let mut encoded: Vec<f32> = pooled.into_iter().map(squash).collect();
        encoded.extend((0..self.player_len).map(|i| squash(obs.player.get(i).copied().unwrap_or(0.0))));
        encoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scv_core::dummy::{dummy_obs, dummy_obs_spec};

    #[test]
    fn pools_into_the_grid() -> Result<()> {
        let spec = dummy_obs_spec(8);
        let encoder = ObsEncoder::build(&EncoderConfig { grid: 2 }, &spec)?;
        // 2 screen channels, 2x2 cells, 11 player stats
        assert_eq!(encoder.dim(), 2 * 4 + 11);

        let mut obs = dummy_obs(8, vec![0]);
        obs.feature_screen.fill(0.0);
        obs.feature_screen[[0, 0, 0]] = 1.0;
        obs.feature_screen[[0, 3, 3]] = 2.0;
        obs.feature_screen[[1, 7, 7]] = 4.0;
        obs.player[0] = 50.0;

        let encoded = encoder.encode(&obs);
        assert_eq!(encoded.len(), encoder.dim());
        assert!((encoded[0] - 3f32.ln_1p()).abs() < 1e-6);
        assert_eq!(encoded[1..4], [0.0, 0.0, 0.0]);
        assert!((encoded[7] - 4f32.ln_1p()).abs() < 1e-6);
        assert!((encoded[8] - 50f32.ln_1p()).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn spec_without_screen_is_rejected() {
        let spec = Sc2ObsSpec::default();
        assert!(ObsEncoder::build(&EncoderConfig::default(), &spec).is_err());
    }
}
