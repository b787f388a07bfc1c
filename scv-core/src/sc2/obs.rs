//! Observations.
use ndarray::Array3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of scalar statistics in the `player` observation of pysc2.
pub const PLAYER_STATS: usize = 11;

/// Observation of one agent at one step.
///
/// Only the fields the agents in this workspace read are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Sc2Obs {
    /// Ids of the functions that can be called at this step.
    pub available_actions: Vec<usize>,

    /// Screen feature layers, shape `(channels, height, width)`.
    pub feature_screen: Array3<f32>,

    /// Minimap feature layers, shape `(channels, height, width)`.
    pub feature_minimap: Array3<f32>,

    /// Scalar player statistics (minerals, vespene, food, ...).
    pub player: Vec<f32>,
}

impl Sc2Obs {
    /// Returns `true` if `function` can be called at this step.
    pub fn is_available(&self, function: usize) -> bool {
        self.available_actions.contains(&function)
    }
}

/// Shapes of the observation fields, keyed by pysc2 field name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Sc2ObsSpec {
    /// Shape of every field.
    pub shapes: BTreeMap<String, Vec<usize>>,
}

impl Sc2ObsSpec {
    /// Constructs a spec for the given screen and minimap layers.
    pub fn new(screen: [usize; 3], minimap: [usize; 3]) -> Self {
        let mut shapes = BTreeMap::new();
        shapes.insert("feature_screen".to_string(), screen.to_vec());
        shapes.insert("feature_minimap".to_string(), minimap.to_vec());
        shapes.insert("player".to_string(), vec![PLAYER_STATS]);
        Self { shapes }
    }

    /// Adds or replaces the shape of a field.
    pub fn with_shape(mut self, name: impl Into<String>, shape: Vec<usize>) -> Self {
        self.shapes.insert(name.into(), shape);
        self
    }

    /// Shape of a field.
    pub fn shape(&self, name: &str) -> Option<&[usize]> {
        self.shapes.get(name).map(|v| v.as_slice())
    }

    /// `(channels, height, width)` of the screen layers.
    pub fn screen_shape(&self) -> Option<[usize; 3]> {
        match self.shape("feature_screen") {
            Some(&[c, h, w]) => Some([c, h, w]),
            _ => None,
        }
    }

    /// Length of the player statistics.
    pub fn player_len(&self) -> usize {
        self.shape("player")
            .and_then(|s| s.first().copied())
            .unwrap_or(PLAYER_STATS)
    }
}
