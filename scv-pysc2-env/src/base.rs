//! Wrapper of `pysc2.env.sc2_env.SC2Env`.
use crate::{convert, Sc2EnvConfig};
use anyhow::Result;
use log::{info, trace};
use pyo3::{types::IntoPyDict, PyObject, Python, ToPyObject};
use scv_core::{
    sc2::{FunctionCall, Sc2ActSpec, Sc2Obs, Sc2ObsSpec},
    Env, TimeStep,
};

/// A StarCraft II game run by pysc2.
///
/// The environment controls a single player. Specs are queried once at
/// construction and cached.
pub struct Sc2Env {
    env: PyObject,
    obs_specs: Vec<Sc2ObsSpec>,
    act_specs: Vec<Sc2ActSpec>,
    closed: bool,
}

impl std::fmt::Debug for Sc2Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sc2Env")
            .field("act_specs", &self.act_specs.len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl Env for Sc2Env {
    type Config = Sc2EnvConfig;
    type Obs = Sc2Obs;
    type Act = FunctionCall;
    type ObsSpec = Sc2ObsSpec;
    type ActSpec = Sc2ActSpec;

    /// Constructs [`Sc2Env`] and launches the game.
    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let gil = Python::acquire_gil();
        let py = gil.python();

        // pysc2 reads absl flags, which are unparsed outside of `absl.app`.
        let flags = py.import("absl.flags")?.getattr("FLAGS")?;
        flags.call1((vec!["scv"],))?;

        let sc2_env = py.import("pysc2.env.sc2_env")?;
        let race = sc2_env.getattr("Race")?.getattr(config.race.as_str())?;
        let players = vec![sc2_env.getattr("Agent")?.call1((race,))?];
        let dimensions = sc2_env.getattr("Dimensions")?.call(
            (),
            Some(
                [
                    ("screen", config.screen_size),
                    ("minimap", config.minimap_size),
                ]
                .into_py_dict(py),
            ),
        )?;
        let interface = sc2_env
            .getattr("AgentInterfaceFormat")?
            .call((), Some([("feature_dimensions", dimensions)].into_py_dict(py)))?;

        let kwargs = [
            ("map_name", config.map_name.to_object(py)),
            ("players", players.to_object(py)),
            ("agent_interface_format", interface.to_object(py)),
            ("step_mul", config.step_mul.to_object(py)),
            ("visualize", config.visualize.to_object(py)),
            ("random_seed", seed.to_object(py)),
        ]
        .into_py_dict(py);
        info!(
            "Launching {} (screen {}, minimap {}, step_mul {})",
            config.map_name, config.screen_size, config.minimap_size, config.step_mul
        );
        let env = sc2_env.getattr("SC2Env")?.call((), Some(kwargs))?;

        let obs_specs = convert::obs_specs(env.call_method0("observation_spec")?)?;
        let act_specs = convert::act_specs(env.call_method0("action_spec")?)?;
        info!(
            "Observation spec = {:?}",
            obs_specs.iter().map(|s| &s.shapes).collect::<Vec<_>>()
        );

        Ok(Self {
            env: env.into(),
            obs_specs,
            act_specs,
            closed: false,
        })
    }

    fn observation_spec(&self) -> Vec<Sc2ObsSpec> {
        self.obs_specs.clone()
    }

    fn action_spec(&self) -> Vec<Sc2ActSpec> {
        self.act_specs.clone()
    }

    fn reset(&mut self) -> Result<Vec<TimeStep<Sc2Obs>>> {
        trace!("Sc2Env::reset()");
        Python::with_gil(|py| {
            let ts = self.env.call_method0(py, "reset")?;
            convert::timesteps(py, ts.as_ref(py))
        })
    }

    fn step(&mut self, acts: &[FunctionCall]) -> Result<Vec<TimeStep<Sc2Obs>>> {
        trace!("Sc2Env::step({:?})", acts);
        Python::with_gil(|py| {
            let calls = convert::function_calls(py, acts)?;
            let ts = self.env.call_method1(py, "step", (calls,))?;
            convert::timesteps(py, ts.as_ref(py))
        })
    }

    /// Shuts the game down. Subsequent calls do nothing.
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        Python::with_gil(|py| self.env.call_method0(py, "close"))?;
        self.closed = true;
        info!("Closed Sc2Env");
        Ok(())
    }
}
