//! Conversion between pysc2 objects and [`scv_core::sc2`] values.
use anyhow::{anyhow, Result};
use ndarray::{Array3, Ix3};
use numpy::PyArrayDyn;
use pyo3::{
    types::{IntoPyDict, PyList},
    PyAny, PyObject, Python, ToPyObject,
};
use scv_core::{
    sc2::{ArgumentSpec, FunctionCall, FunctionSpec, Sc2ActSpec, Sc2Obs, Sc2ObsSpec},
    StepType, TimeStep,
};

/// Maps the integer value of `pysc2.env.environment.StepType`.
pub(crate) fn step_type_of(v: i64) -> Result<StepType> {
    match v {
        0 => Ok(StepType::First),
        1 => Ok(StepType::Mid),
        2 => Ok(StepType::Last),
        _ => Err(anyhow!("Unknown step type {}", v)),
    }
}

fn as_f32_array<'py>(py: Python<'py>, obj: &'py PyAny) -> Result<&'py PyArrayDyn<f32>> {
    let np = py.import("numpy")?;
    let kwargs = [("dtype", "float32")].into_py_dict(py);
    let arr = np.getattr("asarray")?.call((obj,), Some(kwargs))?;
    Ok(arr.extract()?)
}

fn layers(py: Python, obj: &PyAny) -> Result<Array3<f32>> {
    let arr = as_f32_array(py, obj)?.to_owned_array();
    Ok(arr.into_dimensionality::<Ix3>()?)
}

fn obs(py: Python, obj: &PyAny) -> Result<Sc2Obs> {
    let available_actions: Vec<usize> = obj
        .get_item("available_actions")?
        .call_method0("tolist")?
        .extract()?;
    let feature_screen = layers(py, obj.get_item("feature_screen")?)?;
    let feature_minimap = layers(py, obj.get_item("feature_minimap")?)?;
    let player = as_f32_array(py, obj.get_item("player")?)?
        .to_owned_array()
        .iter()
        .copied()
        .collect();

    Ok(Sc2Obs {
        available_actions,
        feature_screen,
        feature_minimap,
        player,
    })
}

/// Converts a sequence of pysc2 timesteps.
pub(crate) fn timesteps(py: Python, obj: &PyAny) -> Result<Vec<TimeStep<Sc2Obs>>> {
    let mut ts = vec![];
    for t in obj.iter()? {
        let t = t?;
        let step_type = step_type_of(t.getattr("step_type")?.extract()?)?;
        let reward: f32 = t.getattr("reward")?.extract()?;
        let discount: f32 = t.getattr("discount")?.extract()?;
        let observation = obs(py, t.getattr("observation")?)?;
        ts.push(TimeStep::new(step_type, reward, discount, observation));
    }
    Ok(ts)
}

/// Converts the tuple returned by `SC2Env.observation_spec()`.
///
/// Entries whose shape is not a sequence of integers are skipped.
pub(crate) fn obs_specs(obj: &PyAny) -> Result<Vec<Sc2ObsSpec>> {
    let mut specs = vec![];
    for spec in obj.iter()? {
        let mut s = Sc2ObsSpec::default();
        for item in spec?.call_method0("items")?.iter()? {
            let (name, shape): (String, &PyAny) = item?.extract()?;
            if let Ok(shape) = shape.extract::<Vec<usize>>() {
                s = s.with_shape(name, shape);
            }
        }
        specs.push(s);
    }
    Ok(specs)
}

/// Converts the tuple of `ValidActions` returned by `SC2Env.action_spec()`.
pub(crate) fn act_specs(obj: &PyAny) -> Result<Vec<Sc2ActSpec>> {
    let mut specs = vec![];
    for valid in obj.iter()? {
        let mut functions = vec![];
        for f in valid?.getattr("functions")?.iter()? {
            let f = f?;
            let mut args = vec![];
            for a in f.getattr("args")?.iter()? {
                let a = a?;
                args.push(ArgumentSpec {
                    id: a.getattr("id")?.extract()?,
                    name: a.getattr("name")?.extract()?,
                    sizes: a.getattr("sizes")?.extract()?,
                });
            }
            functions.push(FunctionSpec {
                id: f.getattr("id")?.extract()?,
                name: f.getattr("name")?.extract()?,
                args,
            });
        }
        specs.push(Sc2ActSpec::new(functions));
    }
    Ok(specs)
}

/// Builds a list of `pysc2.lib.actions.FunctionCall`.
pub(crate) fn function_calls(py: Python, acts: &[FunctionCall]) -> Result<PyObject> {
    let ctor = py.import("pysc2.lib.actions")?.getattr("FunctionCall")?;
    let mut calls = vec![];
    for a in acts {
        calls.push(ctor.call1((a.function, a.arguments.clone()))?);
    }
    Ok(PyList::new(py, calls).to_object(py))
}
