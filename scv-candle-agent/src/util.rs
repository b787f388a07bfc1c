//! Utilities.
use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use candle_nn::VarMap;
use log::trace;

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
pub fn track(dest: &VarMap, src: &VarMap, tau: f64) -> Result<()> {
    trace!("track(tau = {})", tau);
    let dest = dest.data().lock().map_err(|_| anyhow!("VarMap lock poisoned"))?;
    let src = src.data().lock().map_err(|_| anyhow!("VarMap lock poisoned"))?;

    for (k_dest, v_dest) in dest.iter() {
        let v_src = src
            .get(k_dest)
            .ok_or_else(|| anyhow!("Variable {} not found in the source", k_dest))?;
        let t_dest = ((tau * v_src.as_tensor())? + (1.0 - tau) * v_dest.as_tensor())?;
        v_dest.set(&t_dest)?;
    }

    Ok(())
}

/// Stacks rows of equal length into a `[rows, len]` tensor.
pub fn rows_to_tensor(rows: &[Vec<f32>], device: &Device) -> Result<Tensor> {
    let n = rows.len();
    let d = rows.first().map(|r| r.len()).unwrap_or(0);
    let data: Vec<f32> = rows.iter().flat_map(|r| r.iter().copied()).collect();
    if data.len() != n * d {
        return Err(anyhow!("Rows of unequal length"));
    }
    Ok(Tensor::from_vec(data, (n, d), device)?)
}

/// Index of the largest value among `candidates`.
pub fn argmax_among(values: &[f32], candidates: &[usize]) -> Option<usize> {
    candidates
        .iter()
        .copied()
        .filter(|&i| i < values.len())
        .fold(None, |best: Option<usize>, i| match best {
            Some(b) if values[b] >= values[i] => Some(b),
            _ => Some(i),
        })
}
