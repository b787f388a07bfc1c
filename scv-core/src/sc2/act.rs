//! Actions.
use crate::error::ScvError;
use serde::{Deserialize, Serialize};

/// A call of a game function with its arguments.
///
/// Each argument is a vector with one integer per dimension declared in the
/// corresponding [`ArgumentSpec::sizes`], e.g. `[x, y]` for a screen point.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FunctionCall {
    /// Function id.
    pub function: usize,

    /// Ordered arguments.
    pub arguments: Vec<Vec<i64>>,
}

impl FunctionCall {
    /// Constructs a call.
    pub fn new(function: usize, arguments: Vec<Vec<i64>>) -> Self {
        Self {
            function,
            arguments,
        }
    }

    /// The `no_op` function call.
    pub fn no_op() -> Self {
        Self::new(0, vec![])
    }
}

/// An argument type of a game function.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArgumentSpec {
    /// Argument type id.
    pub id: usize,

    /// Argument type name, e.g. `screen` or `queued`.
    pub name: String,

    /// Exclusive upper bound of every integer of the argument.
    pub sizes: Vec<usize>,
}

impl ArgumentSpec {
    /// Returns `true` for two-dimensional point arguments.
    pub fn is_spatial(&self) -> bool {
        self.sizes.len() == 2
    }
}

/// A game function and the arguments it takes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FunctionSpec {
    /// Function id.
    pub id: usize,

    /// Function name, e.g. `Move_screen`.
    pub name: String,

    /// Argument types, in call order.
    pub args: Vec<ArgumentSpec>,
}

/// The action spec of one agent: every game function.
///
/// Function ids are indices into [`Sc2ActSpec::functions`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Sc2ActSpec {
    /// All functions.
    pub functions: Vec<FunctionSpec>,
}

fn scale(v: f32, size: usize) -> i64 {
    let max = size.saturating_sub(1) as f32;
    (v.clamp(0.0, 1.0) * max).round() as i64
}

impl Sc2ActSpec {
    /// Constructs the spec.
    pub fn new(functions: Vec<FunctionSpec>) -> Self {
        Self { functions }
    }

    /// Returns the number of functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns `true` if no function is declared.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Returns the spec of a function.
    pub fn function(&self, id: usize) -> Option<&FunctionSpec> {
        self.functions.get(id)
    }

    /// `(width, height)` of the screen point arguments, if any function takes one.
    pub fn screen_size(&self) -> Option<(usize, usize)> {
        self.functions
            .iter()
            .flat_map(|f| f.args.iter())
            .find(|a| a.name == "screen" && a.is_spatial())
            .map(|a| (a.sizes[0], a.sizes[1]))
    }

    /// Checks that `call` names an available function and that every
    /// argument lies within its declared bounds.
    pub fn is_valid(&self, call: &FunctionCall, available: &[usize]) -> bool {
        if !available.contains(&call.function) {
            return false;
        }
        let Some(spec) = self.function(call.function) else {
            return false;
        };
        spec.args.len() == call.arguments.len()
            && spec.args.iter().zip(call.arguments.iter()).all(|(a, v)| {
                a.sizes.len() == v.len()
                    && a.sizes
                        .iter()
                        .zip(v.iter())
                        .all(|(&size, &x)| x >= 0 && (x as usize) < size)
            })
    }

    /// Builds a call of `function` aimed at a normalised point.
    ///
    /// `point` is `(x, y)` in `[0, 1]`; spatial arguments receive the point
    /// scaled to their own sizes, other arguments receive zeros.
    pub fn call_at(&self, function: usize, point: (f32, f32)) -> Result<FunctionCall, ScvError> {
        let spec = self
            .function(function)
            .ok_or(ScvError::UnknownFunction(function))?;
        let arguments = spec
            .args
            .iter()
            .map(|a| {
                if a.is_spatial() {
                    vec![scale(point.0, a.sizes[0]), scale(point.1, a.sizes[1])]
                } else {
                    vec![0; a.sizes.len()]
                }
            })
            .collect();
        Ok(FunctionCall::new(function, arguments))
    }

    /// Normalised point of the first spatial argument of `call`, if any.
    pub fn point_of(&self, call: &FunctionCall) -> Option<(f32, f32)> {
        let spec = self.function(call.function)?;
        let (a, v) = spec
            .args
            .iter()
            .zip(call.arguments.iter())
            .find(|(a, _)| a.is_spatial())?;
        let norm = |x: i64, size: usize| {
            if size <= 1 {
                0.0
            } else {
                x as f32 / (size - 1) as f32
            }
        };
        Some((
            norm(*v.first()?, *a.sizes.first()?),
            norm(*v.get(1)?, *a.sizes.get(1)?),
        ))
    }
}
