//! NaN detection and replacement.

use std::str::FromStr;

use ndarray::{Array, Dimension};
use serde::{Deserialize, Serialize};

use crate::error::{TinctError, TinctResult};
use crate::mapping::validate_method;

/// How [`fill_nan`] replaces NaN entries.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum FillNan {
    /// Linear interpolation over the flat index, clamped at both ends.
    #[default]
    Interpolation,
    /// A fixed value.
    Constant(f64),
    /// The nearest non-NaN sample by flat index, ties to the lower index.
    Nearest,
}

impl FillNan {
    pub const METHODS: [&'static str; 3] = ["Interpolation", "Constant", "Nearest"];

    /// Resolve a method name, using `default` as the value for `"Constant"`.
    pub fn from_method(method: &str, default: f64) -> TinctResult<Self> {
        match validate_method(method, &Self::METHODS)? {
            "Constant" => Ok(Self::Constant(default)),
            "Nearest" => Ok(Self::Nearest),
            _ => Ok(Self::Interpolation),
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Interpolation => "Interpolation",
            Self::Constant(_) => "Constant",
            Self::Nearest => "Nearest",
        }
    }
}

impl FromStr for FillNan {
    type Err = TinctError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_method(s, 0.0)
    }
}

/// Whether every element of `a` is NaN. An empty array qualifies.
pub fn has_only_nan<D: Dimension>(a: &Array<f64, D>) -> bool {
    a.iter().all(|value| value.is_nan())
}

/// Replace NaN entries of `a` according to `method`.
///
/// Interpolation and nearest-neighbour filling need at least one sample that
/// is not NaN and fail with [`TinctError::NoFiniteSamples`] otherwise.
pub fn fill_nan<D: Dimension>(a: &Array<f64, D>, method: FillNan) -> TinctResult<Array<f64, D>> {
    if !a.iter().any(|value| value.is_nan()) {
        return Ok(a.clone());
    }
    if let FillNan::Constant(value) = method {
        return Ok(a.mapv(|sample| if sample.is_nan() { value } else { sample }));
    }

    let values: Vec<f64> = a.iter().copied().collect();
    let known: Vec<usize> = values
        .iter()
        .enumerate()
        .filter(|(_, value)| !value.is_nan())
        .map(|(index, _)| index)
        .collect();
    if known.is_empty() {
        return Err(TinctError::NoFiniteSamples);
    }

    let filled: Vec<f64> = values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            if !value.is_nan() {
                return *value;
            }
            // Position of the first known sample after `index`.
            let after = known.partition_point(|known_index| *known_index < index);
            let left = after.checked_sub(1).map(|slot| known[slot]);
            let right = known.get(after).copied();
            match (left, right, method) {
                (Some(left), Some(right), FillNan::Interpolation) => {
                    let t = (index - left) as f64 / (right - left) as f64;
                    values[left] + t * (values[right] - values[left])
                }
                (Some(left), Some(right), _) => {
                    if index - left <= right - index {
                        values[left]
                    } else {
                        values[right]
                    }
                }
                (Some(edge), None, _) | (None, Some(edge), _) => values[edge],
                (None, None, _) => f64::NAN,
            }
        })
        .collect();

    Array::from_shape_vec(a.raw_dim(), filled)
        .map_err(|_| TinctError::shape_mismatch(a.shape(), &[]))
}
