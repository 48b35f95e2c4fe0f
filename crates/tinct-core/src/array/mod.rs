//! Array coercion, validation, and reshaping helpers.

pub mod coerce;
pub mod nan;
pub mod search;
pub mod stack;

pub use coerce::{
    ArrayLike, Nested, Numeric, Scalar, as_float, as_float_array, as_float_array_with, as_int, as_int_array,
    as_int_array_with, as_numeric,
};
pub use nan::{FillNan, fill_nan, has_only_nan};
pub use search::{closest, closest_indexes, in_array, interval, interval_all, is_uniform};
pub use stack::{Orientation, centroid, index_along_last_axis, orient, row_as_diagonal, tsplit, tstack};

use ndarray::{ArrayD, IxDyn};

use crate::precision::{FloatPrecision, IntPrecision, float_precision};

/// A dense float array tagged with the precision it was coerced to.
#[derive(Debug, Clone, PartialEq)]
pub enum FloatArray {
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

impl FloatArray {
    /// Narrow `data` to `precision`.
    pub fn from_f64(data: ArrayD<f64>, precision: FloatPrecision) -> Self {
        match precision {
            FloatPrecision::F32 => Self::F32(data.mapv(|value| value as f32)),
            FloatPrecision::F64 => Self::F64(data),
        }
    }

    pub const fn precision(&self) -> FloatPrecision {
        match self {
            Self::F32(_) => FloatPrecision::F32,
            Self::F64(_) => FloatPrecision::F64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Self::F32(data) => data.shape(),
            Self::F64(data) => data.shape(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_f64(&self) -> Option<&ArrayD<f64>> {
        match self {
            Self::F64(data) => Some(data),
            Self::F32(_) => None,
        }
    }

    pub fn as_f32(&self) -> Option<&ArrayD<f32>> {
        match self {
            Self::F32(data) => Some(data),
            Self::F64(_) => None,
        }
    }

    /// Widen to `f64` regardless of the stored precision.
    pub fn to_f64(&self) -> ArrayD<f64> {
        match self {
            Self::F32(data) => data.mapv(f64::from),
            Self::F64(data) => data.clone(),
        }
    }

    pub fn into_f64(self) -> ArrayD<f64> {
        match self {
            Self::F32(data) => data.mapv(f64::from),
            Self::F64(data) => data,
        }
    }

    /// The single element of a zero-dimensional or one-element array.
    pub fn as_scalar(&self) -> Option<f64> {
        if self.len() != 1 {
            return None;
        }
        match self {
            Self::F32(data) => data.iter().next().map(|value| f64::from(*value)),
            Self::F64(data) => data.iter().next().copied(),
        }
    }
}

/// A dense integer array tagged with the precision it was coerced to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntArray {
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
}

impl IntArray {
    pub const fn precision(&self) -> IntPrecision {
        match self {
            Self::I32(_) => IntPrecision::I32,
            Self::I64(_) => IntPrecision::I64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Self::I32(data) => data.shape(),
            Self::I64(data) => data.shape(),
        }
    }

    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_i64(&self) -> ArrayD<i64> {
        match self {
            Self::I32(data) => data.mapv(i64::from),
            Self::I64(data) => data.clone(),
        }
    }

    pub fn into_i64(self) -> ArrayD<i64> {
        match self {
            Self::I32(data) => data.mapv(i64::from),
            Self::I64(data) => data,
        }
    }
}

/// Array of `shape` filled with zeros at the current float precision.
pub fn zeros(shape: &[usize]) -> FloatArray {
    full(shape, 0.0)
}

/// Array of `shape` filled with ones at the current float precision.
pub fn ones(shape: &[usize]) -> FloatArray {
    full(shape, 1.0)
}

/// Array of `shape` filled with `value` at the current float precision.
pub fn full(shape: &[usize], value: f64) -> FloatArray {
    FloatArray::from_f64(ArrayD::from_elem(IxDyn(shape), value), float_precision())
}
