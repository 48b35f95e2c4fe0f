//! Coercion of scalars, nested sequences, and arrays into dense arrays.

use ndarray::{ArrayBase, ArrayD, Data, Dimension, IxDyn};

use super::{FloatArray, IntArray};
use crate::error::{TinctError, TinctResult};
use crate::precision::{FloatPrecision, IntPrecision, float_precision, int_precision};

/// Numeric element types accepted by coercion.
pub trait Scalar: Copy {
    fn to_f64(self) -> f64;
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }

            impl Nested for $ty {
                fn flatten_into(&self, values: &mut Vec<f64>) -> TinctResult<Vec<usize>> {
                    values.push(Scalar::to_f64(*self));
                    Ok(Vec::new())
                }
            }

            impl ArrayLike for $ty {
                fn to_array(&self) -> TinctResult<ArrayD<f64>> {
                    Ok(ArrayD::from_elem(IxDyn(&[]), Scalar::to_f64(*self)))
                }
            }
        )*
    };
}

impl_scalar!(f32, f64, i32, i64, u8, u16, u32);

/// A scalar or a rectangular nesting of sequences of scalars.
pub trait Nested {
    /// Append every element in row-major order and return the shape.
    fn flatten_into(&self, values: &mut Vec<f64>) -> TinctResult<Vec<usize>>;
}

fn flatten_items<T: Nested>(items: &[T], values: &mut Vec<f64>) -> TinctResult<Vec<usize>> {
    let mut inner: Option<Vec<usize>> = None;
    for item in items {
        let shape = item.flatten_into(values)?;
        match &inner {
            None => inner = Some(shape),
            Some(expected) if *expected != shape => {
                return Err(TinctError::shape_mismatch(expected, &shape));
            }
            Some(_) => {}
        }
    }
    let mut shape = vec![items.len()];
    shape.extend(inner.unwrap_or_default());
    Ok(shape)
}

impl<T: Nested> Nested for Vec<T> {
    fn flatten_into(&self, values: &mut Vec<f64>) -> TinctResult<Vec<usize>> {
        flatten_items(self, values)
    }
}

impl<T: Nested> Nested for [T] {
    fn flatten_into(&self, values: &mut Vec<f64>) -> TinctResult<Vec<usize>> {
        flatten_items(self, values)
    }
}

impl<T: Nested, const N: usize> Nested for [T; N] {
    fn flatten_into(&self, values: &mut Vec<f64>) -> TinctResult<Vec<usize>> {
        flatten_items(self, values)
    }
}

/// Anything that can be coerced into a dense `f64` array.
pub trait ArrayLike {
    fn to_array(&self) -> TinctResult<ArrayD<f64>>;
}

fn nested_to_array<T: Nested + ?Sized>(nested: &T) -> TinctResult<ArrayD<f64>> {
    let mut values = Vec::new();
    let shape = nested.flatten_into(&mut values)?;
    ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(|_| {
        TinctError::shape_mismatch(&shape, &[])
    })
}

impl<T: Nested> ArrayLike for Vec<T> {
    fn to_array(&self) -> TinctResult<ArrayD<f64>> {
        nested_to_array(self)
    }
}

impl<T: Nested> ArrayLike for [T] {
    fn to_array(&self) -> TinctResult<ArrayD<f64>> {
        nested_to_array(self)
    }
}

impl<T: Nested, const N: usize> ArrayLike for [T; N] {
    fn to_array(&self) -> TinctResult<ArrayD<f64>> {
        nested_to_array(self)
    }
}

impl<A, S, D> ArrayLike for ArrayBase<S, D>
where
    A: Scalar,
    S: Data<Elem = A>,
    D: Dimension,
{
    fn to_array(&self) -> TinctResult<ArrayD<f64>> {
        Ok(self.mapv(Scalar::to_f64).into_dyn())
    }
}

impl ArrayLike for FloatArray {
    fn to_array(&self) -> TinctResult<ArrayD<f64>> {
        Ok(self.to_f64())
    }
}

impl ArrayLike for IntArray {
    fn to_array(&self) -> TinctResult<ArrayD<f64>> {
        Ok(self.to_i64().mapv(|value| value as f64))
    }
}

impl<T: ArrayLike + ?Sized> ArrayLike for &T {
    fn to_array(&self) -> TinctResult<ArrayD<f64>> {
        (**self).to_array()
    }
}

/// Coerce `a` to a float array at the process-wide float precision.
pub fn as_float_array<A: ArrayLike + ?Sized>(a: &A) -> TinctResult<FloatArray> {
    as_float_array_with(a, float_precision())
}

pub fn as_float_array_with<A: ArrayLike + ?Sized>(a: &A, precision: FloatPrecision) -> TinctResult<FloatArray> {
    Ok(FloatArray::from_f64(a.to_array()?, precision))
}

/// Coerce `a` to an integer array at the process-wide integer precision.
///
/// Values are truncated toward zero. Non-finite values and values outside
/// the precision's range fail with [`TinctError::PrecisionOverflow`].
pub fn as_int_array<A: ArrayLike + ?Sized>(a: &A) -> TinctResult<IntArray> {
    as_int_array_with(a, int_precision())
}

pub fn as_int_array_with<A: ArrayLike + ?Sized>(a: &A, precision: IntPrecision) -> TinctResult<IntArray> {
    let data = a.to_array()?;
    let (lo, hi) = precision.bounds();
    if let Some(value) = data
        .iter()
        .copied()
        .find(|value| !value.is_finite() || value.trunc() < lo || value.trunc() > hi)
    {
        return Err(TinctError::PrecisionOverflow { value, precision });
    }

    Ok(match precision {
        IntPrecision::I32 => IntArray::I32(data.mapv(|value| value as i32)),
        IntPrecision::I64 => IntArray::I64(data.mapv(|value| value as i64)),
    })
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

fn single<T>(shape: &[usize], mut values: impl Iterator<Item = T>) -> TinctResult<T> {
    match values.next() {
        Some(value) if shape.iter().product::<usize>() == 1 => Ok(value),
        _ => Err(TinctError::shape_mismatch(&[1], shape)),
    }
}

/// The single element of `a` as a float at the process-wide float precision.
///
/// Fails with [`TinctError::ShapeMismatch`] unless `a` holds exactly one
/// element.
pub fn as_float<A: ArrayLike + ?Sized>(a: &A) -> TinctResult<f64> {
    let array = as_float_array(a)?;
    array
        .as_scalar()
        .ok_or_else(|| TinctError::shape_mismatch(&[1], array.shape()))
}

/// The single element of `a` truncated to an integer at the process-wide
/// integer precision.
pub fn as_int<A: ArrayLike + ?Sized>(a: &A) -> TinctResult<i64> {
    let ints = as_int_array(a)?.into_i64();
    single(ints.shape(), ints.iter().copied())
}

/// A float array collapsed to a scalar when it holds a single element.
#[derive(Debug, Clone, PartialEq)]
pub enum Numeric {
    Scalar(f64),
    Array(FloatArray),
}

impl Numeric {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(value) => Some(*value),
            Self::Array(_) => None,
        }
    }
}

/// Coerce `a` to a float, or to a float array when it has more or fewer
/// than one element.
pub fn as_numeric<A: ArrayLike + ?Sized>(a: &A) -> TinctResult<Numeric> {
    let array = as_float_array(a)?;
    Ok(match array.as_scalar() {
        Some(value) => Numeric::Scalar(value),
        None => Numeric::Array(array),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::precision::set_int_precision;
    use crate::test_support::global_state_lock;
    use ndarray::arr2;

    #[test]
    fn test_scalar_coerces_to_zero_dim() {
        let array = as_float_array_with(&0.5_f64, FloatPrecision::F64).unwrap();
        assert_eq!(array.ndim(), 0);
        assert_eq!(array.as_scalar(), Some(0.5));

        let from_int = as_float_array_with(&3_u8, FloatPrecision::F64).unwrap();
        assert_eq!(from_int.as_scalar(), Some(3.0));
    }

    #[test]
    fn test_nested_sequences_keep_shape() {
        let nested = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let array = as_float_array_with(&nested, FloatPrecision::F64).unwrap();
        assert_eq!(array.shape(), &[2, 3]);
        assert_eq!(
            array.as_f64().unwrap(),
            &arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).into_dyn()
        );

        let fixed = [[1_i32, 2], [3, 4], [5, 6]];
        assert_eq!(as_float_array_with(&fixed, FloatPrecision::F64).unwrap().shape(), &[3, 2]);

        let empty: Vec<f64> = Vec::new();
        assert_eq!(as_float_array_with(&empty, FloatPrecision::F64).unwrap().shape(), &[0]);
    }

    #[test]
    fn test_ragged_nesting_is_rejected() {
        let ragged = vec![vec![1.0, 2.0], vec![3.0]];
        let err = as_float_array_with(&ragged, FloatPrecision::F64).unwrap_err();
        assert_eq!(err, TinctError::shape_mismatch(&[2], &[1]));
    }

    #[test]
    fn test_existing_arrays_and_precision() {
        let source = arr2(&[[0.1_f64, 0.2], [0.3, 0.4]]);
        let narrow = as_float_array_with(&source, FloatPrecision::F32).unwrap();
        assert_eq!(narrow.precision(), FloatPrecision::F32);
        let widened = narrow.to_f64();
        for (got, expected) in widened.iter().zip(source.iter()) {
            assert!((got - expected).abs() < 1e-7, "expected {expected}, got {got}");
        }

        let view = source.view();
        assert_eq!(as_float_array_with(&view, FloatPrecision::F64).unwrap().shape(), &[2, 2]);
    }

    #[test]
    fn test_int_coercion_truncates_toward_zero() {
        let ints = as_int_array_with(&vec![1.9, -1.9, 0.0, 255.5], IntPrecision::I64).unwrap();
        assert_eq!(ints.to_i64(), ndarray::arr1(&[1, -1, 0, 255]).into_dyn());
    }

    #[test]
    fn test_int_coercion_overflow() {
        let err = as_int_array_with(&vec![1.0, 3.0e9], IntPrecision::I32).unwrap_err();
        assert_eq!(
            err,
            TinctError::PrecisionOverflow {
                value: 3.0e9,
                precision: IntPrecision::I32
            }
        );
        assert!(as_int_array_with(&vec![3.0e9], IntPrecision::I64).is_ok());
        assert!(as_int_array_with(&vec![f64::NAN], IntPrecision::I64).is_err());
        assert!(as_int_array_with(&vec![f64::INFINITY], IntPrecision::I64).is_err());
    }

    #[test]
    fn test_as_int_array_uses_global_precision() {
        let _lock = global_state_lock();
        let before = set_int_precision(IntPrecision::I32);
        let ints = as_int_array(&[1.0_f64, 2.0]).unwrap();
        assert_eq!(ints.precision(), IntPrecision::I32);
        set_int_precision(before);
    }

    #[test]
    fn test_scalar_coercions() {
        let _lock = global_state_lock();
        assert_eq!(as_float(&1_i32), Ok(1.0));
        assert_eq!(as_float(&[1_i32]), Ok(1.0));
        assert_eq!(as_float(&vec![vec![0.25_f64]]), Ok(0.25));
        assert_eq!(as_int(&1.9_f64), Ok(1));
        assert_eq!(as_int(&ndarray::arr1(&[-2.5_f64])), Ok(-2));
    }

    #[test]
    fn test_scalar_coercions_reject_bad_input() {
        let _lock = global_state_lock();
        assert_eq!(
            as_float(&[1.0_f64, 2.0, 3.0]),
            Err(TinctError::shape_mismatch(&[1], &[3]))
        );
        let empty: Vec<f64> = Vec::new();
        assert_eq!(as_int(&empty), Err(TinctError::shape_mismatch(&[1], &[0])));
        assert!(matches!(
            as_int(&f64::NAN),
            Err(TinctError::PrecisionOverflow { .. })
        ));

        let before = set_int_precision(IntPrecision::I32);
        let overflow = as_int(&3.0e9_f64);
        set_int_precision(before);
        assert_eq!(
            overflow,
            Err(TinctError::PrecisionOverflow {
                value: 3.0e9,
                precision: IntPrecision::I32
            })
        );
    }

    #[test]
    fn test_as_numeric_collapses_single_elements() {
        let _lock = global_state_lock();
        assert_eq!(as_numeric(&1_i32).unwrap(), Numeric::Scalar(1.0));
        assert_eq!(as_numeric(&[1_i32]).unwrap().as_scalar(), Some(1.0));

        let Numeric::Array(array) = as_numeric(&[1_i32, 2, 3]).unwrap() else {
            panic!("three elements must stay an array");
        };
        assert_eq!(array.to_f64(), ndarray::arr1(&[1.0, 2.0, 3.0]).into_dyn());
    }

    #[test]
    fn test_recoercing_tagged_arrays() {
        let ints = as_int_array_with(&[4_i64, 5], IntPrecision::I64).unwrap();
        let floats = as_float_array_with(&ints, FloatPrecision::F64).unwrap();
        assert_eq!(floats.to_f64(), ndarray::arr1(&[4.0, 5.0]).into_dyn());
    }
}
