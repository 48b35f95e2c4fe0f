//! Stacking, splitting, and reorientation of arrays.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use ndarray::{Array, Array2, Array3, ArrayD, ArrayView2, Axis, Dimension, IxDyn, RemoveAxis, s};
use serde::{Deserialize, Serialize};

use crate::error::{TinctError, TinctResult};
use crate::mapping::CaseInsensitiveMapping;

/// Stack same-shaped arrays along a new trailing axis.
///
/// `tstack([a, b, c])` of three `(N,)` arrays is an `(N, 3)` array.
pub fn tstack<D>(arrays: &[Array<f64, D>]) -> TinctResult<Array<f64, D::Larger>>
where
    D: Dimension,
    D::Larger: RemoveAxis,
{
    let Some(first) = arrays.first() else {
        return Err(TinctError::shape_mismatch(&[1], &[0]));
    };
    if let Some(other) = arrays.iter().find(|array| array.shape() != first.shape()) {
        return Err(TinctError::shape_mismatch(first.shape(), other.shape()));
    }

    let views: Vec<_> = arrays.iter().map(|array| array.view()).collect();
    ndarray::stack(Axis(first.ndim()), &views)
        .map_err(|_| TinctError::shape_mismatch(first.shape(), &[]))
}

/// Split `a` along its trailing axis, the inverse of [`tstack`].
pub fn tsplit<D: RemoveAxis>(a: &Array<f64, D>) -> TinctResult<Vec<Array<f64, D::Smaller>>> {
    if a.ndim() == 0 {
        return Err(TinctError::shape_mismatch(&[1], &[]));
    }
    Ok(a.axis_iter(Axis(a.ndim() - 1))
        .map(|lane| lane.to_owned())
        .collect())
}

/// Expand each row of an `(N, M)` array into an `(M, M)` diagonal matrix.
///
/// A one-dimensional `(M,)` input is treated as a single row.
pub fn row_as_diagonal(a: &ArrayD<f64>) -> TinctResult<Array3<f64>> {
    let rows: Option<ArrayView2<f64>> = match a.ndim() {
        1 => a.view().insert_axis(Axis(0)).into_dimensionality().ok(),
        2 => a.view().into_dimensionality().ok(),
        _ => None,
    };
    let Some(rows) = rows else {
        return Err(TinctError::ShapeMismatch {
            expected: vec![0, 0],
            found: a.shape().to_vec(),
        });
    };

    let (n, m) = rows.dim();
    let mut out = Array3::zeros((n, m, m));
    for ((row, column), value) in rows.indexed_iter() {
        out[[row, column, column]] = *value;
    }
    Ok(out)
}

/// Reorientation applied by [`orient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Ignore,
    /// Reverse the column order.
    Flip,
    /// Reverse the row order.
    Flop,
    Rotate90Cw,
    Rotate90Ccw,
    Rotate180,
}

impl Orientation {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Ignore => "Ignore",
            Self::Flip => "Flip",
            Self::Flop => "Flop",
            Self::Rotate90Cw => "90 CW",
            Self::Rotate90Ccw => "90 CCW",
            Self::Rotate180 => "180",
        }
    }

    pub fn all() -> &'static [Self] {
        &[
            Self::Ignore,
            Self::Flip,
            Self::Flop,
            Self::Rotate90Cw,
            Self::Rotate90Ccw,
            Self::Rotate180,
        ]
    }

    fn names() -> &'static CaseInsensitiveMapping<Orientation> {
        static NAMES: OnceLock<CaseInsensitiveMapping<Orientation>> = OnceLock::new();
        NAMES.get_or_init(|| {
            Orientation::all()
                .iter()
                .map(|orientation| (orientation.label(), *orientation))
                .collect()
        })
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Orientation {
    type Err = TinctError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::names()
            .get(s)
            .copied()
            .ok_or_else(|| TinctError::InvalidMethod {
                method: s.to_string(),
                valid: Self::all().iter().map(Orientation::label).collect(),
            })
    }
}

/// Reorient a two-dimensional array.
pub fn orient<A: Clone>(a: &Array2<A>, orientation: Orientation) -> Array2<A> {
    match orientation {
        Orientation::Ignore => a.clone(),
        Orientation::Flip => a.slice(s![.., ..;-1]).to_owned(),
        Orientation::Flop => a.slice(s![..;-1, ..]).to_owned(),
        Orientation::Rotate90Cw => a.slice(s![..;-1, ..]).t().as_standard_layout().into_owned(),
        Orientation::Rotate90Ccw => a.slice(s![.., ..;-1]).t().as_standard_layout().into_owned(),
        Orientation::Rotate180 => a.slice(s![..;-1, ..;-1]).to_owned(),
    }
}

/// Weighted mean index of `a` along every axis, floored.
///
/// Fails with [`TinctError::NoFiniteSamples`] when the weights sum to zero or
/// the result is not a valid index.
pub fn centroid(a: &ArrayD<f64>) -> TinctResult<Vec<usize>> {
    (0..a.ndim())
        .map(|axis| {
            let marginals: Vec<f64> = a
                .axis_iter(Axis(axis))
                .map(|slice| slice.sum())
                .collect();
            let total: f64 = marginals.iter().sum();
            let weighted: f64 = marginals
                .iter()
                .enumerate()
                .map(|(position, mass)| position as f64 * mass)
                .sum();

            let coordinate = (weighted / total).floor();
            if coordinate.is_finite() && coordinate >= 0.0 && coordinate < marginals.len() as f64 {
                Ok(coordinate as usize)
            } else {
                Err(TinctError::NoFiniteSamples)
            }
        })
        .collect()
}

/// Select, for every lane along the trailing axis of `a`, the element at the
/// matching entry of `indexes`.
///
/// `indexes` must have the shape of `a` without its trailing axis.
pub fn index_along_last_axis(a: &ArrayD<f64>, indexes: &ArrayD<i64>) -> TinctResult<ArrayD<f64>> {
    let Some((&len, outer)) = a.shape().split_last() else {
        return Err(TinctError::shape_mismatch(&[1], &[]));
    };
    if indexes.shape() != outer {
        return Err(TinctError::shape_mismatch(outer, indexes.shape()));
    }

    let mut values = Vec::with_capacity(indexes.len());
    for (lane, &index) in a.lanes(Axis(a.ndim() - 1)).into_iter().zip(indexes.iter()) {
        let slot = usize::try_from(index)
            .ok()
            .filter(|slot| *slot < len)
            .ok_or(TinctError::IndexOutOfRange { index, len })?;
        values.push(lane[slot]);
    }
    ArrayD::from_shape_vec(IxDyn(outer), values).map_err(|_| TinctError::shape_mismatch(outer, &[]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, arr1, arr2};

    fn ramp_rows() -> Array2<f64> {
        Array2::from_shape_fn((5, 5), |(_, column)| column as f64)
    }

    #[test]
    fn test_tstack_and_tsplit_are_inverse() {
        let a = arr1(&[0.0, 1.0, 2.0]);
        let b = arr1(&[3.0, 4.0, 5.0]);
        let c = arr1(&[6.0, 7.0, 8.0]);
        let stacked = tstack(&[a.clone(), b.clone(), c.clone()]).unwrap();
        assert_eq!(stacked, arr2(&[[0.0, 3.0, 6.0], [1.0, 4.0, 7.0], [2.0, 5.0, 8.0]]));
        assert_eq!(tsplit(&stacked).unwrap(), vec![a, b, c]);
    }

    #[test]
    fn test_tstack_higher_rank() {
        let a = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
        let stacked = tstack(&[a.clone(), a.clone() * 2.0]).unwrap();
        assert_eq!(stacked.shape(), &[2, 2, 2]);
        assert_eq!(stacked[[1, 0, 1]], 6.0);
        assert_eq!(tsplit(&stacked).unwrap()[0], a);
    }

    #[test]
    fn test_tstack_rejects_mismatched_shapes() {
        let err = tstack(&[arr1(&[1.0, 2.0]), arr1(&[1.0])]).unwrap_err();
        assert_eq!(err, TinctError::shape_mismatch(&[2], &[1]));
        let none: [Array1<f64>; 0] = [];
        assert!(tstack(&none).is_err());
    }

    #[test]
    fn test_row_as_diagonal() {
        let a = arr2(&[[0.25, 0.5, 0.75], [1.0, 1.25, 1.5]]).into_dyn();
        let diagonal = row_as_diagonal(&a).unwrap();
        assert_eq!(diagonal.shape(), &[2, 3, 3]);
        assert_eq!(diagonal[[0, 1, 1]], 0.5);
        assert_eq!(diagonal[[1, 2, 2]], 1.5);
        assert_eq!(diagonal[[1, 0, 2]], 0.0);

        let single = row_as_diagonal(&arr1(&[1.0, 2.0]).into_dyn()).unwrap();
        assert_eq!(single.shape(), &[1, 2, 2]);
        assert!(row_as_diagonal(&ArrayD::zeros(IxDyn(&[2, 2, 2]))).is_err());
    }

    #[test]
    fn test_orient() {
        let a = ramp_rows();
        let row = arr1(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let reversed = arr1(&[4.0, 3.0, 2.0, 1.0, 0.0]);

        assert_eq!(orient(&a, Orientation::Ignore), a);
        assert_eq!(orient(&a, Orientation::Flip).row(0), reversed);
        assert_eq!(orient(&a, Orientation::Flop), a);
        assert_eq!(orient(&a, Orientation::Rotate180).row(2), reversed);

        let cw = orient(&a, Orientation::Rotate90Cw);
        let ccw = orient(&a, Orientation::Rotate90Ccw);
        for i in 0..5 {
            assert!(cw.row(i).iter().all(|v| *v == i as f64), "row {i} of 90 CW");
            assert!(ccw.row(i).iter().all(|v| *v == (4 - i) as f64), "row {i} of 90 CCW");
        }
        assert_eq!(cw.column(0), row);
    }

    #[test]
    fn test_orient_non_square() {
        let a = arr2(&[[1, 2, 3], [4, 5, 6]]);
        assert_eq!(orient(&a, Orientation::Rotate90Cw), arr2(&[[4, 1], [5, 2], [6, 3]]));
        assert_eq!(orient(&a, Orientation::Rotate90Ccw), arr2(&[[3, 6], [2, 5], [1, 4]]));
        assert_eq!(orient(&a, Orientation::Flop), arr2(&[[4, 5, 6], [1, 2, 3]]));
    }

    #[test]
    fn test_orientation_names() {
        assert_eq!("flip".parse::<Orientation>(), Ok(Orientation::Flip));
        assert_eq!("90 cw".parse::<Orientation>(), Ok(Orientation::Rotate90Cw));
        assert_eq!("90 CCW".parse::<Orientation>(), Ok(Orientation::Rotate90Ccw));
        assert!(matches!(
            "sideways".parse::<Orientation>(),
            Err(TinctError::InvalidMethod { .. })
        ));
    }

    #[test]
    fn test_centroid() {
        let ramp = Array1::from_iter((0..5).map(f64::from)).into_dyn();
        assert_eq!(centroid(&ramp).unwrap(), vec![3]);

        assert_eq!(centroid(&ramp_rows().into_dyn()).unwrap(), vec![2, 3]);

        let linear = Array2::from_shape_fn((10, 10), |(_, column)| column as f64 / 9.0);
        assert_eq!(centroid(&linear.clone().into_dyn()).unwrap(), vec![4, 6]);

        let stacked = tstack(&[linear.clone(), linear.clone(), linear]).unwrap();
        assert_eq!(centroid(&stacked.into_dyn()).unwrap(), vec![4, 6, 1]);

        assert_eq!(
            centroid(&ArrayD::zeros(IxDyn(&[3]))),
            Err(TinctError::NoFiniteSamples)
        );
    }

    #[test]
    fn test_centroid_past_axis_end_is_rejected() {
        // Negative weights can push the weighted index beyond the last slot.
        assert_eq!(
            centroid(&arr1(&[-1.0, 2.0]).into_dyn()),
            Err(TinctError::NoFiniteSamples)
        );
        assert_eq!(
            centroid(&arr1(&[2.0, -1.0]).into_dyn()),
            Err(TinctError::NoFiniteSamples)
        );
    }

    #[test]
    fn test_index_along_last_axis() {
        let a = arr2(&[[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]).into_dyn();
        let picked = index_along_last_axis(&a, &arr1(&[2, 0]).into_dyn()).unwrap();
        assert_eq!(picked, arr1(&[0.3, 0.4]).into_dyn());

        let err = index_along_last_axis(&a, &arr1(&[0, 3]).into_dyn()).unwrap_err();
        assert_eq!(err, TinctError::IndexOutOfRange { index: 3, len: 3 });

        assert!(index_along_last_axis(&a, &arr1(&[-1, 0]).into_dyn()).is_err());
        assert!(matches!(
            index_along_last_axis(&a, &arr1(&[0, 1, 2]).into_dyn()),
            Err(TinctError::ShapeMismatch { .. })
        ));
    }
}
