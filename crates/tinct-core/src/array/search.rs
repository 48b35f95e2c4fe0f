//! Nearest-value search and spacing analysis.

use ndarray::ArrayD;

use super::coerce::ArrayLike;
use crate::error::{TinctError, TinctResult};

/// Relative tolerance under which two spacings are considered the same.
const INTERVAL_TOLERANCE: f64 = 1e-10;

fn flat<A: ArrayLike + ?Sized>(a: &A) -> TinctResult<Vec<f64>> {
    Ok(a.to_array()?.iter().copied().collect())
}

/// For each element of `b`, the flat index of the nearest value in `a`.
///
/// `a` need not be sorted. Ties resolve to the lowest index and NaN entries
/// in `a` are never selected unless `a` holds nothing else.
pub fn closest_indexes<A, B>(a: &A, b: &B) -> TinctResult<Vec<usize>>
where
    A: ArrayLike + ?Sized,
    B: ArrayLike + ?Sized,
{
    let haystack = flat(a)?;
    let needles = flat(b)?;
    if haystack.is_empty() && !needles.is_empty() {
        return Err(TinctError::shape_mismatch(&[1], &[0]));
    }

    Ok(needles
        .iter()
        .map(|needle| {
            let mut best = 0;
            let mut best_distance = f64::INFINITY;
            for (index, value) in haystack.iter().enumerate() {
                let distance = (value - needle).abs();
                if distance < best_distance {
                    best = index;
                    best_distance = distance;
                }
            }
            best
        })
        .collect())
}

/// For each element of `b`, the nearest value in `a`.
pub fn closest<A, B>(a: &A, b: &B) -> TinctResult<Vec<f64>>
where
    A: ArrayLike + ?Sized,
    B: ArrayLike + ?Sized,
{
    let haystack = flat(a)?;
    Ok(closest_indexes(a, b)?
        .into_iter()
        .map(|index| haystack[index])
        .collect())
}

/// Every absolute difference between consecutive elements of `a`.
pub fn interval_all<A: ArrayLike + ?Sized>(a: &A) -> TinctResult<Vec<f64>> {
    let values = flat(a)?;
    Ok(values.windows(2).map(|pair| (pair[1] - pair[0]).abs()).collect())
}

/// The sorted distinct absolute differences between consecutive elements.
///
/// Differences within a relative tolerance of `1e-10` are merged, keeping
/// the smallest. Fewer than two elements give an empty interval.
pub fn interval<A: ArrayLike + ?Sized>(a: &A) -> TinctResult<Vec<f64>> {
    let mut differences = interval_all(a)?;
    differences.sort_by(f64::total_cmp);

    let mut distinct: Vec<f64> = Vec::with_capacity(differences.len());
    for difference in differences {
        match distinct.last() {
            Some(last) if same_spacing(*last, difference) => {}
            _ => distinct.push(difference),
        }
    }
    Ok(distinct)
}

fn same_spacing(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= INTERVAL_TOLERANCE * a.abs().max(b.abs())
}

/// Whether `a` is evenly spaced, i.e. [`interval`] holds exactly one value.
pub fn is_uniform<A: ArrayLike + ?Sized>(a: &A) -> TinctResult<bool> {
    Ok(interval(a)?.len() == 1)
}

/// Element-wise membership of `a` in `b` within `tolerance`, shaped like `a`.
pub fn in_array<A, B>(a: &A, b: &B, tolerance: f64) -> TinctResult<ArrayD<bool>>
where
    A: ArrayLike + ?Sized,
    B: ArrayLike + ?Sized,
{
    let candidates = flat(b)?;
    Ok(a
        .to_array()?
        .mapv(|value| candidates.iter().any(|candidate| (candidate - value).abs() <= tolerance)))
}
