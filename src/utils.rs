use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use num_traits::Float;

/// smallest non-NaN value, `None` if every value is NaN
pub(crate) fn nanmin<'a, F, I>(values: I) -> Option<F>
where
    F: Float + 'a,
    I: IntoIterator<Item = &'a F>,
{
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, &v| match acc {
            Some(m) if m <= v => Some(m),
            _ => Some(v),
        })
}

/// largest non-NaN value, `None` if every value is NaN
pub(crate) fn nanmax<'a, F, I>(values: I) -> Option<F>
where
    F: Float + 'a,
    I: IntoIterator<Item = &'a F>,
{
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, &v| match acc {
            Some(m) if m >= v => Some(m),
            _ => Some(v),
        })
}

/// mean of the non-NaN values, NaN if there are none
pub(crate) fn nanmean<'a, F, I>(values: I) -> F
where
    F: Float + 'a,
    I: IntoIterator<Item = &'a F>,
{
    let (sum, count) = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold((F::zero(), 0usize), |(sum, count), &v| (sum + v, count + 1));

    if count == 0 {
        F::nan()
    } else {
        sum / F::from(count).unwrap_or_else(F::nan)
    }
}

/// plain mean; a single NaN makes the result NaN
pub(crate) fn mean<'a, F, I>(values: I) -> F
where
    F: Float + 'a,
    I: IntoIterator<Item = &'a F>,
{
    let (sum, count) = values
        .into_iter()
        .fold((F::zero(), 0usize), |(sum, count), &v| (sum + v, count + 1));

    if count == 0 {
        F::nan()
    } else {
        sum / F::from(count).unwrap_or_else(F::nan)
    }
}

/// `nanmax - nanmin` of every lane along `axis`, NaN for all-NaN lanes
pub(crate) fn nan_ptp(arr: ArrayView2<f64>, axis: Axis) -> Array1<f64> {
    arr.map_axis(axis, |lane| match (nanmin(lane.iter()), nanmax(lane.iter())) {
        (Some(lo), Some(hi)) => (hi - lo).abs(),
        _ => f64::NAN,
    })
}

/// nanmean of every lane along `axis`
pub(crate) fn nanmean_axis(arr: ArrayView2<f64>, axis: Axis) -> Array1<f64> {
    arr.map_axis(axis, |lane| nanmean(lane.iter()))
}

/// Sorted unique values together with the index of every input value in the
/// sorted list. NaN values sort last and all NaNs share one slot.
pub(crate) fn unique_with_inverse(values: ArrayView1<f64>) -> (Vec<f64>, Vec<usize>) {
    // adding zero folds -0.0 into 0.0
    let values: Vec<f64> = values.iter().map(|v| v + 0.0).collect();
    let mut unique = values.clone();
    unique.sort_by(|a, b| a.total_cmp(b));
    unique.dedup_by(|a, b| a == b || (a.is_nan() && b.is_nan()));

    let inverse = values
        .iter()
        .map(|v| {
            if v.is_nan() {
                unique.len() - 1
            } else {
                unique.partition_point(|u| u.total_cmp(v).is_lt())
            }
        })
        .collect();

    (unique, inverse)
}

/// index of the non-NaN entry closest to `target`
pub(crate) fn nearest_index(values: ArrayView1<f64>, target: f64) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .map(|(i, v)| (i, (v - target).abs()))
        .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
            Some((_, bd)) if bd <= d => best,
            _ => Some((i, d)),
        })
        .map(|(i, _)| i)
}

/// Piecewise linear interpolation of `(xs, zs)` evaluated at `at`.
///
/// Samples with a NaN coordinate are discarded and the rest are sorted by
/// coordinate. Queries outside the sampled range give NaN, and so does any query
/// whose bracketing segment touches a NaN value.
pub(crate) fn interp1d(xs: ArrayView1<f64>, zs: ArrayView1<f64>, at: ArrayView1<f64>) -> Array1<f64> {
    let mut samples: Vec<(f64, f64)> = xs
        .iter()
        .zip(zs.iter())
        .filter(|(x, _)| !x.is_nan())
        .map(|(&x, &z)| (x, z))
        .collect();
    samples.sort_by(|a, b| a.0.total_cmp(&b.0));

    at.mapv(|q| {
        let (first, last) = match (samples.first(), samples.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return f64::NAN,
        };

        if q.is_nan() || q < first.0 || q > last.0 {
            return f64::NAN;
        }

        // first sample with coordinate >= q
        let hi = samples.partition_point(|s| s.0 < q);
        if samples[hi].0 == q {
            return samples[hi].1;
        }

        let (x0, z0) = samples[hi - 1];
        let (x1, z1) = samples[hi];
        z0 + (z1 - z0) * (q - x0) / (x1 - x0)
    })
}

/// `n` evenly spaced values from `start` to `end` inclusive
pub(crate) fn linspace(start: f64, end: f64, n: usize) -> Array1<f64> {
    Array1::linspace(start, end, n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn nan_reductions_skip_nan() {
        let values = [f64::NAN, 3.0, -1.0, f64::NAN, 2.0];
        assert_eq!(nanmin(values.iter()), Some(-1.0));
        assert_eq!(nanmax(values.iter()), Some(3.0));
        assert!((nanmean(values.iter()) - 4.0 / 3.0).abs() < 1e-12);

        let empty = [f64::NAN, f64::NAN];
        assert_eq!(nanmin(empty.iter()), None);
        assert!(nanmean(empty.iter()).is_nan());
        assert!(mean([1.0, f64::NAN].iter()).is_nan());
    }

    #[test]
    fn unique_inverse_matches_sorted_rank() {
        let values = array![3.0, 1.0, 2.0, 1.0, 3.0];
        let (unique, inverse) = unique_with_inverse(values.view());

        assert_eq!(unique, vec![1.0, 2.0, 3.0]);
        assert_eq!(inverse, vec![2, 0, 1, 0, 2]);
    }

    #[test]
    fn interp1d_is_nan_outside_range() {
        let xs = array![2.0, 0.0, 1.0];
        let zs = array![20.0, 0.0, 10.0];
        let at = array![-0.5, 0.0, 0.5, 1.5, 2.0, 2.5];

        let out = interp1d(xs.view(), zs.view(), at.view());

        assert!(out[0].is_nan());
        assert_eq!(out[1], 0.0);
        assert_eq!(out[2], 5.0);
        assert_eq!(out[3], 15.0);
        assert_eq!(out[4], 20.0);
        assert!(out[5].is_nan());
    }

    #[test]
    fn ptp_along_axis() {
        let arr = array![[0.0, 1.0, 2.0], [0.0, f64::NAN, 4.0]];
        let across_columns = nan_ptp(arr.view(), Axis(1));
        let across_rows = nan_ptp(arr.view(), Axis(0));

        assert_eq!(across_columns.to_vec(), vec![2.0, 4.0]);
        assert_eq!(across_rows.to_vec(), vec![0.0, 0.0, 2.0]);
    }
}
