use crate::prelude::*;

use ndarray::Axis;

/// half the width of the window drawn around a dimension with a single cell
const SINGLE_CELL_HALF_WIDTH: f64 = 0.5;

/// Corner coordinates of every cell from the cell center coordinates `x` and `y`.
///
/// Both outputs have shape `(R + 1) x (C + 1)` for `R x C` inputs. `x` is expanded
/// along the rows and `y` down the columns, see the [module documentation](`crate::mesh`).
/// The inputs are not modified.
///
/// # Example
///
/// ```
/// use sweepgrid::ndarray::array;
///
/// let x = array![[0.0, 1.0, 2.0], [0.0, 1.0, 2.0]];
/// let y = array![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];
///
/// let (xq, yq) = sweepgrid::quadrilaterals(x.view(), y.view());
///
/// assert_eq!(xq.dim(), (3, 4));
/// assert_eq!(xq.row(0).to_vec(), vec![-0.5, 0.5, 1.5, 2.5]);
/// assert_eq!(yq.column(0).to_vec(), vec![-0.5, 0.5, 1.5]);
/// ```
pub fn quadrilaterals(x: ArrayView2<f64>, y: ArrayView2<f64>) -> (Array2<f64>, Array2<f64>) {
    let (rows, cols) = x.dim();

    if rows == 0 || cols == 0 {
        let empty = Array2::from_elem((rows + 1, cols + 1), f64::NAN);
        return (empty.clone(), empty);
    }

    let x_corners = grow(corners_along(x, Axis(1)), Axis(0));
    let y_corners = grow(corners_along(y, Axis(0)), Axis(1));

    (x_corners, y_corners)
}

/// one more coordinate along `axis`, on the boundaries between the cells
fn corners_along(centers: ArrayView2<f64>, axis: Axis) -> Array2<f64> {
    let n = centers.len_of(axis);

    let mut shape = [centers.nrows(), centers.ncols()];
    shape[axis.index()] += 1;
    let mut corners = Array2::from_elem((shape[0], shape[1]), f64::NAN);

    for (lane, mut out) in centers.lanes(axis).into_iter().zip(corners.lanes_mut(axis)) {
        let mut v = lane.to_vec();

        if n == 1 {
            out[0] = v[0] - SINGLE_CELL_HALF_WIDTH;
            out[1] = v[0] + SINGLE_CELL_HALF_WIDTH;
            continue;
        }

        if n > 2 {
            if v[0].is_nan() {
                v[0] = 2.0 * v[1] - v[2];
            }
            if v[n - 1].is_nan() {
                v[n - 1] = 2.0 * v[n - 2] - v[n - 3];
            }
        }

        let mut padded = Vec::with_capacity(n + 2);
        padded.push(2.0 * v[0] - v[1]);
        padded.extend_from_slice(&v);
        padded.push(2.0 * v[n - 1] - v[n - 2]);

        for (corner, pair) in out.iter_mut().zip(padded.windows(2)) {
            *corner = pair[0] + (pair[1] - pair[0]) / 2.0;
        }
    }

    corners
}

/// Add one lane across `axis`. Normally the first lane is duplicated in front;
/// if the first lane has a NaN (an unfinished scan) the last one is duplicated at
/// the end instead. A single lane is always duplicated at the end.
fn grow(corners: Array2<f64>, axis: Axis) -> Array2<f64> {
    let m = corners.len_of(axis);
    let first_has_nan = corners.index_axis(axis, 0).iter().any(|v| v.is_nan());

    let indices: Vec<usize> = if m == 1 || first_has_nan {
        (0..m).chain(std::iter::once(m - 1)).collect()
    } else {
        std::iter::once(0).chain(0..m).collect()
    };

    corners.select(axis, &indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-12, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn corners_have_one_more_row_and_column() {
        for (rows, cols) in [(1, 1), (1, 4), (4, 1), (2, 2), (3, 5), (6, 3)] {
            let x = Array2::from_shape_fn((rows, cols), |(_, c)| c as f64);
            let y = Array2::from_shape_fn((rows, cols), |(r, _)| r as f64);

            let (xq, yq) = quadrilaterals(x.view(), y.view());
            assert_eq!(xq.dim(), (rows + 1, cols + 1));
            assert_eq!(yq.dim(), (rows + 1, cols + 1));
        }
    }

    #[test]
    fn single_cells_get_a_unit_window() {
        let x = array![[3.0]];
        let y = array![[-1.0]];
        let (xq, yq) = quadrilaterals(x.view(), y.view());

        assert_eq!(xq, array![[2.5, 3.5], [2.5, 3.5]]);
        assert_eq!(yq, array![[-1.5, -1.5], [-0.5, -0.5]]);
    }

    #[test]
    fn nan_edges_are_extrapolated() {
        // the scan stopped before the last two cells of the second row
        let x = array![[0.0, 1.0, 2.0, 3.0], [0.0, 1.0, f64::NAN, f64::NAN]];
        let y = array![[0.0, 0.0, 0.0, 0.0], [1.0, 1.0, f64::NAN, f64::NAN]];

        let (xq, yq) = quadrilaterals(x.view(), y.view());

        // x of the first row is complete, so it is duplicated in front
        assert_close(&xq.row(0).to_vec(), &[-0.5, 0.5, 1.5, 2.5, 3.5]);
        assert_eq!(xq.row(0), xq.row(1));

        // only the last center of the second row is extrapolated
        let second = xq.row(2);
        assert_close(&second.to_vec()[..2], &[-0.5, 0.5]);
        assert!(second[2].is_nan());

        assert_close(&yq.column(1).to_vec(), &[-0.5, 0.5, 1.5]);
        assert!(yq.column(3).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn leading_nan_lanes_duplicate_the_last_one() {
        let x = array![[f64::NAN, f64::NAN], [0.0, 1.0]];
        let y = array![[0.0, 0.0], [1.0, 1.0]];

        let (xq, _) = quadrilaterals(x.view(), y.view());
        assert_eq!(xq.dim(), (3, 3));
        assert!(xq.row(0).iter().all(|v| v.is_nan()));
        assert_eq!(xq.row(1), xq.row(2));
    }

    #[test]
    fn inputs_are_not_modified() {
        let x = array![[f64::NAN, 1.0, 2.0]];
        let y = array![[0.0, 0.0, 0.0]];
        let (xq, _) = quadrilaterals(x.view(), y.view());

        assert!(x[[0, 0]].is_nan());
        assert_close(&xq.row(0).to_vec(), &[-0.5, 0.5, 1.5, 2.5]);
    }
}
