use crate::grid::Cells;
use crate::prelude::*;
use crate::utils;

use ndarray::{Axis, Slice};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Per column histogram of `z` over `bins` equal bins spanning `min..=max`.
/// NaN and out of range values are not counted, the last bin includes `max`.
fn column_histograms(z: ArrayView2<f64>, min: f64, max: f64, bins: usize) -> Array2<f64> {
    let width = (max - min) / bins as f64;

    let histogram = |col: usize| -> Vec<f64> {
        let mut counts = vec![0.0; bins];

        for &value in z.column(col).iter() {
            if !(min..=max).contains(&value) {
                continue;
            }

            let idx = (((value - min) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1.0;
        }

        counts
    };

    #[cfg(feature = "parallel")]
    let columns: Vec<Vec<f64>> = (0..z.ncols()).into_par_iter().map(histogram).collect();
    #[cfg(not(feature = "parallel"))]
    let columns: Vec<Vec<f64>> = (0..z.ncols()).map(histogram).collect();

    Array2::from_shape_fn((bins, z.ncols()), |(bin, col)| columns[col][bin])
}

impl Grid2D {
    /// Keep the columns `left..right` and rows `bottom..top`. A negative `right`
    /// or `top` counts from the end, `-1` being one past the last index.
    ///
    /// Bounds that do not select at least one row and column inside the grid give
    /// [`Error::Bounds`] and leave the grid untouched.
    pub fn crop(&mut self, left: isize, right: isize, bottom: isize, top: isize) -> Result<(), Error> {
        let (rows, cols) = self.shape();
        let (nrows, ncols) = (rows as isize, cols as isize);

        let right_end = if right < 0 { ncols + right + 1 } else { right };
        let top_end = if top < 0 { nrows + top + 1 } else { top };

        let inside = |lo: isize, hi: isize, n: isize| lo < hi && 0 <= lo && lo <= n && 0 <= hi && hi <= n;

        if !(inside(left, right_end, ncols) && inside(bottom, top_end, nrows)) {
            return Err(Error::Bounds {
                left,
                right,
                bottom,
                top,
                rows,
                cols,
            });
        }

        self.select(
            Slice::from(bottom..top_end),
            Slice::from(left..right_end),
        );

        Ok(())
    }

    /// Keep the even (`0, 2, ..`) or the odd (`1, 3, ..`) rows.
    pub fn even_odd(&mut self, even: bool) {
        let start = if even { 0 } else { 1 };
        self.select(Slice::new(start, None, 2), Slice::from(..));
    }

    /// Reverse the order of the columns (`x`) and/or of the rows (`y`).
    pub fn flip(&mut self, x: bool, y: bool) {
        if !(x || y) {
            return;
        }

        let reverse = |flip: bool| if flip { Slice::new(0, None, -1) } else { Slice::from(..) };
        self.select(reverse(y), reverse(x));
    }

    /// Flip the axes that run backwards, see [`Grid2D::is_flipped`].
    pub fn autoflip(&mut self) {
        let (x, y) = self.is_flipped();
        self.flip(x, y);
    }

    /// Replace every column with a histogram of its values.
    ///
    /// The result has `bins` rows placed at the bin centers between `min` and
    /// `max`; every column keeps the mean `x` of the column it came from.
    pub fn hist2d(&mut self, min: f64, max: f64, bins: usize) -> Result<(), Error> {
        if bins == 0 {
            return Err(Error::Parameter("a histogram needs at least one bin".into()));
        }

        if !(min < max) {
            return Err(Error::Parameter(format!(
                "histogram range {min}..{max} is empty"
            )));
        }

        let z = column_histograms(self.z().view(), min, max, bins);

        let edges = utils::linspace(min, max, bins + 1);
        let centers: Vec<f64> = (0..bins).map(|i| (edges[i] + edges[i + 1]) / 2.0).collect();
        let column_x = utils::nanmean_axis(self.x().view(), Axis(0));

        let shape = z.dim();
        let x = Array2::from_shape_fn(shape, |(_, c)| column_x[c]);
        let y = Array2::from_shape_fn(shape, |(r, _)| centers[r]);

        tracing::debug!(bins, min, max, "replaced columns by histograms");

        self.replace_cells(Cells::from_xyz(x, y, z))
    }

    /// Subtract a plane with the given slopes that is zero at the center of the
    /// coordinate range.
    pub fn sub_plane(&mut self, x_slope: f64, y_slope: f64) {
        let limits = self.limits();
        let x_center = (limits.xmin + limits.xmax) / 2.0;
        let y_center = (limits.ymin + limits.ymax) / 2.0;

        let plane = ndarray::Zip::from(self.x())
            .and(self.y())
            .map_collect(|x, y| x_slope * (x - x_center) + y_slope * (y - y_center));

        self.update_z(|z| *z -= &plane);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::tests::three_by_three;
    use ndarray::array;

    fn numbered() -> Grid2D {
        let mut cells = three_by_three().into_cells();
        cells.row_numbers = Array2::from_shape_fn((3, 3), |(r, c)| Some(3 * r + c));
        Grid2D::from_cells(cells, GridMeta::default()).unwrap()
    }

    #[test]
    fn crop_the_three_by_three() {
        let mut grid = numbered();
        grid.crop(0, 2, 0, 2).unwrap();

        assert_eq!(grid.z(), &array![[1.0, 2.0], [4.0, 5.0]]);
        assert_eq!(grid.row_numbers()[[1, 1]], Some(4));
        assert_eq!(grid.x_setpoints().dim(), (2, 2));
    }

    #[test]
    fn negative_bounds_count_from_the_end() {
        let mut grid = numbered();
        grid.crop(1, -1, 0, -2).unwrap();

        assert_eq!(grid.shape(), (2, 2));
        assert_eq!(grid.z(), &array![[2.0, 3.0], [5.0, 6.0]]);
    }

    #[test]
    fn crop_law() {
        let (rows, cols) = (4isize, 5isize);

        for left in -1..=cols + 1 {
            for right in -cols - 2..=cols + 1 {
                let mut grid = Grid2D::new(
                    Array2::zeros((rows as usize, cols as usize)),
                    Array2::zeros((rows as usize, cols as usize)),
                    Array2::zeros((rows as usize, cols as usize)),
                )
                .unwrap();

                let end = if right < 0 { cols + right + 1 } else { right };
                let valid = 0 <= left && left < end && end <= cols;

                match grid.crop(left, right, 1, -1) {
                    Ok(()) => {
                        assert!(valid, "{left} {right}");
                        assert_eq!(grid.shape(), (3, (end - left) as usize));
                    }
                    Err(Error::Bounds { left: l, right: r, rows, cols, .. }) => {
                        assert!(!valid, "{left} {right}");
                        assert_eq!((l, r, rows, cols), (left, right, 4, 5));
                        assert_eq!(grid.shape(), (4, 5));
                    }
                    Err(other) => panic!("unexpected error {other}"),
                }
            }
        }
    }

    #[test]
    fn extreme_bounds_are_rejected() {
        let mut grid = numbered();

        for (left, right, bottom, top) in [
            (0, isize::MIN, 0, -1),
            (0, -1, 0, isize::MIN),
            (isize::MIN, isize::MAX, 0, -1),
            (0, isize::MAX, 0, -1),
        ] {
            let err = grid.crop(left, right, bottom, top);
            assert!(matches!(err, Err(Error::Bounds { .. })), "{left} {right} {bottom} {top}");
        }

        assert_eq!(grid, numbered());
    }

    #[test]
    fn even_and_odd_rows() {
        let mut even = numbered();
        even.even_odd(true);
        assert_eq!(even.z(), &array![[1.0, 2.0, 3.0], [7.0, 8.0, 9.0]]);
        assert_eq!(even.row_numbers()[[1, 0]], Some(6));

        let mut odd = numbered();
        odd.even_odd(false);
        assert_eq!(odd.y().column(0).to_vec(), vec![1.0]);
    }

    #[test]
    fn flip_moves_every_matrix() {
        let mut grid = numbered();
        grid.flip(true, false);

        assert_eq!(grid.z().row(0).to_vec(), vec![3.0, 2.0, 1.0]);
        assert_eq!(grid.x().row(2).to_vec(), vec![2.0, 1.0, 0.0]);
        assert_eq!(grid.row_numbers()[[0, 0]], Some(2));
        assert_eq!(grid.is_flipped(), (true, false));

        grid.flip(false, true);
        assert_eq!(grid.z()[[0, 0]], 9.0);

        grid.autoflip();
        assert_eq!(grid, numbered());
    }

    #[test]
    fn column_histograms_with_bin_centers() {
        let mut grid = Grid2D::new(
            array![[0.0, 1.0], [0.0, 1.0], [0.0, 1.0], [0.0, 1.0]],
            array![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]],
            array![[0.1, 5.0], [0.2, 1.0], [0.9, f64::NAN], [1.0, -1.0]],
        )
        .unwrap();

        grid.hist2d(0.0, 1.0, 2).unwrap();

        assert_eq!(grid.shape(), (2, 2));
        assert_eq!(grid.z(), &array![[2.0, 0.0], [2.0, 1.0]]);
        assert_eq!(grid.y().column(1).to_vec(), vec![0.25, 0.75]);
        assert_eq!(grid.x().row(1).to_vec(), vec![0.0, 1.0]);
        assert_eq!(grid.row_numbers()[[0, 0]], None);
    }

    #[test]
    fn histogram_parameters_are_checked() {
        let mut grid = three_by_three();
        assert!(matches!(grid.hist2d(0.0, 1.0, 0), Err(Error::Parameter(_))));
        assert!(matches!(grid.hist2d(2.0, 1.0, 4), Err(Error::Parameter(_))));
        assert_eq!(grid, three_by_three());
    }

    #[test]
    fn sub_plane_removes_a_matching_plane() {
        let mut grid = three_by_three();
        // z = 1 + x + 3 y
        grid.sub_plane(1.0, 3.0);

        // the plane through the center (1, 1) is zero there
        assert!(grid.z().iter().all(|v| (v - 5.0).abs() < 1e-12));
    }
}
