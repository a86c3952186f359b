use crate::grid::Cells;
use crate::prelude::*;
use crate::utils;

use ndarray::{ArrayViewMut1, Axis, Zip};

fn check_points(name: &str, points: usize) -> Result<(), Error> {
    if points == 0 {
        Err(Error::Parameter(format!("cannot resample onto zero {name}")))
    } else {
        Ok(())
    }
}

/// Resample the lanes of `z` along `axis` (with coordinates `coordinate`) onto `at`.
fn resample_lanes(
    coordinate: ArrayView2<f64>,
    z: ArrayView2<f64>,
    axis: Axis,
    at: ArrayView1<f64>,
) -> Array2<f64> {
    let (rows, cols) = z.dim();
    let shape = if axis == Axis(1) {
        (rows, at.len())
    } else {
        (at.len(), cols)
    };

    let mut values = Array2::from_elem(shape, f64::NAN);

    let zip = Zip::from(values.lanes_mut(axis))
        .and(coordinate.lanes(axis))
        .and(z.lanes(axis));

    let lane = |mut out: ArrayViewMut1<f64>, xs: ArrayView1<f64>, zs: ArrayView1<f64>| {
        out.assign(&utils::interp1d(xs, zs, at));
    };

    #[cfg(feature = "parallel")]
    zip.par_for_each(lane);
    #[cfg(not(feature = "parallel"))]
    zip.for_each(lane);

    values
}

impl Grid2D {
    /// Linearly resample every row onto `points` evenly spaced `x` values spanning
    /// the `x` range of the whole grid. Values outside the range of a row are NaN.
    /// Every row keeps its mean `y`.
    pub fn interp_x(&mut self, points: usize) -> Result<(), Error> {
        check_points("columns", points)?;

        let limits = self.limits();
        let at = utils::linspace(limits.xmin, limits.xmax, points);

        let z = resample_lanes(self.x().view(), self.z().view(), Axis(1), at.view());
        let y_mean = utils::nanmean_axis(self.y().view(), Axis(1));

        let x = Array2::from_shape_fn(z.dim(), |(_, c)| at[c]);
        let y = Array2::from_shape_fn(z.dim(), |(r, _)| y_mean[r]);

        self.replace_cells(Cells::from_xyz(x, y, z))
    }

    /// Linearly resample every column onto `points` evenly spaced `y` values, see
    /// [`Grid2D::interp_x`].
    pub fn interp_y(&mut self, points: usize) -> Result<(), Error> {
        check_points("rows", points)?;

        let limits = self.limits();
        let at = utils::linspace(limits.ymin, limits.ymax, points);

        let z = resample_lanes(self.y().view(), self.z().view(), Axis(0), at.view());
        let x_mean = utils::nanmean_axis(self.x().view(), Axis(0));

        let x = Array2::from_shape_fn(z.dim(), |(_, c)| x_mean[c]);
        let y = Array2::from_shape_fn(z.dim(), |(r, _)| at[r]);

        self.replace_cells(Cells::from_xyz(x, y, z))
    }

    /// Resample the grid onto `height` rows and `width` columns evenly spanning its
    /// coordinate range, interpolating over the triangulation of the current cells.
    /// Points outside the hull of the valid cells are NaN.
    pub fn interp_grid(&mut self, width: usize, height: usize) -> Result<(), Error> {
        check_points("columns", width)?;
        check_points("rows", height)?;

        let limits = self.limits();
        let xs = utils::linspace(limits.xmin, limits.xmax, width);
        let ys = utils::linspace(limits.ymin, limits.ymax, height);

        let x = Array2::from_shape_fn((height, width), |(_, c)| xs[c]);
        let y = Array2::from_shape_fn((height, width), |(r, _)| ys[r]);

        let mut queries = Array2::zeros((width * height, 2));
        for (mut query, (x, y)) in queries.rows_mut().into_iter().zip(x.iter().zip(y.iter())) {
            query[0] = *x;
            query[1] = *y;
        }

        let z = self
            .interpolate(queries.view())?
            .into_shape((height, width))
            .map_err(|e| Error::GeometryUnavailable(e.to_string()))?;

        tracing::debug!(width, height, "resampled grid over its triangulation");

        self.replace_cells(Cells::from_xyz(x, y, z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::tests::three_by_three;
    use ndarray::array;

    #[test]
    fn rows_are_resampled_onto_a_common_axis() {
        let mut grid = Grid2D::new(
            array![[0.0, 1.0, 2.0], [0.5, 1.0, 1.5]],
            array![[0.0, 0.1, -0.1], [1.0, 1.0, f64::NAN]],
            array![[0.0, 10.0, 20.0], [5.0, 10.0, 15.0]],
        )
        .unwrap();

        grid.interp_x(5).unwrap();

        assert_eq!(grid.shape(), (2, 5));
        assert_eq!(grid.x().row(1).to_vec(), vec![0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(grid.z().row(0).to_vec(), vec![0.0, 5.0, 10.0, 15.0, 20.0]);

        let second = grid.z().row(1).to_vec();
        assert!(second[0].is_nan() && second[4].is_nan());
        assert_eq!(&second[1..4], &[5.0, 10.0, 15.0]);

        assert!(grid.y()[[0, 0]].abs() < 1e-12);
        assert_eq!(grid.y()[[1, 3]], 1.0);
        assert_eq!(grid.row_numbers()[[0, 0]], None);
        assert_eq!(grid.x_setpoints(), grid.x());
    }

    #[test]
    fn columns_are_resampled_onto_a_common_axis() {
        let mut grid = three_by_three();
        grid.interp_y(5).unwrap();

        assert_eq!(grid.shape(), (5, 3));
        assert_eq!(grid.z().column(0).to_vec(), vec![1.0, 2.5, 4.0, 5.5, 7.0]);
        assert_eq!(grid.x().row(4).to_vec(), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn zero_points_are_rejected() {
        let mut grid = three_by_three();
        assert!(matches!(grid.interp_x(0), Err(Error::Parameter(_))));
        assert!(matches!(grid.interp_grid(3, 0), Err(Error::Parameter(_))));
        assert_eq!(grid, three_by_three());
    }

    #[test]
    fn grid_resampling_reproduces_a_plane() {
        let mut grid = three_by_three();
        grid.interp_grid(5, 4).unwrap();

        assert_eq!(grid.shape(), (4, 5));
        assert!(!grid.has_triangulation());

        for ((x, y), z) in grid.x().iter().zip(grid.y().iter()).zip(grid.z().iter()) {
            assert!((z - (1.0 + x + 3.0 * y)).abs() < 1e-9, "({x}, {y}) -> {z}");
        }
    }
}
