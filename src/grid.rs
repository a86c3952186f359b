//! # Grid2D
//!
//! The dense two dimensional grid every transform works on. Six matrices of the
//! same shape describe every cell: its `x`, `y` coordinates and `z` value, the
//! setpoint values that placed it and the number of the record that filled it.
//!
//! The triangulation used for scattered interpolation is derived state: it is
//! built on first use and dropped by every method that changes the geometry.

use crate::prelude::*;
use crate::triangulation::Triangulation;
use crate::utils;

use ndarray::{Axis, Slice};
use std::sync::OnceLock;

/// Descriptive metadata carried along with a grid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridMeta {
    pub x_name: String,
    pub y_name: String,
    pub z_name: String,
    pub x_setpoints_name: String,
    /// `None` when the grid was pivoted from a one dimensional scan
    pub y_setpoints_name: Option<String>,
    pub filename: String,
    pub timestamp: String,
    /// (x, y) axis flags
    pub equidistant: (bool, bool),
    /// (x, y) axis flags, a varying axis is replaced by an evenly spaced one
    pub varying: (bool, bool),
}

/// Value ranges of the coordinates and data of a grid, ignoring NaN
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub zmin: f64,
    pub zmax: f64,
}

/// The six per-cell matrices of a grid
#[derive(Debug, Clone, PartialEq)]
pub struct Cells {
    pub x: Array2<f64>,
    pub y: Array2<f64>,
    pub z: Array2<f64>,
    pub x_setpoints: Array2<f64>,
    pub y_setpoints: Array2<f64>,
    /// index of the record that filled every cell, `None` for empty cells
    pub row_numbers: Array2<Option<usize>>,
}

impl Cells {
    /// cells without provenance: the coordinates double as setpoints
    pub fn from_xyz(x: Array2<f64>, y: Array2<f64>, z: Array2<f64>) -> Self {
        Self {
            x_setpoints: x.clone(),
            y_setpoints: y.clone(),
            row_numbers: Array2::from_elem(z.dim(), None),
            x,
            y,
            z,
        }
    }

    /// the `(rows, columns)` of the grid
    pub fn shape(&self) -> (usize, usize) {
        self.z.dim()
    }

    fn validate(&self) -> Result<(), Error> {
        let expected = self.z.dim();

        let shapes = [
            ("x", self.x.dim()),
            ("y", self.y.dim()),
            ("x_setpoints", self.x_setpoints.dim()),
            ("y_setpoints", self.y_setpoints.dim()),
            ("row_numbers", self.row_numbers.dim()),
        ];

        match shapes.iter().find(|(_, shape)| *shape != expected) {
            Some((name, actual)) => Err(Error::ShapeMismatch {
                name: *name,
                expected,
                actual: *actual,
            }),
            None => Ok(()),
        }
    }

    fn transposed(&self) -> Self {
        fn t<T: Clone>(arr: &Array2<T>) -> Array2<T> {
            arr.t().as_standard_layout().into_owned()
        }

        Self {
            x: t(&self.x),
            y: t(&self.y),
            z: t(&self.z),
            x_setpoints: t(&self.x_setpoints),
            y_setpoints: t(&self.y_setpoints),
            row_numbers: t(&self.row_numbers),
        }
    }

    /// the same sub selection of rows and columns out of all six matrices
    pub(crate) fn select(&self, rows: Slice, cols: Slice) -> Self {
        fn pick<T: Clone>(arr: &Array2<T>, rows: Slice, cols: Slice) -> Array2<T> {
            arr.slice_axis(Axis(0), rows)
                .slice_axis(Axis(1), cols)
                .as_standard_layout()
                .into_owned()
        }

        Self {
            x: pick(&self.x, rows, cols),
            y: pick(&self.y, rows, cols),
            z: pick(&self.z, rows, cols),
            x_setpoints: pick(&self.x_setpoints, rows, cols),
            y_setpoints: pick(&self.y_setpoints, rows, cols),
            row_numbers: pick(&self.row_numbers, rows, cols),
        }
    }
}

/// A single row or column of a grid
#[derive(Debug, Clone, PartialEq)]
pub struct Linecut {
    /// row or column index in the grid
    pub index: usize,
    /// `x` along a row, `y` along a column
    pub coordinates: Array1<f64>,
    pub values: Array1<f64>,
    pub row_numbers: Array1<Option<usize>>,
}

/// Dense 2D grid of a scan, see the [module documentation](`crate::grid`).
#[derive(Debug)]
pub struct Grid2D {
    cells: Cells,
    pub meta: GridMeta,
    triangulation: OnceLock<Triangulation>,
}

impl Clone for Grid2D {
    /// same as [`deep_copy`](`Grid2D::deep_copy`)
    fn clone(&self) -> Self {
        self.deep_copy()
    }
}

impl PartialEq for Grid2D {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells && self.meta == other.meta
    }
}

impl Grid2D {
    /// Construct a grid from coordinate and value matrices. The coordinates double
    /// as setpoints and no cell has a source record.
    pub fn new(x: Array2<f64>, y: Array2<f64>, z: Array2<f64>) -> Result<Self, Error> {
        Self::from_cells(Cells::from_xyz(x, y, z), GridMeta::default())
    }

    /// Construct a grid from all six matrices, which have to share one shape.
    ///
    /// The matrices are taken as they are; orientation is only canonicalized by
    /// [`canonicalize_orientation`](`Grid2D::canonicalize_orientation`).
    pub fn from_cells(cells: Cells, meta: GridMeta) -> Result<Self, Error> {
        cells.validate()?;

        Ok(Self {
            cells,
            meta,
            triangulation: OnceLock::new(),
        })
    }

    /// An independent copy of the grid. Nothing is shared with `self`, and the
    /// copy starts without a triangulation.
    pub fn deep_copy(&self) -> Self {
        Self {
            cells: self.cells.clone(),
            meta: self.meta.clone(),
            triangulation: OnceLock::new(),
        }
    }

    pub fn x(&self) -> &Array2<f64> {
        &self.cells.x
    }

    pub fn y(&self) -> &Array2<f64> {
        &self.cells.y
    }

    pub fn z(&self) -> &Array2<f64> {
        &self.cells.z
    }

    pub fn x_setpoints(&self) -> &Array2<f64> {
        &self.cells.x_setpoints
    }

    pub fn y_setpoints(&self) -> &Array2<f64> {
        &self.cells.y_setpoints
    }

    pub fn row_numbers(&self) -> &Array2<Option<usize>> {
        &self.cells.row_numbers
    }

    pub fn cells(&self) -> &Cells {
        &self.cells
    }

    pub fn into_cells(self) -> Cells {
        self.cells
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        self.cells.shape()
    }

    pub fn rows(&self) -> usize {
        self.shape().0
    }

    pub fn cols(&self) -> usize {
        self.shape().1
    }

    fn invalidate(&mut self) {
        self.triangulation = OnceLock::new();
    }

    /// Replace the coordinates and values, keeping setpoints and provenance.
    /// All three matrices need the current shape.
    pub fn set_data(&mut self, x: Array2<f64>, y: Array2<f64>, z: Array2<f64>) -> Result<(), Error> {
        let cells = Cells {
            x,
            y,
            z,
            x_setpoints: self.cells.x_setpoints.clone(),
            y_setpoints: self.cells.y_setpoints.clone(),
            row_numbers: self.cells.row_numbers.clone(),
        };

        self.replace_cells(cells)
    }

    /// swap in a complete new set of matrices, the grid is untouched if the shapes disagree
    pub(crate) fn replace_cells(&mut self, cells: Cells) -> Result<(), Error> {
        cells.validate()?;
        self.cells = cells;
        self.invalidate();
        Ok(())
    }

    /// keep a sub selection of rows and columns of every matrix
    pub(crate) fn select(&mut self, rows: Slice, cols: Slice) {
        self.cells = self.cells.select(rows, cols);
        self.invalidate();
    }

    pub(crate) fn update_z<F: FnOnce(&mut Array2<f64>)>(&mut self, update: F) {
        update(&mut self.cells.z);
        self.invalidate();
    }

    pub(crate) fn update_axes<F: FnOnce(&mut Array2<f64>, &mut Array2<f64>)>(&mut self, update: F) {
        update(&mut self.cells.x, &mut self.cells.y);
        self.invalidate();
    }

    /// Transpose all six matrices together if `x` varies more down the columns
    /// than along the rows. Afterwards the average range of `x` within a row is
    /// at least the average range of `x` within a column.
    ///
    /// Returns whether the grid was transposed.
    pub fn canonicalize_orientation(&mut self) -> bool {
        let down_columns = utils::nanmean(utils::nan_ptp(self.cells.x.view(), Axis(0)).iter());
        let along_rows = utils::nanmean(utils::nan_ptp(self.cells.x.view(), Axis(1)).iter());

        if down_columns > along_rows {
            tracing::debug!(
                shape = ?self.shape(),
                "transposing grid so that x runs along the rows"
            );
            self.cells = self.cells.transposed();
            self.invalidate();
            true
        } else {
            false
        }
    }

    /// Replace every axis flagged as `varying` in the metadata with an evenly
    /// spaced one: the minimum plus the index times the mean step, tiled across
    /// the other dimension.
    pub fn regularize_axes(&mut self) {
        let (vary_x, vary_y) = self.meta.varying;
        let (rows, cols) = self.shape();

        if vary_x {
            let x = &self.cells.x;
            let start = utils::nanmin(x.iter()).unwrap_or(f64::NAN);
            let step = mean_step(x.view(), Axis(1));

            self.cells.x = Array2::from_shape_fn((rows, cols), |(_, c)| start + c as f64 * step);
        }

        if vary_y {
            let y = &self.cells.y;
            let start = utils::nanmin(y.iter()).unwrap_or(f64::NAN);
            let step = mean_step(y.view(), Axis(0));

            self.cells.y = Array2::from_shape_fn((rows, cols), |(r, _)| start + r as f64 * step);
        }

        if vary_x || vary_y {
            self.invalidate();
        }
    }

    /// The NaN ignoring value ranges. A degenerate `x` or `y` range (a single
    /// distinct value) is widened to `-1..1` so that it can still be drawn and
    /// normalized.
    pub fn limits(&self) -> Limits {
        let range = |arr: &Array2<f64>| {
            (
                utils::nanmin(arr.iter()).unwrap_or(f64::NAN),
                utils::nanmax(arr.iter()).unwrap_or(f64::NAN),
            )
        };

        let widen = |(min, max): (f64, f64)| if min == max { (-1.0, 1.0) } else { (min, max) };

        let (xmin, xmax) = widen(range(&self.cells.x));
        let (ymin, ymax) = widen(range(&self.cells.y));
        let (zmin, zmax) = range(&self.cells.z);

        Limits {
            xmin,
            xmax,
            ymin,
            ymax,
            zmin,
            zmax,
        }
    }

    /// `(min, max)` of the values, `None` if every value is NaN
    pub fn z_limits(&self) -> Option<(f64, f64)> {
        utils::nanmin(self.cells.z.iter()).zip(utils::nanmax(self.cells.z.iter()))
    }

    /// index of the row whose mean `y` is closest to `y`
    pub fn row_index(&self, y: f64) -> Option<usize> {
        let means = utils::nanmean_axis(self.cells.y.view(), Axis(1));
        utils::nearest_index(means.view(), y)
    }

    /// index of the column whose mean `x` is closest to `x`
    pub fn column_index(&self, x: f64) -> Option<usize> {
        let means = utils::nanmean_axis(self.cells.x.view(), Axis(0));
        utils::nearest_index(means.view(), x)
    }

    /// the row whose mean `y` is closest to `y`
    pub fn row_at(&self, y: f64) -> Option<Linecut> {
        let index = self.row_index(y)?;

        Some(Linecut {
            index,
            coordinates: self.cells.x.row(index).to_owned(),
            values: self.cells.z.row(index).to_owned(),
            row_numbers: self.cells.row_numbers.row(index).to_owned(),
        })
    }

    /// the column whose mean `x` is closest to `x`
    pub fn column_at(&self, x: f64) -> Option<Linecut> {
        let index = self.column_index(x)?;

        Some(Linecut {
            index,
            coordinates: self.cells.y.column(index).to_owned(),
            values: self.cells.z.column(index).to_owned(),
            row_numbers: self.cells.row_numbers.column(index).to_owned(),
        })
    }

    /// the `x` coordinate of the first row closest to `x`
    pub fn closest_x(&self, x: f64) -> Option<f64> {
        if self.cells.x.is_empty() {
            return None;
        }

        let first = self.cells.x.row(0);
        utils::nearest_index(first, x).map(|idx| first[idx])
    }

    /// the `y` coordinate of the first column closest to `y`
    pub fn closest_y(&self, y: f64) -> Option<f64> {
        if self.cells.y.is_empty() {
            return None;
        }

        let first = self.cells.y.column(0);
        utils::nearest_index(first, y).map(|idx| first[idx])
    }

    /// whether `x` decreases along the first row and `y` down the first column
    pub fn is_flipped(&self) -> (bool, bool) {
        let (rows, cols) = self.shape();
        if rows == 0 || cols == 0 {
            return (false, false);
        }

        let x = &self.cells.x;
        let y = &self.cells.y;

        (x[[0, 0]] > x[[0, cols - 1]], y[[0, 0]] > y[[rows - 1, 0]])
    }

    /// Copies of `x`, `y` and `z` with the columns ordered by the `x` of the first
    /// row and the rows ordered by the `y` of the first column.
    pub fn sorted_by_coordinates(&self) -> (Array2<f64>, Array2<f64>, Array2<f64>) {
        let argsort = |lane: ArrayView1<f64>| {
            let mut indices: Vec<usize> = (0..lane.len()).collect();
            indices.sort_by(|&a, &b| lane[a].total_cmp(&lane[b]));
            indices
        };

        if self.rows() == 0 || self.cols() == 0 {
            return (self.cells.x.clone(), self.cells.y.clone(), self.cells.z.clone());
        }

        let col_order = argsort(self.cells.x.row(0));
        let row_order = argsort(self.cells.y.column(0));

        let x = self.cells.x.select(Axis(1), &col_order);
        let y = self.cells.y.select(Axis(0), &row_order);
        let z = self.cells.z.select(Axis(1), &col_order).select(Axis(0), &row_order);

        (x, y, z)
    }

    /// The cached triangulation of the valid cells, built if there is none.
    pub fn triangulation(&self) -> Result<&Triangulation, Error> {
        if let Some(triangulation) = self.triangulation.get() {
            return Ok(triangulation);
        }

        let built = Triangulation::build(
            self.cells.x.view(),
            self.cells.y.view(),
            self.cells.z.view(),
            &self.limits(),
        )?;

        // a concurrent reader may have won the race, both results are identical
        let _ = self.triangulation.set(built);

        self.triangulation
            .get()
            .ok_or_else(|| Error::GeometryUnavailable("triangulation cache is empty".into()))
    }

    /// whether a triangulation is currently cached
    pub fn has_triangulation(&self) -> bool {
        self.triangulation.get().is_some()
    }

    /// Interpolate the grid at every row `(x, y)` of an `N x 2` array, see
    /// [`Triangulation::interpolate`].
    pub fn interpolate(&self, points: ArrayView2<f64>) -> Result<Array1<f64>, Error> {
        self.triangulation()?.interpolate(points)
    }

    /// the vertex coordinates of the cached triangulation
    pub fn triangulation_coordinates(&self) -> Result<(Array1<f64>, Array1<f64>), Error> {
        self.triangulation
            .get()
            .map(Triangulation::coordinates)
            .ok_or_else(|| Error::GeometryUnavailable("no triangulation has been generated yet".into()))
    }
}

/// nanmean of the differences between neighbors along `axis`, zero if there are none
fn mean_step(arr: ArrayView2<f64>, axis: Axis) -> f64 {
    let n = arr.len_of(axis);
    if n < 2 {
        return 0.0;
    }

    let diff = &arr.slice_axis(axis, Slice::from(1..)) - &arr.slice_axis(axis, Slice::from(..n - 1));
    let step = utils::nanmean(diff.iter());

    if step.is_nan() {
        0.0
    } else {
        step
    }
}
