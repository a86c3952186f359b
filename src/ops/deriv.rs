use super::DerivMethod;
use crate::grid::Cells;
use crate::prelude::*;

use ndarray::{Axis, Slice};

/// `(rows, cols)` slices that apply `along` to `axis` and keep the other axis whole
fn on_axis(axis: Axis, along: Slice) -> (Slice, Slice) {
    let all = Slice::from(..);
    if axis == Axis(0) {
        (along, all)
    } else {
        (all, along)
    }
}

fn grid_axis(axis: Axis) -> GridAxis {
    if axis == Axis(0) {
        GridAxis::Y
    } else {
        GridAxis::X
    }
}

/// The cells of the derivative of `z` with respect to the coordinate that varies
/// along `axis` (`x` along the columns, `y` along the rows).
fn derivative(cells: &Cells, axis: Axis, method: DerivMethod) -> Result<Cells, Error> {
    let n = cells.z.len_of(axis);
    let needed = match method {
        DerivMethod::Midpoint => 2,
        DerivMethod::Central => 3,
    };

    if n < needed {
        return Err(Error::InsufficientSize {
            axis: grid_axis(axis),
            needed,
            actual: n,
        });
    }

    let coordinate = if axis == Axis(1) { &cells.x } else { &cells.y };
    let z = &cells.z;

    let slice = |arr: &Array2<f64>, s: Slice| arr.slice_axis(axis, s).to_owned();

    let (kept, dz, dcoord, placed) = match method {
        DerivMethod::Midpoint => {
            let lo = Slice::from(..n - 1);
            let hi = Slice::from(1..);

            let dcoord = slice(coordinate, hi) - slice(coordinate, lo);
            let placed = slice(coordinate, lo) + &dcoord / 2.0;
            let dz = slice(z, hi) - slice(z, lo);

            (lo, dz, dcoord, placed)
        }
        DerivMethod::Central => {
            let lo = Slice::from(..n - 2);
            let mid = Slice::from(1..n - 1);
            let hi = Slice::from(2..);

            let dcoord = slice(coordinate, hi) - slice(coordinate, lo);
            let dz = slice(z, hi) - slice(z, lo);

            (mid, dz, dcoord, slice(coordinate, mid))
        }
    };

    let (rows, cols) = on_axis(axis, kept);
    let mut out = cells.select(rows, cols);

    out.z = dz / dcoord;
    if axis == Axis(1) {
        out.x = placed;
    } else {
        out.y = placed;
    }

    Ok(out)
}

impl Grid2D {
    /// Derivative of `z` with respect to `x`, along the rows.
    ///
    /// The midpoint stencil removes one column and places every value halfway
    /// between the two cells it came from; the central stencil removes the first
    /// and last column. Fails with `InsufficientSize` if there are too few columns.
    pub fn xderiv(&mut self, method: DerivMethod) -> Result<(), Error> {
        let cells = derivative(self.cells(), Axis(1), method)?;
        self.replace_cells(cells)
    }

    /// Derivative of `z` with respect to `y`, down the columns. See [`Grid2D::xderiv`].
    pub fn yderiv(&mut self, method: DerivMethod) -> Result<(), Error> {
        let cells = derivative(self.cells(), Axis(0), method)?;
        self.replace_cells(cells)
    }

    /// Combine the `x` and `y` derivatives, each computed on its own copy of the
    /// grid, on the cells both of them have.
    fn combine_partials<F>(&mut self, method: DerivMethod, combine: F) -> Result<(), Error>
    where
        F: Fn(f64, f64) -> f64,
    {
        let mut xcomp = self.deep_copy();
        xcomp.xderiv(method)?;

        let mut ycomp = self.deep_copy();
        ycomp.yderiv(method)?;

        // the x derivative still has every row, the y derivative every column
        let trim = |n: usize| match method {
            DerivMethod::Midpoint => Slice::from(..n - 1),
            DerivMethod::Central => Slice::from(1..n - 1),
        };

        let all = Slice::from(..);
        let mut cells = xcomp.cells().select(trim(xcomp.rows()), all);
        let ycells = ycomp.cells().select(all, trim(ycomp.cols()));

        cells.y = ycells.y;
        cells.z = ndarray::Zip::from(&cells.z)
            .and(&ycells.z)
            .map_collect(|&dx, &dy| combine(dx, dy));

        self.replace_cells(cells)
    }

    /// Directional derivative `dz/dx cos(theta) + dz/dy sin(theta)`.
    ///
    /// Both partial derivatives are taken with `method`, so the result loses one
    /// (midpoint) or two (central) rows and columns.
    pub fn dderiv(&mut self, theta: f64, method: DerivMethod) -> Result<(), Error> {
        let (sin, cos) = theta.sin_cos();
        self.combine_partials(method, |dx, dy| dx * cos + dy * sin)
    }

    /// Length of the gradient `sqrt((dz/dx)^2 + (dz/dy)^2)`, with the same shape as
    /// [`Grid2D::dderiv`].
    pub fn gradmag(&mut self, method: DerivMethod) -> Result<(), Error> {
        self.combine_partials(method, |dx, dy| (dx * dx + dy * dy).sqrt())
    }
}
