use super::{Kernel, EQUALIZE_BINS, KERNEL_CUTOFF, MAX_KERNEL_HALF};
use crate::prelude::*;
use crate::utils;

use ndarray::{Axis, Zip};

/// Sample `kernel` on a grid of `(2 hy + 1) x (2 hx + 1)` points, where
/// `hx = floor(x_dev * cutoff / 2)`, at distances measured in units of
/// `x_dev` and `y_dev`. The weights sum to one.
///
/// The rows of the result run along `y`, the columns along `x`. A half width
/// above [`MAX_KERNEL_HALF`](`super::MAX_KERNEL_HALF`) gives [`Error::Parameter`].
///
/// ```
/// use sweepgrid::{ops::create_kernel, Kernel};
///
/// let kernel = create_kernel(3.0, 1.0, 7.0, Kernel::Gaussian).unwrap();
/// assert_eq!(kernel.dim(), (7, 21));
/// assert!((kernel.sum() - 1.0).abs() < 1e-12);
/// ```
pub fn create_kernel(x_dev: f64, y_dev: f64, cutoff: f64, kernel: Kernel) -> Result<Array2<f64>, Error> {
    let offsets = |dev: f64| -> Result<Array1<f64>, Error> {
        // NaN.max(0.0) is 0.0
        let half = (dev * cutoff / 2.0).floor().max(0.0);

        if half > MAX_KERNEL_HALF as f64 {
            return Err(Error::Parameter(format!(
                "a filter width of {dev} needs a kernel wider than {} cells",
                2 * MAX_KERNEL_HALF + 1
            )));
        }

        let half = half as usize;
        if half == 0 {
            return Ok(Array1::zeros(1));
        }

        Ok(utils::linspace(-(half as f64), half as f64, 2 * half + 1) / dev)
    };

    let x = offsets(x_dev)?;
    let y = offsets(y_dev)?;

    let mut weights = Array2::from_shape_fn((y.len(), x.len()), |(r, c)| {
        kernel.weight((x[c] * x[c] + y[r] * y[r]).sqrt())
    });

    let total = weights.sum();
    weights /= total;

    tracing::trace!(shape = ?weights.dim(), %kernel, "created kernel");

    Ok(weights)
}

/// index into `0..n` mirroring at the edges, `d c b a | a b c d | d c b a`
fn reflect(idx: isize, n: usize) -> usize {
    let n = n as isize;
    let period = 2 * n;
    let m = idx.rem_euclid(period);

    if m >= n {
        (period - 1 - m) as usize
    } else {
        m as usize
    }
}

/// 2D convolution of `data` with `kernel`, reflecting `data` at the boundaries.
/// The center of the kernel is at `(rows / 2, cols / 2)`. A NaN anywhere in the
/// window of a cell makes that cell NaN.
pub(crate) fn convolve(data: ArrayView2<f64>, kernel: ArrayView2<f64>) -> Array2<f64> {
    let (rows, cols) = data.dim();
    let (krows, kcols) = kernel.dim();
    let (cy, cx) = ((krows / 2) as isize, (kcols / 2) as isize);

    let mut out = Array2::zeros((rows, cols));

    if rows == 0 || cols == 0 {
        return out;
    }

    let zip = Zip::indexed(&mut out);

    let cell = |(r, c): (usize, usize), value: &mut f64| {
        let mut sum = 0.0;

        for ((a, b), weight) in kernel.indexed_iter() {
            let rr = reflect(r as isize + cy - a as isize, rows);
            let cc = reflect(c as isize + cx - b as isize, cols);
            sum += weight * data[[rr, cc]];
        }

        *value = sum;
    };

    #[cfg(feature = "parallel")]
    zip.par_for_each(cell);
    #[cfg(not(feature = "parallel"))]
    zip.for_each(cell);

    out
}

impl Grid2D {
    /// Smooth the values with a kernel that is `x_width` cells wide and
    /// `y_height` cells high, see [`create_kernel`].
    pub fn lowpass(&mut self, x_width: f64, y_height: f64, kernel: Kernel) -> Result<(), Error> {
        let weights = create_kernel(x_width, y_height, KERNEL_CUTOFF, kernel)?;
        let smooth = convolve(self.z().view(), weights.view());

        self.update_z(|z| *z = smooth);
        Ok(())
    }

    /// Subtract the [`lowpass`](`Grid2D::lowpass`) of the values from the values.
    pub fn highpass(&mut self, x_width: f64, y_height: f64, kernel: Kernel) -> Result<(), Error> {
        let weights = create_kernel(x_width, y_height, KERNEL_CUTOFF, kernel)?;
        let smooth = convolve(self.z().view(), weights.view());

        self.update_z(|z| *z -= &smooth);
        Ok(())
    }

    /// Histogram equalization.
    ///
    /// The non-NaN values are binned into [`EQUALIZE_BINS`] bins and every value is
    /// replaced by the cumulative distribution at its position, scaled back onto the
    /// original value range. NaN stays NaN. If every value is NaN nothing changes.
    pub fn equalize(&mut self) {
        let (min, max) = match self.z_limits() {
            Some(limits) => limits,
            None => return,
        };

        let (lo, hi) = if min == max {
            (min - 0.5, max + 0.5)
        } else {
            (min, max)
        };

        let bins = EQUALIZE_BINS;
        let width = (hi - lo) / bins as f64;

        let mut counts = vec![0usize; bins];
        for value in self.z().iter().filter(|v| !v.is_nan()) {
            // the last bin includes its right edge
            let idx = (((value - lo) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        let total: usize = counts.iter().sum();
        let mut running = 0;
        let cdf: Vec<f64> = counts
            .iter()
            .map(|count| {
                running += count;
                lo + (hi - lo) * (running as f64 / total as f64)
            })
            .collect();

        // linear interpolation of the cdf at the left bin edges, clamped at both ends
        let lookup = |value: f64| -> f64 {
            if value.is_nan() {
                return f64::NAN;
            }

            let position = (value - lo) / width;
            if position <= 0.0 {
                return cdf[0];
            }

            let idx = position.floor() as usize;
            if idx >= bins - 1 {
                return cdf[bins - 1];
            }

            let frac = position - idx as f64;
            cdf[idx] + (cdf[idx + 1] - cdf[idx]) * frac
        };

        self.update_z(|z| z.mapv_inplace(lookup));
    }

    /// Base 10 logarithm of the values. With `subtract` the values are first shifted
    /// so that the smallest one becomes `floor`.
    pub fn log(&mut self, subtract: bool, floor: f64) {
        let minimum = self.z_limits().map(|(min, _)| min);

        self.update_z(|z| {
            if let (true, Some(minimum)) = (subtract, minimum) {
                *z += floor - minimum;
            }

            z.mapv_inplace(f64::log10);
        });
    }

    /// Rescale every column onto `0..1` using its NaN ignoring range.
    pub fn norm_columns(&mut self) {
        self.update_z(|z| normalize_lanes(z, Axis(0)));
    }

    /// Rescale every row onto `0..1` using its NaN ignoring range.
    pub fn norm_rows(&mut self) {
        self.update_z(|z| normalize_lanes(z, Axis(1)));
    }
}

/// `(v - min) / (max - min)` for the lanes along `axis`; a constant lane becomes NaN
fn normalize_lanes(z: &mut Array2<f64>, axis: Axis) {
    for mut lane in z.lanes_mut(axis) {
        if let (Some(min), Some(max)) = (utils::nanmin(lane.iter()), utils::nanmax(lane.iter())) {
            lane.mapv_inplace(|v| (v - min) / (max - min));
        }
    }
}
