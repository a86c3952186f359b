//! # Transforms
//!
//! Operations that change a [`Grid2D`] in place. Every operation is available as
//! a method on the grid and as a variant of [`Operation`], which can be stored and
//! applied later or in a chain:
//!
//! ```
//! use sweepgrid::ndarray::array;
//! use sweepgrid::{DerivMethod, Grid2D, Operation, Transform};
//!
//! let mut grid = Grid2D::new(
//!     array![[0.0, 1.0, 2.0], [0.0, 1.0, 2.0], [0.0, 1.0, 2.0]],
//!     array![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]],
//!     array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]],
//! )
//! .unwrap();
//!
//! let chain = vec![
//!     Operation::Xderiv { method: DerivMethod::Midpoint },
//!     Operation::ScaleData { factor: 2.0 },
//! ];
//! chain.apply(&mut grid).unwrap();
//!
//! assert_eq!(grid.shape(), (3, 2));
//! assert!(grid.z().iter().all(|dz| *dz == 2.0));
//! ```
//!
//! NaN cells stay NaN through every operation. Operations either succeed or
//! return an error with the grid left as it was.
//!
//! The setpoints and row numbers of the cells follow the cells: cropping, flipping
//! or dropping rows slices them too, derivatives keep those of the first cell of
//! every difference, and resampling (which creates new cells) replaces the
//! setpoints with the new coordinates and clears the row numbers.

mod deriv;
mod elementwise;
mod filter;
mod geometry;
mod linecut;
mod resample;

pub use filter::create_kernel;

use crate::prelude::*;

/// multiple of the filter width at which a kernel is cut off
pub const KERNEL_CUTOFF: f64 = 7.0;

/// largest half width, in cells, of a [`create_kernel`] kernel
pub const MAX_KERNEL_HALF: usize = 1024;

/// number of histogram bins used by [`Grid2D::equalize`]
pub const EQUALIZE_BINS: usize = 65535;

/// Finite difference stencil of the derivatives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum DerivMethod {
    /// `(z[i+1] - z[i]) / (x[i+1] - x[i])` placed halfway between the two cells
    #[default]
    #[display(fmt = "midpoint")]
    Midpoint,
    /// `(z[i+1] - z[i-1]) / (x[i+1] - x[i-1])` placed on cell `i`
    #[display(fmt = "2nd order central diff")]
    Central,
}

/// Shape of the convolution kernel of [`Grid2D::lowpass`] and [`Grid2D::highpass`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum Kernel {
    /// `exp(-r^2 / 2)`
    #[default]
    #[display(fmt = "gaussian")]
    Gaussian,
    /// `exp(-|r| sqrt(2))`
    #[display(fmt = "exponential")]
    Exponential,
    /// `1 / (r^2 + 1)`
    #[display(fmt = "lorentzian")]
    Lorentzian,
    /// `exp(r) / (1 + exp(r))^2`
    #[display(fmt = "thermal")]
    Thermal,
}

impl Kernel {
    pub(crate) fn weight(self, r: f64) -> f64 {
        match self {
            Self::Gaussian => (-(r * r) / 2.0).exp(),
            Self::Exponential => (-r.abs() * 2f64.sqrt()).exp(),
            Self::Lorentzian => 1.0 / (r * r + 1.0),
            // symmetric in r; written with exp(-|r|) so it cannot overflow
            Self::Thermal => {
                let e = (-r.abs()).exp();
                e / ((1.0 + e) * (1.0 + e))
            }
        }
    }
}

/// Orientation of a linecut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum LinecutKind {
    /// a row, at constant `y`
    #[display(fmt = "horizontal")]
    Horizontal,
    /// a column, at constant `x`
    #[display(fmt = "vertical")]
    Vertical,
}

/// Every transform with its parameters. See the grid method of the same name for
/// the details of each.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Abs,
    Autoflip,
    /// bounds as column / row indices, negative `right` and `top` count from the end
    Crop {
        left: isize,
        right: isize,
        bottom: isize,
        top: isize,
    },
    Dderiv {
        /// radians, measured from the x axis
        theta: f64,
        method: DerivMethod,
    },
    Equalize,
    EvenOdd {
        even: bool,
    },
    Flip {
        x: bool,
        y: bool,
    },
    Gradmag {
        method: DerivMethod,
    },
    Highpass {
        x_width: f64,
        y_height: f64,
        kernel: Kernel,
    },
    Hist2d {
        min: f64,
        max: f64,
        bins: usize,
    },
    InterpGrid {
        width: usize,
        height: usize,
    },
    InterpX {
        points: usize,
    },
    InterpY {
        points: usize,
    },
    Log {
        subtract: bool,
        floor: f64,
    },
    Lowpass {
        x_width: f64,
        y_height: f64,
        kernel: Kernel,
    },
    Negate,
    NormColumns,
    NormRows,
    Offset {
        offset: f64,
    },
    OffsetAxes {
        x: f64,
        y: f64,
    },
    Power {
        power: f64,
    },
    ScaleAxes {
        x: f64,
        y: f64,
    },
    ScaleData {
        factor: f64,
    },
    SubLinecut {
        kind: LinecutKind,
        position: f64,
    },
    SubLinecutAvg {
        kind: LinecutKind,
        position: f64,
        size: usize,
    },
    SubPlane {
        x_slope: f64,
        y_slope: f64,
    },
    Xderiv {
        method: DerivMethod,
    },
    Yderiv {
        method: DerivMethod,
    },
}

impl Operation {
    /// crop that keeps the whole grid
    pub fn full_crop() -> Self {
        Self::Crop {
            left: 0,
            right: -1,
            bottom: 0,
            top: -1,
        }
    }

    /// 3 x 3 gaussian low pass
    pub fn default_lowpass() -> Self {
        Self::Lowpass {
            x_width: 3.0,
            y_height: 3.0,
            kernel: Kernel::Gaussian,
        }
    }

    /// 3 x 3 gaussian high pass
    pub fn default_highpass() -> Self {
        Self::Highpass {
            x_width: 3.0,
            y_height: 3.0,
            kernel: Kernel::Gaussian,
        }
    }
}

impl Transform for Operation {
    fn apply(&self, grid: &mut Grid2D) -> Result<(), Error> {
        tracing::debug!(operation = ?self, shape = ?grid.shape(), "applying operation");

        match *self {
            Self::Abs => grid.abs(),
            Self::Autoflip => grid.autoflip(),
            Self::Crop {
                left,
                right,
                bottom,
                top,
            } => grid.crop(left, right, bottom, top)?,
            Self::Dderiv { theta, method } => grid.dderiv(theta, method)?,
            Self::Equalize => grid.equalize(),
            Self::EvenOdd { even } => grid.even_odd(even),
            Self::Flip { x, y } => grid.flip(x, y),
            Self::Gradmag { method } => grid.gradmag(method)?,
            Self::Highpass {
                x_width,
                y_height,
                kernel,
            } => grid.highpass(x_width, y_height, kernel)?,
            Self::Hist2d { min, max, bins } => grid.hist2d(min, max, bins)?,
            Self::InterpGrid { width, height } => grid.interp_grid(width, height)?,
            Self::InterpX { points } => grid.interp_x(points)?,
            Self::InterpY { points } => grid.interp_y(points)?,
            Self::Log { subtract, floor } => grid.log(subtract, floor),
            Self::Lowpass {
                x_width,
                y_height,
                kernel,
            } => grid.lowpass(x_width, y_height, kernel)?,
            Self::Negate => grid.negate(),
            Self::NormColumns => grid.norm_columns(),
            Self::NormRows => grid.norm_rows(),
            Self::Offset { offset } => grid.offset(offset),
            Self::OffsetAxes { x, y } => grid.offset_axes(x, y),
            Self::Power { power } => grid.power(power),
            Self::ScaleAxes { x, y } => grid.scale_axes(x, y),
            Self::ScaleData { factor } => grid.scale_data(factor),
            Self::SubLinecut { kind, position } => grid.sub_linecut(kind, position)?,
            Self::SubLinecutAvg {
                kind,
                position,
                size,
            } => grid.sub_linecut_avg(kind, position, size)?,
            Self::SubPlane { x_slope, y_slope } => grid.sub_plane(x_slope, y_slope),
            Self::Xderiv { method } => grid.xderiv(method)?,
            Self::Yderiv { method } => grid.yderiv(method)?,
        }

        Ok(())
    }
}
