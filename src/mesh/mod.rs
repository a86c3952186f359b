//! # Cell Boundary Meshes
//!
//! The coordinates of a [`Grid2D`](`crate::Grid2D`) are cell centers. Area-fill
//! renderers (pcolor style) need the corners of every cell instead, so a grid of
//! `R x C` cells is described by `(R + 1) x (C + 1)` corner coordinates.
//!
//! [`quadrilaterals`] computes these corners from the center coordinates. Along
//! every dimension with more than one cell, the corners are the midpoints between
//! neighboring centers, with one extrapolated center padded on each side. NaN
//! centers on the first or last cell of a lane (a scan stopped halfway through a
//! row, for example) are first extrapolated from their two neighbors. A dimension
//! with a single cell gets a window of half a unit on either side of its center.
//!
//! ## Masked output
//!
//! Renderers skip cells through a mask rather than by checking for NaN. [`pcolor`]
//! bundles the corners and values of a grid as [`MaskedArray`]s, where every
//! non-finite entry is masked.

mod masked;
mod quad;

pub use masked::{pcolor, MaskedArray, PcolorMesh};
pub use quad::quadrilaterals;
