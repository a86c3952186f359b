//! Common traits and types that are useful for working with `sweepgrid`
#![allow(unused_imports)]

pub use crate::data::{Column, ScanTable};
pub use crate::grid::{Grid2D, GridMeta, Limits};
pub use crate::mesh::{MaskedArray, PcolorMesh};
pub use crate::ops::{DerivMethod, Kernel, LinecutKind, Operation};
pub use crate::pivot::PivotRequest;
pub use crate::traits::{Array, Transform};

pub(crate) use crate::Error;
pub(crate) use crate::GridAxis;

pub(crate) use std::io::Write;

pub(crate) use derive_more::{Constructor, Deref, DerefMut, Display, From, Into};

pub(crate) use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};
