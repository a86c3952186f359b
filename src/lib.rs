#![doc = include_str!("../README.md")]

pub mod data;
pub mod grid;
pub mod mesh;
pub mod ops;
pub mod parse;
pub mod pivot;
pub mod prelude;
mod save;
mod traits;
pub mod triangulation;
mod utils;
pub mod write_vtk;

pub use data::ScanTable;
pub use grid::{Cells, Grid2D, GridMeta, Limits, Linecut};
pub use mesh::{pcolor, quadrilaterals, MaskedArray, PcolorMesh};
pub use ops::{DerivMethod, Kernel, LinecutKind, Operation};
pub use pivot::{pivot, PivotRequest};
pub use triangulation::Triangulation;

pub use traits::{Array, Transform};
pub use save::{write_dat, write_mat, write_npy};
pub use write_vtk::{write_vts, Encoding};

pub use parse::read_dat;
pub use parse::ParseError;

pub use ndarray;

/// Which axis of a grid an error or operation refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum GridAxis {
    #[display(fmt = "x")]
    X,
    #[display(fmt = "y")]
    Y,
}

/// general purpose error enumeration for possible causes of failure.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("cannot pivot the table: {0}")]
    Configuration(String),
    #[error("invalid pivot request: {0}")]
    Input(String),
    #[error("column `{0}` does not exist in the table")]
    MissingColumn(String),
    #[error("no triangulation could be built: {0}")]
    GeometryUnavailable(String),
    #[error("invalid crop bounds: left={left} right={right} bottom={bottom} top={top} on a {rows}x{cols} grid")]
    Bounds {
        left: isize,
        right: isize,
        bottom: isize,
        top: isize,
        rows: usize,
        cols: usize,
    },
    #[error("matrix `{name}` has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        name: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("the {axis} axis has {actual} points, at least {needed} are required")]
    InsufficientSize {
        axis: GridAxis,
        needed: usize,
        actual: usize,
    },
    #[error("invalid parameter: {0}")]
    Parameter(String),
    #[error("unsupported file extension `{0}`, expected one of npy, dat, vts")]
    UnsupportedFormat(String),
    #[error("An io error occured: `{0}`")]
    Io(#[from] std::io::Error),
    #[error("Error while parsing a scan file")]
    Parse(#[from] parse::ParseError),
    #[error("Could not write XML data to file: `{0}`")]
    XmlWrite(#[from] quick_xml::Error),
}
