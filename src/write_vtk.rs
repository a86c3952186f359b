//! # VTK export
//!
//! Writes a [`Grid2D`] as a VTK XML `StructuredGrid` (`.vts`). The cell centers
//! become points `(x, y, 0)` of a structured mesh with the columns of the grid as
//! the fastest running index, and `z` is written as point data.
//!
//! The arrays are written inline, either as ascii text or base64 encoded bytes.

use crate::prelude::*;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

/// the encoding to use when writing an inline dataarray
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    Ascii,
    #[default]
    Base64,
}

impl Encoding {
    fn to_str(self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::Base64 => "binary",
        }
    }
}

/// Write `grid` as a VTK StructuredGrid file to `writer`
///
/// # Example
///
/// ```
/// use sweepgrid::ndarray::array;
///
/// let grid = sweepgrid::Grid2D::new(
///     array![[0.0, 1.0], [0.0, 1.0]],
///     array![[0.0, 0.0], [1.0, 1.0]],
///     array![[1.0, 2.0], [3.0, 4.0]],
/// )
/// .unwrap();
///
/// let mut file = Vec::new();
/// sweepgrid::write_vts(&mut file, &grid, sweepgrid::Encoding::Ascii).unwrap();
///
/// let text = String::from_utf8(file).unwrap();
/// assert!(text.contains(r#"WholeExtent="0 1 0 1 0 0""#));
/// ```
pub fn write_vts<W: Write>(writer: W, grid: &Grid2D, encoding: Encoding) -> Result<(), Error> {
    let mut writer = Writer::new_with_indent(writer, b' ', 4);
    let (rows, cols) = grid.shape();

    let extent = format!(
        "0 {} 0 {} 0 0",
        cols.saturating_sub(1),
        rows.saturating_sub(1)
    );

    let name = if grid.meta.z_name.is_empty() {
        "z"
    } else {
        grid.meta.z_name.as_str()
    };

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer.write_event(Event::Start(BytesStart::new("VTKFile").with_attributes([
        ("type", "StructuredGrid"),
        ("version", "1.0"),
        ("byte_order", "LittleEndian"),
        ("header_type", "UInt64"),
    ])))?;

    writer.write_event(Event::Start(
        BytesStart::new("StructuredGrid").with_attributes([("WholeExtent", extent.as_str())]),
    ))?;

    writer.write_event(Event::Start(
        BytesStart::new("Piece").with_attributes([("Extent", extent.as_str())]),
    ))?;

    writer.write_event(Event::Start(
        BytesStart::new("PointData").with_attributes([("Scalars", name)]),
    ))?;

    let values: Vec<f64> = grid.z().iter().copied().collect();
    write_inline_dataarray(&mut writer, &values, name, encoding)?;

    writer.write_event(Event::End(BytesEnd::new("PointData")))?;

    writer.write_event(Event::Start(BytesStart::new("Points")))?;

    let points = point_coordinates(grid);
    write_inline_dataarray(&mut writer, &points, "Points", encoding)?;

    writer.write_event(Event::End(BytesEnd::new("Points")))?;
    writer.write_event(Event::End(BytesEnd::new("Piece")))?;
    writer.write_event(Event::End(BytesEnd::new("StructuredGrid")))?;
    writer.write_event(Event::End(BytesEnd::new("VTKFile")))?;

    Ok(())
}

/// `(x, y, 0)` for every cell, columns running fastest
fn point_coordinates(grid: &Grid2D) -> Array2<f64> {
    let mut points = Array2::zeros((grid.z().len(), 3));

    for (mut point, (x, y)) in points
        .rows_mut()
        .into_iter()
        .zip(grid.x().iter().zip(grid.y().iter()))
    {
        point[0] = *x;
        point[1] = *y;
    }

    points
}

pub(crate) fn write_inline_array_header<W: Write>(
    writer: &mut Writer<W>,
    format: Encoding,
    name: &str,
    components: usize,
) -> Result<(), Error> {
    let components = components.to_string();

    let header = BytesStart::new("DataArray").with_attributes([
        ("type", "Float64"),
        ("NumberOfComponents", components.as_str()),
        ("Name", name),
        ("format", format.to_str()),
    ]);

    writer.write_event(Event::Start(header))?;

    Ok(())
}

pub(crate) fn close_inline_array_header<W: Write>(writer: &mut Writer<W>) -> Result<(), Error> {
    writer.write_event(Event::End(BytesEnd::new("DataArray")))?;

    Ok(())
}

/// write a single (inline) array of data to the vtk file
pub fn write_inline_dataarray<W: Write, A: Array>(
    writer: &mut Writer<W>,
    data: &A,
    name: &str,
    encoding: Encoding,
) -> Result<(), Error> {
    match encoding {
        Encoding::Ascii => data.write_ascii(writer, name),
        Encoding::Base64 => data.write_base64(writer, name),
    }
}
