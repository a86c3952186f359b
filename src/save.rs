//! Persistence of a [`Grid2D`]: NumPy `.npy`, MATLAB `.mat`, QTLab style `.dat`
//! and VTK `.vts`

use crate::prelude::*;
use crate::write_vtk::{write_vts, Encoding};

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const NPY_MAGIC: &[u8] = b"\x93NUMPY";

/// descriptive text at the start of a MAT v5 file, padded to 116 bytes
const MAT_TEXT: &str = "MATLAB 5.0 MAT-file, written by sweepgrid";

// MAT v5 data types and array class
const MI_INT8: u32 = 1;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_DOUBLE: u32 = 9;
const MI_MATRIX: u32 = 14;
const MX_DOUBLE_CLASS: u32 = 6;

impl Grid2D {
    /// Save the grid to `path`, with the format picked by the extension:
    ///
    /// * `npy`: see [`write_npy`]
    /// * `mat`: see [`write_mat`]
    /// * `dat`: see [`write_dat`]
    /// * `vts`: see [`write_vts`], base64 encoded
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let write = |path: &Path| -> Result<BufWriter<File>, Error> {
            Ok(BufWriter::new(File::create(path)?))
        };

        match extension.as_str() {
            "npy" => write_npy(write(path)?, self)?,
            "mat" => write_mat(write(path)?, self)?,
            "dat" => write_dat(write(path)?, self)?,
            "vts" => write_vts(write(path)?, self, Encoding::default())?,
            _ => return Err(Error::UnsupportedFormat(extension)),
        }

        tracing::info!(path = %path.display(), shape = ?self.shape(), "saved grid");

        Ok(())
    }
}

/// Write the grid as an `R x C x 3` little endian `f64` NumPy array holding the
/// `x`, `y` and `z` of every cell.
pub fn write_npy<W: Write>(mut writer: W, grid: &Grid2D) -> Result<(), Error> {
    let (rows, cols) = grid.shape();

    let mut header = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({}, {}, 3), }}",
        rows, cols
    );

    // magic, version and header length take 10 bytes; the header ends in a
    // newline and the data starts on a multiple of 64
    let unpadded = NPY_MAGIC.len() + 4 + header.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    header.extend(std::iter::repeat(' ').take(padding));
    header.push('\n');

    writer.write_all(NPY_MAGIC)?;
    writer.write_all(&[1, 0])?;
    writer.write_all(&(header.len() as u16).to_le_bytes())?;
    writer.write_all(header.as_bytes())?;

    let cells = grid.x().iter().zip(grid.y().iter()).zip(grid.z().iter());
    for ((x, y), z) in cells {
        writer.write_all(&x.to_le_bytes())?;
        writer.write_all(&y.to_le_bytes())?;
        writer.write_all(&z.to_le_bytes())?;
    }

    writer.flush()?;

    Ok(())
}

/// tag of a MAT v5 data element
fn write_tag<W: Write>(writer: &mut W, data_type: u32, bytes: u32) -> Result<(), Error> {
    writer.write_all(&data_type.to_le_bytes())?;
    writer.write_all(&bytes.to_le_bytes())?;
    Ok(())
}

/// zero bytes up to the next multiple of 8
fn pad8(bytes: usize) -> usize {
    (8 - bytes % 8) % 8
}

/// Write the grid as a level 5 MATLAB file holding one `R x C x 3` double
/// matrix named `data`, the `x`, `y` and `z` of every cell stacked along the
/// third dimension.
pub fn write_mat<W: Write>(mut writer: W, grid: &Grid2D) -> Result<(), Error> {
    let (rows, cols) = grid.shape();
    let name = b"data";

    let too_large = || Error::Parameter(format!("a {rows} x {cols} grid does not fit a MAT v5 file"));
    let payload = u32::try_from(rows * cols * 3 * 8).map_err(|_| too_large())?;
    let dims = [rows, cols, 3]
        .iter()
        .map(|&d| i32::try_from(d).map_err(|_| too_large()))
        .collect::<Result<Vec<i32>, Error>>()?;

    // flags, dimensions, name and real part, each behind an 8 byte tag
    let matrix_bytes = (8 + 8)
        + (8 + 12 + pad8(12))
        + (8 + name.len() + pad8(name.len()))
        + 8
        + payload as usize;
    let matrix_bytes = u32::try_from(matrix_bytes).map_err(|_| too_large())?;

    let mut text = MAT_TEXT.as_bytes().to_vec();
    text.resize(116, b' ');
    writer.write_all(&text)?;
    // no subsystem data, version 0x0100, little endian marker
    writer.write_all(&[0; 8])?;
    writer.write_all(&0x0100u16.to_le_bytes())?;
    writer.write_all(b"IM")?;

    write_tag(&mut writer, MI_MATRIX, matrix_bytes)?;

    write_tag(&mut writer, MI_UINT32, 8)?;
    writer.write_all(&MX_DOUBLE_CLASS.to_le_bytes())?;
    writer.write_all(&0u32.to_le_bytes())?;

    write_tag(&mut writer, MI_INT32, 12)?;
    for dim in dims {
        writer.write_all(&dim.to_le_bytes())?;
    }
    writer.write_all(&[0; 4])?;

    write_tag(&mut writer, MI_INT8, name.len() as u32)?;
    writer.write_all(name)?;
    writer.write_all(&vec![0; pad8(name.len())])?;

    // column major: rows vary fastest, then columns, then the component
    write_tag(&mut writer, MI_DOUBLE, payload)?;
    for component in [grid.x(), grid.y(), grid.z()] {
        for value in component.t().iter() {
            writer.write_all(&value.to_le_bytes())?;
        }
    }

    writer.flush()?;

    Ok(())
}

/// `%.12e` style formatting: twelve decimals and a signed, two digit exponent
fn scientific(value: f64) -> String {
    if value.is_nan() {
        return "nan".into();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf".into() } else { "-inf".into() };
    }

    let formatted = format!("{:.12e}", value);

    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        None => formatted,
    }
}

/// Write the grid as a QTLab `.dat` file.
///
/// The header has one block per column: the setpoint columns with their sizes
/// (the `y` setpoints only if the grid has a second setpoint axis), then `x`,
/// `y` and `z`. Every cell that was filled by a record becomes one tab separated
/// row in `%.12e` notation, so that [`read_dat`](`crate::read_dat`) followed by
/// [`pivot`](`crate::pivot()`) gives back an equivalent grid.
pub fn write_dat<W: Write>(mut writer: W, grid: &Grid2D) -> Result<(), Error> {
    let meta = &grid.meta;
    let (rows, cols) = grid.shape();

    writeln!(writer, "# Filename: {}", meta.filename)?;
    writeln!(writer, "# Timestamp: {}", meta.timestamp)?;
    writeln!(writer)?;

    let mut columns: Vec<(&str, Option<usize>, &Array2<f64>)> =
        vec![(meta.x_setpoints_name.as_str(), Some(cols), grid.x_setpoints())];

    if let Some(name) = &meta.y_setpoints_name {
        columns.push((name.as_str(), Some(rows), grid.y_setpoints()));
    }

    columns.push((meta.x_name.as_str(), None, grid.x()));
    columns.push((meta.y_name.as_str(), None, grid.y()));
    columns.push((meta.z_name.as_str(), None, grid.z()));

    for (idx, (name, size, _)) in columns.iter().enumerate() {
        writeln!(writer, "# Column {}", idx + 1)?;
        writeln!(writer, "#\tname: {}", name)?;

        if let Some(size) = size {
            writeln!(writer, "#\tsize: {}", size)?;
        }
    }

    writeln!(writer)?;

    for ((r, c), x_setpoint) in grid.x_setpoints().indexed_iter() {
        // cells without a record have no setpoints to write
        if x_setpoint.is_nan() {
            continue;
        }

        let line = columns
            .iter()
            .map(|(_, _, values)| scientific(values[[r, c]]))
            .collect::<Vec<_>>()
            .join("\t");

        writeln!(writer, "{}", line)?;
    }

    writer.flush()?;

    Ok(())
}
