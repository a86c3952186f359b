//! # Traits
//!
//! `Array` describes how numeric data is written inline into the `DataArray`
//! elements of a VTK file, `Transform` is anything that can be applied to a
//! [`Grid2D`] in place.

use crate::prelude::*;
use crate::write_vtk::{close_inline_array_header, write_inline_array_header, Encoding};

use quick_xml::events::{BytesText, Event};
use quick_xml::Writer;

/// An operation that mutates a grid in place.
///
/// Implementations either succeed completely or leave the grid as it was.
pub trait Transform {
    fn apply(&self, grid: &mut Grid2D) -> Result<(), Error>;
}

impl<T: Transform> Transform for [T] {
    /// apply every transform in order, stopping at the first failure
    fn apply(&self, grid: &mut Grid2D) -> Result<(), Error> {
        self.iter().try_for_each(|transform| transform.apply(grid))
    }
}

impl<T: Transform> Transform for Vec<T> {
    fn apply(&self, grid: &mut Grid2D) -> Result<(), Error> {
        self.as_slice().apply(grid)
    }
}

/// Describes how to write an array inline into a vtk file.
///
/// `ascii` writes every number as text, `base64` writes the little endian bytes
/// behind a `UInt64` header holding the number of data bytes.
pub trait Array {
    fn write_ascii<W: Write>(&self, writer: &mut Writer<W>, name: &str) -> Result<(), Error>;

    fn write_base64<W: Write>(&self, writer: &mut Writer<W>, name: &str) -> Result<(), Error>;

    /// number of values, including every component
    fn length(&self) -> usize;

    fn components(&self) -> usize {
        1
    }
}

fn ascii_text<'a, I: Iterator<Item = &'a f64>>(values: I) -> String {
    let mut buffer = ryu::Buffer::new();

    let mut data = values.fold(String::new(), |mut data, float| {
        data.push_str(buffer.format(*float));
        data.push(' ');
        data
    });

    // trailing separator
    data.pop();
    data
}

fn base64_text<'a, I: Iterator<Item = &'a f64>>(values: I, length: usize) -> String {
    let mut byte_data: Vec<u8> = Vec::with_capacity((length + 1) * 8);
    byte_data.extend_from_slice(&((length * 8) as u64).to_le_bytes());

    values.for_each(|float| byte_data.extend_from_slice(&float.to_le_bytes()));

    base64::encode(byte_data.as_slice())
}

fn write_inline<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    components: usize,
    encoding: Encoding,
    text: &str,
) -> Result<(), Error> {
    write_inline_array_header(writer, encoding, name, components)?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    close_inline_array_header(writer)?;
    Ok(())
}

impl Array for &[f64] {
    fn write_ascii<W: Write>(&self, writer: &mut Writer<W>, name: &str) -> Result<(), Error> {
        write_inline(writer, name, 1, Encoding::Ascii, &ascii_text(self.iter()))
    }

    fn write_base64<W: Write>(&self, writer: &mut Writer<W>, name: &str) -> Result<(), Error> {
        let text = base64_text(self.iter(), self.len());
        write_inline(writer, name, 1, Encoding::Base64, &text)
    }

    fn length(&self) -> usize {
        self.len()
    }
}

impl Array for Vec<f64> {
    fn write_ascii<W: Write>(&self, writer: &mut Writer<W>, name: &str) -> Result<(), Error> {
        self.as_slice().write_ascii(writer, name)
    }

    fn write_base64<W: Write>(&self, writer: &mut Writer<W>, name: &str) -> Result<(), Error> {
        self.as_slice().write_base64(writer, name)
    }

    fn length(&self) -> usize {
        self.len()
    }
}

impl Array for Array1<f64> {
    fn write_ascii<W: Write>(&self, writer: &mut Writer<W>, name: &str) -> Result<(), Error> {
        write_inline(writer, name, 1, Encoding::Ascii, &ascii_text(self.iter()))
    }

    fn write_base64<W: Write>(&self, writer: &mut Writer<W>, name: &str) -> Result<(), Error> {
        let text = base64_text(self.iter(), self.len());
        write_inline(writer, name, 1, Encoding::Base64, &text)
    }

    fn length(&self) -> usize {
        self.len()
    }
}

/// every row is one tuple of `ncols` components
impl Array for Array2<f64> {
    fn write_ascii<W: Write>(&self, writer: &mut Writer<W>, name: &str) -> Result<(), Error> {
        let text = ascii_text(self.iter());
        write_inline(writer, name, self.components(), Encoding::Ascii, &text)
    }

    fn write_base64<W: Write>(&self, writer: &mut Writer<W>, name: &str) -> Result<(), Error> {
        let text = base64_text(self.iter(), self.len());
        write_inline(writer, name, self.components(), Encoding::Base64, &text)
    }

    fn length(&self) -> usize {
        self.len()
    }

    fn components(&self) -> usize {
        self.ncols()
    }
}
