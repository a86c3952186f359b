use crate::Error;
use ndarray::{s, Array1, Array2, ArrayView1};
use std::collections::BTreeMap;

/// Parameter → value pairs of a single instrument in a settings file
pub type InstrumentSettings = Vec<(String, String)>;

/// One column of a [`ScanTable`]
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub id: String,
    pub label: String,
    /// number of distinct values this column was swept over. Anything above one
    /// marks the column as a setpoint (independent variable).
    pub size: usize,
}

impl Column {
    pub fn new<T: Into<String>>(id: T, size: usize) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            size,
        }
    }

    pub fn is_setpoint(&self) -> bool {
        self.size > 1
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Column based table of scan records.
///
/// Every row of `data` is one measurement record, every column corresponds to the
/// entry of the same index in `columns`. This is the input of [`pivot`](`crate::pivot()`).
pub struct ScanTable {
    pub filename: String,
    pub timestamp: String,
    pub columns: Vec<Column>,
    pub data: Array2<f64>,
    /// instrument name → settings, only used as metadata. Top level entries such
    /// as `Filename` and `Timestamp` are stored under the empty instrument name.
    pub settings: BTreeMap<String, InstrumentSettings>,
}

impl ScanTable {
    /// construct a table from column descriptions and a record matrix
    pub fn new(columns: Vec<Column>, data: Array2<f64>) -> Self {
        Self {
            columns,
            data,
            ..Default::default()
        }
    }

    /// all the column ids in file order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.id.as_str())
    }

    /// number of records (rows)
    pub fn records(&self) -> usize {
        self.data.nrows()
    }

    /// number of swept dimensions in the table
    pub fn ndim(&self) -> usize {
        self.setpoint_columns().count()
    }

    /// the setpoint columns, in file order
    pub fn setpoint_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_setpoint())
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id == name)
    }

    /// the values of a single column, `None` if the column does not exist
    pub fn column(&self, name: &str) -> Option<ArrayView1<f64>> {
        self.index_of(name)
            .map(|idx| self.data.slice(s![.., idx]))
    }

    /// Overwrite a column, or append it as a new non-setpoint column if there is
    /// no column with this name yet. `values` needs one entry per record.
    pub fn set_column(&mut self, name: &str, values: Array1<f64>) -> Result<(), Error> {
        if values.len() != self.records() {
            return Err(Error::ShapeMismatch {
                name: "column",
                expected: (self.records(), 1),
                actual: (values.len(), 1),
            });
        }

        match self.index_of(name) {
            Some(idx) => self.data.column_mut(idx).assign(&values),
            None => {
                let mut data = Array2::zeros((self.records(), self.columns.len() + 1));
                data.slice_mut(s![.., ..self.columns.len()]).assign(&self.data);
                data.column_mut(self.columns.len()).assign(&values);

                self.data = data;
                self.columns.push(Column::new(name, 1));
            }
        }

        Ok(())
    }

    /// all `(id, value)` pairs of a single record
    pub fn row_info(&self, row: usize) -> Option<Vec<(&str, f64)>> {
        if row >= self.records() {
            return None;
        }

        let info = self
            .ids()
            .zip(self.data.row(row).iter().copied())
            .collect();

        Some(info)
    }
}
