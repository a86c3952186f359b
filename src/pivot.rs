//! # Pivot
//!
//! Turns the flat records of a [`ScanTable`] into a dense [`Grid2D`]. Every record
//! is placed in the cell addressed by the rank of its setpoint values among the
//! unique values of the setpoint columns.

use crate::grid::Cells;
use crate::prelude::*;
use crate::utils;

/// Which columns of a table end up as `x`, `y` and `z` of the grid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PivotRequest {
    pub x: Option<String>,
    /// ignored for one dimensional tables
    pub y: Option<String>,
    pub z: String,
    /// (x, y) flags copied into the grid metadata
    pub equidistant: (bool, bool),
    /// (x, y) flags, see [`Grid2D::regularize_axes`]
    pub varying: (bool, bool),
}

impl PivotRequest {
    pub fn new<X: Into<String>, Z: Into<String>>(x: X, z: Z) -> Self {
        Self {
            x: Some(x.into()),
            z: z.into(),
            ..Default::default()
        }
    }

    pub fn with_y<Y: Into<String>>(mut self, y: Y) -> Self {
        self.y = Some(y.into());
        self
    }

    pub fn with_varying(mut self, x: bool, y: bool) -> Self {
        self.varying = (x, y);
        self
    }

    pub fn with_equidistant(mut self, x: bool, y: bool) -> Self {
        self.equidistant = (x, y);
        self
    }
}

fn named(name: &Option<String>) -> Option<&str> {
    name.as_deref().filter(|name| !name.is_empty())
}

fn column<'a>(table: &'a ScanTable, name: &str) -> Result<ArrayView1<'a, f64>, Error> {
    table
        .column(name)
        .ok_or_else(|| Error::MissingColumn(name.to_string()))
}

/// Pivot the records of `table` into a grid.
///
/// The first setpoint column indexes the grid columns, the second one the rows.
/// A table with a single setpoint column gives a grid with a single row. When no
/// `y` parameter is in effect, the `y` coordinates and setpoints are zero.
///
/// If several records share a pair of setpoint values, the last one in the
/// table wins. The result has canonical orientation (see
/// [`Grid2D::canonicalize_orientation`]) and regularized `varying` axes.
pub fn pivot(table: &ScanTable, request: &PivotRequest) -> Result<Grid2D, Error> {
    let setpoints: Vec<&Column> = table.setpoint_columns().collect();

    if setpoints.is_empty() {
        return Err(Error::Configuration(
            "no setpoint columns with a size above one were found".into(),
        ));
    }

    if setpoints.len() > 2 {
        tracing::warn!(
            count = setpoints.len(),
            "found more than two setpoint columns, using the first two"
        );
    }

    let x_name = named(&request.x)
        .ok_or_else(|| Error::Input("a parameter has to be selected for the x axis".into()))?;

    let mut y_name = named(&request.y);
    if y_name.is_some() && setpoints.len() < 2 {
        tracing::warn!("ignoring the y axis parameter since the table is one dimensional");
        y_name = None;
    }

    let records = table.records();
    if records == 0 {
        return Err(Error::Input("the table has no records".into()));
    }

    let x_setpoints = column(table, &setpoints[0].id)?;
    let x_data = column(table, x_name)?;
    let z_data = column(table, &request.z)?;

    let zeros = Array1::zeros(records);
    let (y_setpoints, y_data, y_setpoints_name) = match y_name {
        Some(y_name) => (
            column(table, &setpoints[1].id)?,
            column(table, y_name)?,
            Some(setpoints[1].id.clone()),
        ),
        None => (zeros.view(), zeros.view(), None),
    };

    let (unique_cols, col_index) = utils::unique_with_inverse(x_setpoints);
    let (unique_rows, row_index) = utils::unique_with_inverse(y_setpoints);
    let shape = (unique_rows.len(), unique_cols.len());

    tracing::debug!(records, rows = shape.0, cols = shape.1, "pivoting table");

    let mut cells = Cells {
        x: Array2::from_elem(shape, f64::NAN),
        y: Array2::from_elem(shape, f64::NAN),
        z: Array2::from_elem(shape, f64::NAN),
        x_setpoints: Array2::from_elem(shape, f64::NAN),
        y_setpoints: Array2::from_elem(shape, f64::NAN),
        row_numbers: Array2::from_elem(shape, None),
    };

    // in file order, so that later duplicates overwrite earlier ones
    for record in 0..records {
        let cell = [row_index[record], col_index[record]];

        cells.x_setpoints[cell] = x_setpoints[record];
        cells.y_setpoints[cell] = y_setpoints[record];
        cells.x[cell] = x_data[record];
        cells.y[cell] = y_data[record];
        cells.z[cell] = z_data[record];
        cells.row_numbers[cell] = Some(record);
    }

    let meta = GridMeta {
        x_name: x_name.to_string(),
        y_name: y_name.unwrap_or_default().to_string(),
        z_name: request.z.clone(),
        x_setpoints_name: setpoints[0].id.clone(),
        y_setpoints_name,
        filename: table.filename.clone(),
        timestamp: table.timestamp.clone(),
        equidistant: request.equidistant,
        varying: request.varying,
    };

    let mut grid = Grid2D::from_cells(cells, meta)?;
    grid.canonicalize_orientation();
    grid.regularize_axes();

    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// 3 x 2 sweep with gate as the fast axis, in scrambled order
    fn table() -> ScanTable {
        ScanTable::new(
            vec![
                Column::new("gate", 3),
                Column::new("bias", 2),
                Column::new("current", 1),
            ],
            array![
                [0.2, 1.0, 12.0],
                [0.0, 0.0, 0.0],
                [0.1, 0.0, 1.0],
                [0.2, 0.0, 2.0],
                [0.0, 1.0, 10.0],
                [0.1, 1.0, 11.0],
            ],
        )
    }

    fn request() -> PivotRequest {
        PivotRequest::new("gate", "current").with_y("bias")
    }

    #[test]
    fn cells_are_addressed_by_setpoint_rank() {
        let table = table();
        let grid = pivot(&table, &request()).unwrap();

        assert_eq!(grid.shape(), (2, 3));
        assert_eq!(grid.z(), &array![[0.0, 1.0, 2.0], [10.0, 11.0, 12.0]]);
        assert_eq!(grid.x().row(1).to_vec(), vec![0.0, 0.1, 0.2]);
        assert_eq!(grid.y().column(0).to_vec(), vec![0.0, 1.0]);

        for ((r, c), row) in grid.row_numbers().indexed_iter() {
            let record = row.unwrap();
            assert_eq!(table.data[[record, 2]], grid.z()[[r, c]]);
        }

        assert_eq!(grid.meta.x_setpoints_name, "gate");
        assert_eq!(grid.meta.y_setpoints_name.as_deref(), Some("bias"));
    }

    #[test]
    fn later_duplicates_win() {
        let mut table = table();
        let mut data = Array2::zeros((7, 3));
        data.slice_mut(s![..6, ..]).assign(&table.data);
        data.row_mut(6).assign(&array![0.1, 0.0, -1.0]);
        table.data = data;

        let grid = pivot(&table, &request()).unwrap();
        assert_eq!(grid.z()[[0, 1]], -1.0);
        assert_eq!(grid.row_numbers()[[0, 1]], Some(6));
    }

    #[test]
    fn missing_cells_are_nan() {
        let mut table = table();
        table.data = table.data.slice(s![..5, ..]).to_owned();

        let grid = pivot(&table, &request()).unwrap();
        assert!(grid.z()[[1, 1]].is_nan());
        assert_eq!(grid.row_numbers()[[1, 1]], None);
        assert_eq!(grid.z()[[1, 0]], 10.0);
    }

    #[test]
    fn orientation_puts_x_along_rows() {
        // bias is the first setpoint column now, so the pivot comes out transposed
        let table = ScanTable::new(
            vec![
                Column::new("bias", 2),
                Column::new("gate", 3),
                Column::new("current", 1),
            ],
            array![
                [0.0, 0.0, 0.0],
                [0.0, 0.1, 1.0],
                [0.0, 0.2, 2.0],
                [1.0, 0.0, 10.0],
                [1.0, 0.1, 11.0],
                [1.0, 0.2, 12.0],
            ],
        );

        let grid = pivot(&table, &PivotRequest::new("gate", "current").with_y("bias")).unwrap();
        let along_rows = utils::nanmean(utils::nan_ptp(grid.x().view(), ndarray::Axis(1)).iter());
        let down_columns = utils::nanmean(utils::nan_ptp(grid.x().view(), ndarray::Axis(0)).iter());

        assert!(along_rows >= down_columns);
        assert_eq!(grid.shape(), (2, 3));
        assert_eq!(grid.z(), &array![[0.0, 1.0, 2.0], [10.0, 11.0, 12.0]]);
    }

    #[test]
    fn one_dimensional_tables_give_a_single_row() {
        let table = ScanTable::new(
            vec![Column::new("gate", 3), Column::new("current", 1)],
            array![[0.0, 5.0], [1.0, 6.0], [2.0, 7.0]],
        );

        let request = PivotRequest::new("gate", "current").with_y("current");
        let grid = pivot(&table, &request).unwrap();

        assert_eq!(grid.shape(), (1, 3));
        assert_eq!(grid.y(), &Array2::<f64>::zeros((1, 3)));
        assert_eq!(grid.meta.y_name, "");
        assert_eq!(grid.meta.y_setpoints_name, None);
    }

    #[test]
    fn extra_setpoint_columns_are_ignored() {
        let mut table = table();
        table.columns[2].size = 4;

        let grid = pivot(&table, &request()).unwrap();
        assert_eq!(grid.shape(), (2, 3));
    }

    #[test]
    fn invalid_requests_fail() {
        let table = table();

        let no_x = PivotRequest {
            z: "current".into(),
            ..Default::default()
        };
        assert!(matches!(pivot(&table, &no_x), Err(Error::Input(_))));

        let missing = PivotRequest::new("gate", "voltage");
        assert!(matches!(pivot(&table, &missing), Err(Error::MissingColumn(name)) if name == "voltage"));

        let flat = ScanTable::new(vec![Column::new("current", 1)], array![[1.0], [2.0]]);
        let request = PivotRequest::new("current", "current");
        assert!(matches!(pivot(&flat, &request), Err(Error::Configuration(_))));
    }
}
