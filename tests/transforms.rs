use sweepgrid::data::Column;
use sweepgrid::ndarray::{array, Array2};
use sweepgrid::{
    pivot, DerivMethod, Error, Grid2D, Kernel, LinecutKind, Operation, PivotRequest, ScanTable,
    Transform,
};

fn three_by_three() -> Grid2D {
    Grid2D::new(
        array![[0.0, 1.0, 2.0], [0.0, 1.0, 2.0], [0.0, 1.0, 2.0]],
        array![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]],
        array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]],
    )
    .unwrap()
}

/// a 4 x 5 sweep of `current = 2 gate + bias`
fn sweep() -> ScanTable {
    let mut records = Vec::new();
    for bias in 0..4 {
        for gate in 0..5 {
            let (g, b) = (gate as f64 * 0.25, bias as f64 * 0.5);
            records.extend([g, b, g * 2.0 + b, 1.0]);
        }
    }

    ScanTable::new(
        vec![
            Column::new("gate", 5),
            Column::new("bias", 4),
            Column::new("current", 1),
            Column::new("temperature", 1),
        ],
        Array2::from_shape_vec((20, 4), records).unwrap(),
    )
}

#[test]
fn three_by_three_scenario() {
    let mut derivative = three_by_three();
    derivative.xderiv(DerivMethod::Midpoint).unwrap();
    assert_eq!(derivative.shape(), (3, 2));
    assert!(derivative.z().iter().all(|v| *v == 1.0));

    let mut cropped = three_by_three();
    cropped.crop(0, 2, 0, 2).unwrap();
    assert_eq!(cropped.z(), &array![[1.0, 2.0], [4.0, 5.0]]);

    let mut nan = three_by_three();
    nan.set_data(
        nan.x().clone(),
        nan.y().clone(),
        array![[1.0, 2.0, 3.0], [4.0, f64::NAN, 6.0], [7.0, 8.0, 9.0]],
    )
    .unwrap();
    nan.xderiv(DerivMethod::Midpoint).unwrap();
    assert!(nan.z()[[1, 0]].is_nan() && nan.z()[[1, 1]].is_nan());
    assert_eq!(nan.z().iter().filter(|v| v.is_nan()).count(), 2);
}

#[test]
fn pivoted_sweep_through_a_chain() {
    let table = sweep();
    let request = PivotRequest::new("gate", "current").with_y("bias");
    let mut grid = pivot(&table, &request).unwrap();

    assert_eq!(grid.shape(), (4, 5));
    assert_eq!(grid.meta.x_setpoints_name, "gate");
    assert_eq!(grid.meta.y_setpoints_name.as_deref(), Some("bias"));

    let chain = vec![
        Operation::Gradmag {
            method: DerivMethod::Central,
        },
        Operation::ScaleData { factor: 0.5 },
    ];
    chain.apply(&mut grid).unwrap();

    // |(2, 1)| / 2
    assert_eq!(grid.shape(), (2, 3));
    assert!(grid.z().iter().all(|v| (v - 5f64.sqrt() / 2.0).abs() < 1e-12));
    assert!(grid.row_numbers().iter().all(Option::is_some));
}

#[test]
fn failing_operations_leave_the_grid_alone() {
    let mut grid = three_by_three();
    let before = grid.deep_copy();

    let failures = [
        Operation::Crop {
            left: 0,
            right: 4,
            bottom: 0,
            top: -1,
        },
        Operation::Hist2d {
            min: 1.0,
            max: 1.0,
            bins: 3,
        },
        Operation::SubLinecutAvg {
            kind: LinecutKind::Horizontal,
            position: 0.0,
            size: 0,
        },
        Operation::InterpX { points: 0 },
    ];

    for operation in failures {
        assert!(operation.apply(&mut grid).is_err(), "{operation:?}");
        assert_eq!(grid, before);
    }

    let mut narrow = Grid2D::new(
        array![[0.0, 1.0]],
        array![[0.0, 0.0]],
        array![[1.0, 2.0]],
    )
    .unwrap();
    let err = Operation::Yderiv {
        method: DerivMethod::Midpoint,
    }
    .apply(&mut narrow);
    assert!(matches!(err, Err(Error::InsufficientSize { needed: 2, actual: 1, .. })));
}

#[test]
fn filters_keep_nan_where_it_was() {
    let z = Array2::from_shape_fn((6, 8), |(r, c)| if (r, c) == (3, 4) { f64::NAN } else { (r * c) as f64 });
    let x = Array2::from_shape_fn((6, 8), |(_, c)| c as f64);
    let y = Array2::from_shape_fn((6, 8), |(r, _)| r as f64);
    let grid = Grid2D::new(x, y, z).unwrap();

    let operations = [
        Operation::Abs,
        Operation::Negate,
        Operation::Equalize,
        Operation::NormColumns,
        Operation::NormRows,
        Operation::Log {
            subtract: true,
            floor: 1.0,
        },
        Operation::SubPlane {
            x_slope: 1.0,
            y_slope: 1.0,
        },
        Operation::default_lowpass(),
        Operation::Highpass {
            x_width: 1.0,
            y_height: 1.0,
            kernel: Kernel::Lorentzian,
        },
    ];

    for operation in operations {
        let mut filtered = grid.deep_copy();
        operation.apply(&mut filtered).unwrap();
        assert!(filtered.z()[[3, 4]].is_nan(), "{operation:?}");
    }
}

#[test]
fn resampling_replaces_the_provenance() {
    let table = sweep();
    let request = PivotRequest::new("gate", "current").with_y("bias");
    let mut grid = pivot(&table, &request).unwrap();

    grid.interp_grid(9, 7).unwrap();

    assert_eq!(grid.shape(), (7, 9));
    assert!(grid.row_numbers().iter().all(Option::is_none));
    for ((x, y), z) in grid.x().iter().zip(grid.y().iter()).zip(grid.z().iter()) {
        assert!((z - (2.0 * x + y)).abs() < 1e-9);
    }
}
