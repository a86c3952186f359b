use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use sweepgrid::{Grid2D, Kernel};

fn random_grid(n: usize) -> Grid2D {
    let x = Array2::from_shape_fn((n, n), |(_, c)| c as f64);
    let y = Array2::from_shape_fn((n, n), |(r, _)| r as f64);
    let z = Array2::random((n, n), Uniform::new(0., 10.));

    Grid2D::new(x, y, z).unwrap()
}

fn lowpass(grid: &Grid2D, width: f64) {
    let mut copy = grid.deep_copy();
    copy.lowpass(width, width, Kernel::Gaussian).unwrap();
}

fn convolve_bench(c: &mut Criterion) {
    let grid = random_grid(200);

    c.bench_function("lowpass 200x200 width 1", |b| {
        b.iter(|| lowpass(black_box(&grid), 1.0))
    });

    c.bench_function("lowpass 200x200 width 3", |b| {
        b.iter(|| lowpass(black_box(&grid), 3.0))
    });

    c.bench_function("interp_x 200x200", |b| {
        b.iter(|| black_box(grid.deep_copy()).interp_x(400).unwrap())
    });
}

criterion_group!(benches, convolve_bench);
criterion_main!(benches);
