use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use sweepgrid::Grid2D;

fn jittered_grid(n: usize) -> Grid2D {
    let jitter = Array2::random((n, n), Uniform::new(-0.2, 0.2));

    let x = Array2::from_shape_fn((n, n), |(_, c)| c as f64) + &jitter;
    let y = Array2::from_shape_fn((n, n), |(r, _)| r as f64);
    let z = Array2::random((n, n), Uniform::new(0., 10.));

    Grid2D::new(x, y, z).unwrap()
}

fn triangulate_and_interpolate(grid: &Grid2D, width: usize, height: usize) {
    let mut copy = grid.deep_copy();
    copy.interp_grid(width, height).unwrap();
}

fn interpolate_bench(c: &mut Criterion) {
    let grid = jittered_grid(100);

    c.bench_function("triangulate 100x100", |b| {
        b.iter(|| black_box(grid.deep_copy()).triangulation().map(|t| t.len()).unwrap())
    });

    c.bench_function("interp_grid 100x100 -> 200x200", |b| {
        b.iter(|| triangulate_and_interpolate(black_box(&grid), 200, 200))
    });
}

criterion_group!(benches, interpolate_bench);
criterion_main!(benches);
