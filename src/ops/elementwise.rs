use crate::prelude::*;

impl Grid2D {
    pub fn abs(&mut self) {
        self.update_z(|z| z.mapv_inplace(f64::abs));
    }

    pub fn negate(&mut self) {
        self.update_z(|z| z.mapv_inplace(|v| -v));
    }

    /// add `offset` to every value
    pub fn offset(&mut self, offset: f64) {
        self.update_z(|z| *z += offset);
    }

    /// multiply every value by `factor`
    pub fn scale_data(&mut self, factor: f64) {
        self.update_z(|z| *z *= factor);
    }

    /// raise every value to `power`, negative values with a fractional power give NaN
    pub fn power(&mut self, power: f64) {
        self.update_z(|z| z.mapv_inplace(|v| v.powf(power)));
    }

    /// shift the coordinates, the setpoints keep their values
    pub fn offset_axes(&mut self, x: f64, y: f64) {
        self.update_axes(|xs, ys| {
            *xs += x;
            *ys += y;
        });
    }

    /// scale the coordinates, the setpoints keep their values
    pub fn scale_axes(&mut self, x: f64, y: f64) {
        self.update_axes(|xs, ys| {
            *xs *= x;
            *ys *= y;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::tests::three_by_three;
    use ndarray::array;

    fn with_nan() -> Grid2D {
        let mut grid = three_by_three();
        grid.update_z(|z| z[[1, 1]] = f64::NAN);
        grid
    }

    #[test]
    fn nan_survives_every_elementwise_operation() {
        let operations: [fn(&mut Grid2D); 6] = [
            |g| g.abs(),
            |g| g.negate(),
            |g| g.offset(3.0),
            |g| g.scale_data(-2.0),
            |g| g.power(2.0),
            |g| g.offset_axes(1.0, 1.0),
        ];

        for operation in operations {
            let mut grid = with_nan();
            operation(&mut grid);
            assert!(grid.z()[[1, 1]].is_nan());
            assert!(grid.z().iter().filter(|v| v.is_nan()).count() == 1);
        }
    }

    #[test]
    fn values_change_and_coordinates_do_not() {
        let mut grid = three_by_three();
        grid.negate();
        grid.offset(1.0);
        grid.scale_data(2.0);

        assert_eq!(grid.z().row(0).to_vec(), vec![0.0, -2.0, -4.0]);
        assert_eq!(grid.x(), three_by_three().x());

        grid.abs();
        grid.power(0.5);
        assert_eq!(grid.z()[[0, 2]], 2.0);
    }

    #[test]
    fn axes_move_without_the_setpoints() {
        let mut grid = three_by_three();
        grid.scale_axes(2.0, -1.0);
        grid.offset_axes(0.5, 0.0);

        assert_eq!(grid.x().row(1).to_vec(), vec![0.5, 2.5, 4.5]);
        assert_eq!(grid.y().column(0).to_vec(), vec![0.0, -1.0, -2.0]);
        assert_eq!(grid.x_setpoints(), &array![[0.0, 1.0, 2.0], [0.0, 1.0, 2.0], [0.0, 1.0, 2.0]]);
        assert_eq!(grid.z(), three_by_three().z());
    }
}
