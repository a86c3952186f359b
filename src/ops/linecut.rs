use super::LinecutKind;
use crate::prelude::*;
use crate::utils;

use ndarray::Axis;

/// Offsets of a window of `size` lines around a center line: `-(size-1)/2..=(size-1)/2`
/// for odd sizes, `-size/2..=size/2-1` for even ones.
fn window(size: usize) -> std::ops::RangeInclusive<isize> {
    let size = size as isize;

    if size % 2 == 0 {
        -size / 2..=size / 2 - 1
    } else {
        -(size - 1) / 2..=(size - 1) / 2
    }
}

impl Grid2D {
    fn linecut_index(&self, kind: LinecutKind, position: f64) -> Result<usize, Error> {
        let index = match kind {
            LinecutKind::Horizontal => self.row_index(position),
            LinecutKind::Vertical => self.column_index(position),
        };

        index.ok_or_else(|| Error::Parameter(format!("no {kind} linecut at {position}")))
    }

    /// Subtract the row (horizontal) or column (vertical) closest to `position`
    /// from every row or column.
    pub fn sub_linecut(&mut self, kind: LinecutKind, position: f64) -> Result<(), Error> {
        self.sub_linecut_avg(kind, position, 1)
    }

    /// Subtract the mean of `size` rows or columns around the one closest to
    /// `position` from every row or column. Window lines past the edge of the grid
    /// are clamped to the first or last line.
    pub fn sub_linecut_avg(&mut self, kind: LinecutKind, position: f64, size: usize) -> Result<(), Error> {
        if size == 0 {
            return Err(Error::Parameter("a linecut window needs at least one line".into()));
        }

        let index = self.linecut_index(kind, position)?;

        // rows are lanes along axis 1, columns along axis 0
        let (axis, lane_axis) = match kind {
            LinecutKind::Horizontal => (Axis(0), Axis(1)),
            LinecutKind::Vertical => (Axis(1), Axis(0)),
        };

        let last = self.z().len_of(axis) as isize - 1;
        let lines: Vec<usize> = window(size)
            .map(|offset| (index as isize + offset).clamp(0, last) as usize)
            .collect();

        let profile = self
            .z()
            .select(axis, &lines)
            .map_axis(axis, |lane| utils::mean(lane.iter()));

        tracing::debug!(%kind, index, size, "subtracting linecut");

        self.update_z(|z| {
            for mut lane in z.lanes_mut(lane_axis) {
                lane -= &profile;
            }
        });

        Ok(())
    }
}
