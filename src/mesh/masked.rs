use super::quadrilaterals;
use crate::prelude::*;

/// A matrix together with a mask of the entries a renderer should skip
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedArray {
    pub values: Array2<f64>,
    /// `true` for masked (invalid) entries
    pub mask: Array2<bool>,
}

impl MaskedArray {
    /// mask every NaN or infinite entry
    pub fn masked_invalid(values: Array2<f64>) -> Self {
        let mask = values.mapv(|v| !v.is_finite());
        Self { values, mask }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn is_masked(&self, row: usize, col: usize) -> bool {
        self.mask.get((row, col)).copied().unwrap_or(true)
    }

    /// number of masked entries
    pub fn count_masked(&self) -> usize {
        self.mask.iter().filter(|m| **m).count()
    }

    /// the values with every masked entry replaced by `fill`
    pub fn filled(&self, fill: f64) -> Array2<f64> {
        let mut out = self.values.clone();
        ndarray::Zip::from(&mut out)
            .and(&self.mask)
            .for_each(|v, &masked| {
                if masked {
                    *v = fill
                }
            });
        out
    }

    /// the unmasked values in row major order
    pub fn compressed(&self) -> Vec<f64> {
        self.values
            .iter()
            .zip(self.mask.iter())
            .filter(|(_, masked)| !**masked)
            .map(|(v, _)| *v)
            .collect()
    }
}

/// Cell corners and values of a grid, ready for a pcolor style renderer
#[derive(Debug, Clone, PartialEq)]
pub struct PcolorMesh {
    /// `(R + 1) x (C + 1)` corner x coordinates
    pub x: MaskedArray,
    /// `(R + 1) x (C + 1)` corner y coordinates
    pub y: MaskedArray,
    /// `R x C` cell values
    pub z: MaskedArray,
}

/// Corners and values of `grid` with every non-finite entry masked
pub fn pcolor(grid: &Grid2D) -> PcolorMesh {
    let (x, y) = quadrilaterals(grid.x().view(), grid.y().view());

    PcolorMesh {
        x: MaskedArray::masked_invalid(x),
        y: MaskedArray::masked_invalid(y),
        z: MaskedArray::masked_invalid(grid.z().clone()),
    }
}
