//! Regular 2-D corner-sampled grid with bilinear sampling and finite-difference
//! gradients (spec §3 `ScalarField<T>`), grounded on `grid.rs`'s `Grid<T>` plus
//! the original source's `topology/scalar_field.h`.

use crate::error::{OceanMeshError, Result};
use crate::geometry::vec2::{Aabb, Vec2};

/// A value sampleable from a `ScalarField`. Only `f64` and `i16` are used in
/// this crate (bathymetry is `i16`, everything downstream is `f64`).
pub trait FieldValue: Copy {
    fn to_f64(self) -> f64;
}

impl FieldValue for f64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
}

impl FieldValue for i16 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
}

/// Regular grid of `nx * ny` corner samples over an axis-aligned box. The
/// outermost row/column of samples coincides exactly with `aabb`'s corners —
/// this is corner sampling, not cell-centered sampling.
#[derive(Clone, Debug)]
pub struct ScalarField<T> {
    aabb: Aabb,
    nx: usize,
    ny: usize,
    values: Vec<T>,
    cell_size: Vec2,
}

impl<T: FieldValue> ScalarField<T> {
    pub fn new(aabb: Aabb, nx: usize, ny: usize, values: Vec<T>) -> Self {
        debug_assert!(nx >= 2 && ny >= 2, "grid dimensions must be at least 2x2");
        debug_assert_eq!(values.len(), nx * ny, "value count must match nx*ny");
        let cell_size = Vec2::new(
            (aabb.max.x - aabb.min.x) / (nx as f64 - 1.0),
            (aabb.max.y - aabb.min.y) / (ny as f64 - 1.0),
        );
        ScalarField { aabb, nx, ny, values, cell_size }
    }

    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    pub fn cell_size(&self) -> Vec2 {
        self.cell_size
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[inline]
    pub fn linear_index(&self, i: usize, j: usize) -> usize {
        j * self.nx + i
    }

    #[inline]
    pub fn grid_index(&self, linear: usize) -> (usize, usize) {
        (linear % self.nx, linear / self.nx)
    }

    #[inline]
    pub fn grid(&self, i: usize, j: usize) -> T {
        self.values[self.linear_index(i, j)]
    }

    pub fn set(&mut self, i: usize, j: usize, value: T) {
        let idx = self.linear_index(i, j);
        self.values[idx] = value;
    }

    /// World-space position of grid node (i, j).
    pub fn node_position(&self, i: usize, j: usize) -> Vec2 {
        Vec2::new(
            self.aabb.min.x + i as f64 * self.cell_size.x,
            self.aabb.min.y + j as f64 * self.cell_size.y,
        )
    }

    /// Locates the cell containing `point` and the local fractional coordinates
    /// within it, in [0, 1] along each axis.
    fn surrounding_cell(&self, point: Vec2) -> Result<(usize, usize, f64, f64)> {
        if !self.aabb.contains(point) {
            return Err(OceanMeshError::OutOfRange(format!(
                "point ({}, {}) outside field bounds",
                point.x, point.y
            )));
        }
        let fx = (point.x - self.aabb.min.x) / self.cell_size.x;
        let fy = (point.y - self.aabb.min.y) / self.cell_size.y;
        let i = (fx.floor() as usize).min(self.nx - 2);
        let j = (fy.floor() as usize).min(self.ny - 2);
        let tx = (fx - i as f64).clamp(0.0, 1.0);
        let ty = (fy - j as f64).clamp(0.0, 1.0);
        Ok((i, j, tx, ty))
    }

    /// Bilinear sample at an arbitrary point in the box.
    pub fn sample(&self, point: Vec2) -> Result<f64> {
        let (i, j, tx, ty) = self.surrounding_cell(point)?;
        let v00 = self.grid(i, j).to_f64();
        let v10 = self.grid(i + 1, j).to_f64();
        let v01 = self.grid(i, j + 1).to_f64();
        let v11 = self.grid(i + 1, j + 1).to_f64();
        Ok(bilinear(v00, v10, v01, v11, tx, ty))
    }

    /// Central difference gradient at node (i, j); one-sided at the border.
    pub fn gradient_at(&self, i: usize, j: usize) -> Vec2 {
        let gx = if i == 0 {
            (self.grid(1, j).to_f64() - self.grid(0, j).to_f64()) / self.cell_size.x
        } else if i == self.nx - 1 {
            (self.grid(i, j).to_f64() - self.grid(i - 1, j).to_f64()) / self.cell_size.x
        } else {
            (self.grid(i + 1, j).to_f64() - self.grid(i - 1, j).to_f64()) / (2.0 * self.cell_size.x)
        };
        let gy = if j == 0 {
            (self.grid(i, 1).to_f64() - self.grid(i, 0).to_f64()) / self.cell_size.y
        } else if j == self.ny - 1 {
            (self.grid(i, j).to_f64() - self.grid(i, j - 1).to_f64()) / self.cell_size.y
        } else {
            (self.grid(i, j + 1).to_f64() - self.grid(i, j - 1).to_f64()) / (2.0 * self.cell_size.y)
        };
        Vec2::new(gx, gy)
    }

    /// Bilinear interpolation of the per-node central-difference gradient.
    pub fn gradient(&self, point: Vec2) -> Result<Vec2> {
        let (i, j, tx, ty) = self.surrounding_cell(point)?;
        let g00 = self.gradient_at(i, j);
        let g10 = self.gradient_at(i + 1, j);
        let g01 = self.gradient_at(i, j + 1);
        let g11 = self.gradient_at(i + 1, j + 1);
        Ok(Vec2::new(
            bilinear(g00.x, g10.x, g01.x, g11.x, tx, ty),
            bilinear(g00.y, g10.y, g01.y, g11.y, tx, ty),
        ))
    }
}

#[inline]
fn bilinear(v00: f64, v10: f64, v01: f64, v11: f64, tx: f64, ty: f64) -> f64 {
    let top = v00 * (1.0 - tx) + v10 * tx;
    let bottom = v01 * (1.0 - tx) + v11 * tx;
    top * (1.0 - ty) + bottom * ty
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_field() -> ScalarField<f64> {
        let aabb = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0));
        // values = x + y at each corner, nx=ny=3
        let mut values = Vec::with_capacity(9);
        for j in 0..3 {
            for i in 0..3 {
                values.push(i as f64 + j as f64);
            }
        }
        ScalarField::new(aabb, 3, 3, values)
    }

    #[test]
    fn sample_matches_grid_at_corners() {
        let field = linear_field();
        for j in 0..3 {
            for i in 0..3 {
                let p = field.node_position(i, j);
                assert!((field.sample(p).unwrap() - field.grid(i, j)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn sample_is_bilinear_interior() {
        let field = linear_field();
        let p = Vec2::new(0.5, 0.5);
        assert!((field.sample(p).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_errors() {
        let field = linear_field();
        assert!(field.sample(Vec2::new(-1.0, 0.0)).is_err());
    }

    #[test]
    fn gradient_of_linear_field_is_constant() {
        let field = linear_field();
        let g = field.gradient(Vec2::new(1.0, 1.0)).unwrap();
        assert!((g.x - 1.0).abs() < 1e-9);
        assert!((g.y - 1.0).abs() < 1e-9);
    }
}
