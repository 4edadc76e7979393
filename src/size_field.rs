//! `SizeField`: a `ScalarField<f64>` with the additional invariant that every
//! value is strictly positive, and the mesh-size-specific query
//! `triangle_is_acceptable` (spec §3).

use crate::geometry::vec2::Vec2;
use crate::scalar_field::ScalarField;

#[derive(Clone, Debug)]
pub struct SizeField {
    field: ScalarField<f64>,
}

impl SizeField {
    /// Wraps a `ScalarField<f64>`, asserting the positivity invariant in debug
    /// builds. Callers that build fields from arbitrary bathymetry should
    /// validate separately and surface a config error instead of panicking.
    pub fn new(field: ScalarField<f64>) -> Self {
        debug_assert!(
            field.values().iter().all(|v| *v > 0.0),
            "SizeField values must be strictly positive"
        );
        SizeField { field }
    }

    pub fn field(&self) -> &ScalarField<f64> {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut ScalarField<f64> {
        &mut self.field
    }

    pub fn sample(&self, p: Vec2) -> crate::error::Result<f64> {
        self.field.sample(p)
    }

    /// Largest value anywhere on the grid.
    pub fn max_value(&self) -> f64 {
        self.field
            .values()
            .iter()
            .cloned()
            .fold(f64::MIN, f64::max)
    }

    /// True iff the triangle's longest edge is strictly below the minimum of
    /// the sizes sampled at its three corners.
    pub fn triangle_is_acceptable(&self, v0: Vec2, v1: Vec2, v2: Vec2) -> bool {
        let e0 = (v1 - v0).norm();
        let e1 = (v2 - v1).norm();
        let e2 = (v0 - v2).norm();
        let longest = e0.max(e1).max(e2);

        let s0 = self.field.sample(v0);
        let s1 = self.field.sample(v1);
        let s2 = self.field.sample(v2);
        match (s0, s1, s2) {
            (Ok(s0), Ok(s1), Ok(s2)) => longest < s0.min(s1).min(s2),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vec2::Aabb;

    fn uniform_field(value: f64) -> SizeField {
        let aabb = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let values = vec![value; 9];
        SizeField::new(ScalarField::new(aabb, 3, 3, values))
    }

    #[test]
    fn max_value_is_uniform() {
        let f = uniform_field(5.0);
        assert_eq!(f.max_value(), 5.0);
    }

    #[test]
    fn small_triangle_is_acceptable() {
        let f = uniform_field(10.0);
        let ok = f.triangle_is_acceptable(
            Vec2::new(1.0, 1.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(1.0, 2.0),
        );
        assert!(ok);
    }

    #[test]
    fn large_triangle_is_rejected() {
        let f = uniform_field(1.0);
        let ok = f.triangle_is_acceptable(
            Vec2::new(0.0, 0.0),
            Vec2::new(5.0, 0.0),
            Vec2::new(0.0, 5.0),
        );
        assert!(!ok);
    }
}
