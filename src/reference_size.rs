//! `ReferenceSizeBuilder`: bathymetry + `ResolutionSpec` -> `SizeField`
//! (spec §4.1), grounded on the original source's `reference_size.cpp`.

use rayon::prelude::*;

use crate::config::{AreaOfInterestSpec, ResolutionSpec};
use crate::error::{OceanMeshError, Result};
use crate::geometry::vec2::Vec2;
use crate::scalar_field::ScalarField;
use crate::size_field::SizeField;
use crate::units::meters_to_degrees;

/// Blends a resolution toward `size_m` within `r_inner`, leaves the incoming
/// size untouched beyond `r_outer`, and linearly interpolates in between.
/// Always takes the minimum with the current size, so an AOI can only
/// refine, never coarsen.
fn blend_resolution(aoi: &AreaOfInterestSpec, distance: f64, current: f64) -> f64 {
    if distance < aoi.r_inner {
        current.min(aoi.size_m)
    } else if distance > aoi.r_outer {
        current
    } else {
        let t = (distance - aoi.r_inner) / (aoi.r_outer - aoi.r_inner);
        let interpolated = aoi.size_m + t * (current - aoi.size_m);
        current.min(interpolated)
    }
}

pub struct ReferenceSizeBuilder;

impl ReferenceSizeBuilder {
    /// Builds a `SizeField` in degrees over `bathymetry`'s domain, following
    /// spec §4.1 steps 1-6. `bathymetry` values are metres of elevation
    /// (negative below sea level); `sea_level` is an additional metre offset.
    pub fn build(
        bathymetry: &ScalarField<i16>,
        resolution: &ResolutionSpec,
        sea_level: f64,
    ) -> Result<SizeField> {
        if resolution.coarsest <= 0.0 || resolution.finest <= 0.0 || resolution.coastal <= 0.0 {
            return Err(OceanMeshError::InvalidConfig(
                "resolution coarsest/finest/coastal must be positive".into(),
            ));
        }

        let (nx, ny) = bathymetry.dims();
        let aabb = bathymetry.aabb();
        let mut sizes = vec![0.0_f64; nx * ny];

        let factor = resolution.coarsest / 200.0;
        let min_depth = 0.1 * resolution.finest * resolution.finest / (factor * factor);
        let coastal = resolution.coastal;
        let coarsest = resolution.coarsest;

        sizes
            .par_iter_mut()
            .enumerate()
            .for_each(|(linear, out)| {
                let i = linear % nx;
                let j = linear / nx;
                let elevation = bathymetry.grid(i, j) as f64;

                let mut depth = -elevation + sea_level;
                if depth < -500.0 {
                    depth = -depth;
                }
                depth = depth.max(min_depth);

                let cfl = factor * (9.81 * depth).max(0.0).sqrt();

                let gradient = bathymetry.gradient_at(i, j);
                let grad_norm_m = gradient.norm() / crate::units::METERS_PER_DEGREE;
                let gravity_rule = if grad_norm_m.abs() < 1e-12 {
                    coastal
                } else {
                    (factor * 0.02 * depth / grad_norm_m).max(coastal)
                };

                let mut size = (2.0 * coarsest).min(gravity_rule).min(cfl.max(coastal));

                let position = bathymetry.node_position(i, j);
                for aoi in &resolution.aois {
                    let center = Vec2::new(aoi.center.0, aoi.center.1);
                    let distance = crate::units::degrees_to_meters((position - center).norm());
                    size = blend_resolution(aoi, distance, size).max(cfl);
                }

                *out = meters_to_degrees(size);
            });

        let field = ScalarField::new(aabb, nx, ny, sizes);
        Ok(SizeField::new(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vec2::Aabb;

    fn flat_bathymetry(depth: i16) -> ScalarField<i16> {
        let aabb = Aabb::new(Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0));
        ScalarField::new(aabb, 5, 5, vec![depth; 25])
    }

    #[test]
    fn rejects_non_positive_resolution() {
        let bathy = flat_bathymetry(-10);
        let res = ResolutionSpec {
            coarsest: 0.0,
            finest: 1000.0,
            coastal: 5000.0,
            aois: vec![],
        };
        assert!(ReferenceSizeBuilder::build(&bathy, &res, 0.0).is_err());
    }

    #[test]
    fn builds_positive_size_field_on_flat_bathymetry() {
        let bathy = flat_bathymetry(-10);
        let res = ResolutionSpec {
            coarsest: 10_000.0,
            finest: 1_000.0,
            coastal: 5_000.0,
            aois: vec![],
        };
        let field = ReferenceSizeBuilder::build(&bathy, &res, 0.0).unwrap();
        assert!(field.field().values().iter().all(|v| *v > 0.0));
    }

    #[test]
    fn aoi_refines_nearby_size() {
        let bathy = flat_bathymetry(-10);
        let res = ResolutionSpec {
            coarsest: 10_000.0,
            finest: 1_000.0,
            coastal: 5_000.0,
            aois: vec![AreaOfInterestSpec {
                center: (0.0, 0.0),
                r_inner: 1.0,
                r_outer: 50_000.0,
                size_m: 100.0,
            }],
        };
        let field = ReferenceSizeBuilder::build(&bathy, &res, 0.0).unwrap();
        let center_size = field.sample(Vec2::new(0.0, 0.0)).unwrap();
        let corner_size = field.sample(Vec2::new(-1.0, -1.0)).unwrap();
        assert!(center_size < corner_size);
    }
}
