//! `QualityAnalysis`: pure functions over a `Mesh` (spec §4.7), grounded on
//! the original source's `analysis/mesh_quality.cpp` and `analysis/aggregates.h`.

use std::collections::HashMap;

use crate::mesh::mesh::{FHandle, Mesh, VHandle};
use crate::size_field::SizeField;

/// `{min, max, avg}` over a non-empty iterable (spec §4.7).
#[derive(Clone, Copy, Debug)]
pub struct Aggregates {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl Aggregates {
    pub fn from_iter(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut iter = values.into_iter();
        let first = iter.next()?;
        let mut min = first;
        let mut max = first;
        let mut sum = first;
        let mut count = 1usize;
        for v in iter {
            min = min.min(v);
            max = max.max(v);
            sum += v;
            count += 1;
        }
        Some(Aggregates { min, max, avg: sum / count as f64 })
    }
}

pub struct QualityAnalysis;

impl QualityAnalysis {
    /// `2 * incircle_radius / circumcircle_radius` per face, via Heron's
    /// formula and the law of cosines; 0 for degenerate triangles.
    pub fn radius_ratio(mesh: &Mesh, f: FHandle) -> f64 {
        let [a, b, c] = mesh.face_vertices(f);
        let (pa, pb, pc) = (mesh.position(a), mesh.position(b), mesh.position(c));
        let la = (pc - pb).norm();
        let lb = (pa - pc).norm();
        let lc = (pb - pa).norm();
        let s = (la + lb + lc) * 0.5;
        let area_sq = s * (s - la) * (s - lb) * (s - lc);
        if area_sq <= 0.0 {
            return 0.0;
        }
        let area = area_sq.sqrt();
        let r_in = area / s;
        let r_out = (la * lb * lc) / (4.0 * area);
        if !r_out.is_finite() || r_out <= 0.0 {
            return 0.0;
        }
        2.0 * r_in / r_out
    }

    /// `4*sqrt(3) * signed_area / (a^2+b^2+c^2)` per face.
    pub fn shape_regularity(mesh: &Mesh, f: FHandle) -> f64 {
        let [a, b, c] = mesh.face_vertices(f);
        let (pa, pb, pc) = (mesh.position(a), mesh.position(b), mesh.position(c));
        let area = mesh.face_area(f);
        let la2 = (pc - pb).dot(pc - pb);
        let lb2 = (pa - pc).dot(pa - pc);
        let lc2 = (pb - pa).dot(pb - pa);
        let denom = la2 + lb2 + lc2;
        if denom <= 0.0 {
            return 0.0;
        }
        4.0 * 3.0_f64.sqrt() * area / denom
    }

    /// `valence - optimal` per vertex, using the same boundary rule as the
    /// remesher's valence equalization.
    pub fn valence_deviation(mesh: &Mesh, v: VHandle) -> i64 {
        mesh.valence(v) as i64 - crate::mesh::remeshing::optimal_valence(mesh, v) as i64
    }

    /// Average `SizeField` sample over `k` evenly spaced points on each edge,
    /// divided into the edge length.
    pub fn relative_edge_length(mesh: &Mesh, size: &SizeField, h: usize, samples: usize) -> Option<f64> {
        let (a, b) = mesh.edge_endpoints(h);
        let (pa, pb) = (mesh.position(a).xy(), mesh.position(b).xy());
        let mut sum = 0.0;
        let mut count = 0usize;
        for i in 0..samples {
            let t = (i as f64 + 0.5) / samples as f64;
            let p = pa + (pb - pa) * t;
            if let Ok(v) = size.sample(p) {
                sum += v;
                count += 1;
            }
        }
        if count == 0 {
            return None;
        }
        let avg_size = sum / count as f64;
        let length = (pb - pa).norm();
        Some(length / avg_size)
    }

    /// Histogram of vertex valences (`countValences`/`printValences`).
    pub fn valence_histogram(mesh: &Mesh) -> HashMap<usize, usize> {
        let mut histogram = HashMap::new();
        for v in mesh.vertices_iter() {
            *histogram.entry(mesh.valence(v)).or_insert(0) += 1;
        }
        histogram
    }

    pub fn mesh_radius_ratios(mesh: &Mesh) -> Aggregates {
        Aggregates::from_iter(mesh.faces_iter().map(|f| Self::radius_ratio(mesh, f)))
            .unwrap_or(Aggregates { min: 0.0, max: 0.0, avg: 0.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vec3::Vec3;

    #[test]
    fn equilateral_triangle_has_radius_ratio_near_one() {
        let h = 3.0_f64.sqrt() / 2.0;
        let pts = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.5, h, 0.0)];
        let mesh = Mesh::from_triangles(pts, &[[0, 1, 2]]);
        let f = mesh.faces_iter().next().unwrap();
        let ratio = QualityAnalysis::radius_ratio(&mesh, f);
        assert!((ratio - 1.0).abs() < 1e-9);
    }

    #[test]
    fn aggregates_computes_min_max_avg() {
        let agg = Aggregates::from_iter([1.0, 2.0, 3.0]).unwrap();
        assert_eq!(agg.min, 1.0);
        assert_eq!(agg.max, 3.0);
        assert!((agg.avg - 2.0).abs() < 1e-9);
    }

    #[test]
    fn empty_aggregates_is_none() {
        assert!(Aggregates::from_iter(std::iter::empty()).is_none());
    }
}
