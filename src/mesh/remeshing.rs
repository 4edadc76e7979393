//! `IsotropicRemeshing`: split / collapse / flip / smooth iteration over a
//! `Mesh` (spec §4.5), grounded on the original source's
//! `mesh/remeshing.cpp`.

use super::mesh::Mesh;
use crate::size_field::SizeField;

#[derive(Clone, Copy, Debug)]
pub struct RemeshingParams {
    pub min_factor: f64,
    pub max_factor: f64,
    pub iterations: u32,
}

impl Default for RemeshingParams {
    fn default() -> Self {
        RemeshingParams { min_factor: 0.6, max_factor: 1.3, iterations: 10 }
    }
}

pub struct IsotropicRemeshing;

impl IsotropicRemeshing {
    pub fn remesh(mesh: &mut Mesh, size: &SizeField, params: RemeshingParams) {
        for _ in 0..params.iterations {
            mesh.reset_marks();
            Self::split_long_edges(mesh, size, params.max_factor);
            Self::collapse_short_edges(mesh, size, params.min_factor);
            Self::equalize_valences(mesh);
            mesh.garbage_collect();
            mesh.smooth_vertices();
        }
    }

    fn split_long_edges(mesh: &mut Mesh, size: &SizeField, max_factor: f64) {
        let edges = mesh.edges();
        for h in edges {
            let mid = mesh.edge_midpoint(h).xy();
            let Ok(target) = size.sample(mid) else { continue };
            if mesh.edge_length(h) > target * max_factor {
                let new_v = mesh.split_edge(h);
                mesh.mark(new_v);
            }
        }
    }

    fn collapse_short_edges(mesh: &mut Mesh, size: &SizeField, min_factor: f64) {
        let edges = mesh.edges();
        for h in edges {
            let (a, b) = mesh.edge_endpoints(h);
            if mesh.is_marked(a) || mesh.is_marked(b) {
                continue;
            }
            let mid = mesh.edge_midpoint(h).xy();
            let Ok(target) = size.sample(mid) else { continue };
            if mesh.edge_length(h) >= target * min_factor {
                continue;
            }

            if mesh.is_boundary_edge(h) {
                // Collapse a boundary edge only toward a side collinear with
                // it, preserving the polyline shape (spec §4.5).
                if Self::boundary_collapse_is_collinear(mesh, h) {
                    mesh.collapse_edge(h);
                }
                continue;
            }
            // Avoid collapsing an interior edge into a boundary vertex.
            if mesh.is_boundary_vertex(a) || mesh.is_boundary_vertex(b) {
                continue;
            }
            mesh.collapse_edge(h);
        }
    }

    /// True when `a`'s other boundary neighbour is collinear with `h`, so
    /// collapsing preserves the polyline (`remeshing.cpp`'s `isCollinear`
    /// discipline). `collapse_edge` always deletes `h`'s origin (`a`) and
    /// keeps `b`'s position, so only `a`'s side of the check matters — a
    /// collinear match on `b`'s far neighbour says nothing about what
    /// happens at `a`, which is the vertex actually being removed.
    fn boundary_collapse_is_collinear(mesh: &Mesh, h: usize) -> bool {
        let (a, b) = mesh.edge_endpoints(h);
        let dir = (mesh.position(b) - mesh.position(a)).xy().normalized();
        for n in mesh.one_ring(a) {
            if n == a || n == b {
                continue;
            }
            if !mesh.is_boundary_vertex(n) {
                continue;
            }
            let other_dir = (mesh.position(n) - mesh.position(a)).xy().normalized();
            if other_dir.cross(dir).abs() < 1e-3 {
                return true;
            }
        }
        false
    }

    fn equalize_valences(mesh: &mut Mesh) {
        for h in mesh.edges() {
            if mesh.is_boundary_edge(h) {
                continue;
            }
            let (s, t) = mesh.edge_endpoints(h);
            let Some((l, r)) = opposite_vertices(mesh, h) else { continue };

            let dv = |v: usize| mesh.valence(v) as i64 - optimal_valence(mesh, v) as i64;
            let (dvs, dvt, dvl, dvr) = (dv(s), dv(t), dv(l), dv(r));

            let e_old = sq(dvs) + sq(dvt) + sq(dvl) + sq(dvr);
            let e_new = sq(dvs - 1) + sq(dvt - 1) + sq(dvl + 1) + sq(dvr + 1);

            if e_new < e_old {
                mesh.flip_edge(h);
            }
        }
    }
}

fn sq(x: i64) -> i64 {
    x * x
}

fn opposite_vertices(mesh: &Mesh, h: usize) -> Option<(usize, usize)> {
    let twin = mesh.twin_of(h);
    let l = mesh.apex(h)?;
    let r = mesh.apex(twin)?;
    Some((l, r))
}

/// 6 for interior vertices; for boundary vertices, derived from the vertex's
/// interior angle (`remeshing.cpp`'s `computeOptimalValence`).
pub(crate) fn optimal_valence(mesh: &Mesh, v: usize) -> u32 {
    if !mesh.is_boundary_vertex(v) {
        return 6;
    }
    let outgoing = mesh.outgoing(v);
    let boundary_neighbors: Vec<usize> = outgoing
        .iter()
        .filter(|&&h| mesh.is_boundary_edge(h))
        .map(|&h| mesh.edge_endpoints(h).1)
        .collect();
    if boundary_neighbors.len() != 2 {
        return 6;
    }
    let p = mesh.position(v).xy();
    let a = (mesh.position(boundary_neighbors[0]).xy() - p).normalized();
    let b = (mesh.position(boundary_neighbors[1]).xy() - p).normalized();
    let mut angle = a.dot(b).clamp(-1.0, 1.0).acos();
    if a.cross(b) < 0.0 {
        angle = std::f64::consts::TAU - angle;
    }
    let raw = (angle / std::f64::consts::TAU * 6.0).round() as i64 + 1;
    raw.clamp(2, 6) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vec2::Aabb;
    use crate::geometry::vec3::Vec3;
    use crate::scalar_field::ScalarField;

    fn flat_mesh() -> Mesh {
        // two triangles forming a unit square
        let pts = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        Mesh::from_triangles(pts, &[[0, 1, 2], [0, 2, 3]])
    }

    fn uniform_size(value: f64) -> SizeField {
        let aabb = Aabb::new(crate::geometry::vec2::Vec2::new(-1.0, -1.0), crate::geometry::vec2::Vec2::new(2.0, 2.0));
        SizeField::new(ScalarField::new(aabb, 2, 2, vec![value; 4]))
    }

    #[test]
    fn remesh_preserves_manifold_face_count_is_positive() {
        let mut mesh = flat_mesh();
        let size = uniform_size(2.0);
        IsotropicRemeshing::remesh(&mut mesh, &size, RemeshingParams { iterations: 2, ..Default::default() });
        assert!(mesh.face_count() > 0);
    }
}
