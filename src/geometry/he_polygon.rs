//! `HEPolygon`: a single simple closed polygon stored as parallel point/
//! half-edge arrays with deferred compaction (spec §3), grounded on the
//! original source's `geometry/he_polygon.h`/`.cpp`.

use std::collections::HashSet;

use super::line_graph::LineGraph;
use super::line_intersection::{line_intersection, Intersection};
use super::vec2::{Aabb, Vec2};
use crate::rng::Rng;

pub type HalfEdgeHandle = usize;

#[derive(Clone, Copy, Debug)]
struct HalfEdge {
    prev: HalfEdgeHandle,
    next: HalfEdgeHandle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointLocation {
    Inside,
    Outside,
    OnEdge,
}

#[derive(Clone, Debug)]
pub struct HEPolygon {
    points: Vec<Vec2>,
    half_edges: Vec<HalfEdge>,
    deleted: HashSet<HalfEdgeHandle>,
}

impl HEPolygon {
    /// Builds a polygon from an ordered point list, reversing it if needed so
    /// the stored orientation is CCW (positive shoelace area).
    pub fn from_points(pts: Vec<Vec2>) -> Self {
        debug_assert!(pts.len() >= 3, "a polygon needs at least 3 points");
        let n = pts.len();
        let mut points = pts;
        if shoelace_area(&points) < 0.0 {
            points.reverse();
        }
        let half_edges = (0..n)
            .map(|i| HalfEdge { prev: (i + n - 1) % n, next: (i + 1) % n })
            .collect();
        HEPolygon { points, half_edges, deleted: HashSet::new() }
    }

    pub fn num_vertices(&self) -> usize {
        self.points.len() - self.deleted.len()
    }

    pub fn is_deleted(&self, h: HalfEdgeHandle) -> bool {
        self.deleted.contains(&h)
    }

    pub fn point(&self, h: HalfEdgeHandle) -> Vec2 {
        self.points[h]
    }

    pub fn next(&self, h: HalfEdgeHandle) -> HalfEdgeHandle {
        self.half_edges[h].next
    }

    pub fn prev(&self, h: HalfEdgeHandle) -> HalfEdgeHandle {
        self.half_edges[h].prev
    }

    /// Any live half-edge handle, used as an iteration start point.
    pub fn any_live_handle(&self) -> Option<HalfEdgeHandle> {
        (0..self.half_edges.len()).find(|h| !self.is_deleted(*h))
    }

    /// Iterates the live cycle starting at `start`, in `next` order.
    pub fn iter_from(&self, start: HalfEdgeHandle) -> HEPolygonIter<'_> {
        HEPolygonIter { poly: self, start, current: Some(start), done: false }
    }

    /// Inserts a new vertex at the linear blend of `h` and `next(h)`, returns
    /// the new handle. Existing handles remain valid.
    pub fn split(&mut self, h: HalfEdgeHandle, lambda: f64) -> HalfEdgeHandle {
        let next = self.half_edges[h].next;
        let blended = self.points[h] + (self.points[next] - self.points[h]) * lambda;
        let new_handle = self.points.len();
        self.points.push(blended);
        self.half_edges.push(HalfEdge { prev: h, next });
        self.half_edges[h].next = new_handle;
        self.half_edges[next].prev = new_handle;
        new_handle
    }

    /// Tombstones the start vertex of `h` and moves `next(h)` to the blend of
    /// the two endpoints.
    pub fn collapse(&mut self, h: HalfEdgeHandle, lambda: f64) {
        let end = self.half_edges[h].next;
        let blended = self.points[h] + (self.points[end] - self.points[h]) * lambda;
        self.points[end] = blended;
        let before = self.half_edges[h].prev;
        self.half_edges[before].next = end;
        self.half_edges[end].prev = before;
        self.deleted.insert(h);
    }

    /// Relocates live entries into a dense prefix, rewriting `prev`/`next`.
    /// Invalidates all previously issued handles.
    pub fn compact(&mut self) {
        if self.deleted.is_empty() {
            return;
        }
        let mut new_index = vec![usize::MAX; self.points.len()];
        let mut new_points = Vec::with_capacity(self.num_vertices());
        for (i, p) in self.points.iter().enumerate() {
            if !self.deleted.contains(&i) {
                new_index[i] = new_points.len();
                new_points.push(*p);
            }
        }
        let mut new_half_edges = Vec::with_capacity(new_points.len());
        for (i, he) in self.half_edges.iter().enumerate() {
            if self.deleted.contains(&i) {
                continue;
            }
            new_half_edges.push(HalfEdge { prev: new_index[he.prev], next: new_index[he.next] });
        }
        self.points = new_points;
        self.half_edges = new_half_edges;
        self.deleted.clear();
    }

    /// Shoelace area; positive for the guaranteed CCW orientation.
    pub fn area(&self) -> f64 {
        let Some(start) = self.any_live_handle() else { return 0.0 };
        let pts: Vec<Vec2> = self.iter_from(start).map(|h| self.points[h]).collect();
        shoelace_area(&pts)
    }

    pub fn aabb(&self) -> Option<Aabb> {
        let start = self.any_live_handle()?;
        Aabb::from_points(self.iter_from(start).map(|h| self.points[h]))
    }

    /// O(n^2) pairwise test, skipping edges that share a corner.
    pub fn has_self_intersection(&self) -> bool {
        let Some(start) = self.any_live_handle() else { return false };
        let edges: Vec<(Vec2, Vec2)> = self
            .iter_from(start)
            .map(|h| (self.points[h], self.points[self.half_edges[h].next]))
            .collect();
        for i in 0..edges.len() {
            for j in (i + 1)..edges.len() {
                let shares_corner = edges[i].0 == edges[j].0
                    || edges[i].0 == edges[j].1
                    || edges[i].1 == edges[j].0
                    || edges[i].1 == edges[j].1;
                if shares_corner {
                    continue;
                }
                if !matches!(
                    line_intersection(edges[i].0, edges[i].1, edges[j].0, edges[j].1),
                    Intersection::None
                ) {
                    return true;
                }
            }
        }
        false
    }

    /// Random-direction ray cast with retry on degenerate/grazing hits (spec
    /// §9 design notes, §3 `HEPolygon` queries).
    pub fn point_in_polygon(&self, p: Vec2, rng: &mut Rng) -> PointLocation {
        let Some(aabb) = self.aabb() else { return PointLocation::Outside };
        if !aabb.contains(p) {
            return PointLocation::Outside;
        }

        let Some(start) = self.any_live_handle() else { return PointLocation::Outside };
        let edges: Vec<(Vec2, Vec2)> = self
            .iter_from(start)
            .map(|h| (self.points[h], self.points[self.half_edges[h].next]))
            .collect();

        for e in &edges {
            if point_on_segment(p, e.0, e.1) {
                return PointLocation::OnEdge;
            }
        }

        let far = aabb.size().norm() * 2.0 + 1.0;
        for _ in 0..100 {
            let angle = rng.range_f64(0.0, std::f64::consts::TAU);
            let dir = Vec2::new(angle.cos(), angle.sin());
            let ray_end = p + dir * far;

            let mut count = 0usize;
            let mut degenerate = false;
            for e in &edges {
                match line_intersection(p, ray_end, e.0, e.1) {
                    Intersection::Point { t, u, .. } => {
                        // Grazing a vertex (u close to 0 or 1) makes parity
                        // ambiguous; retry with a different direction.
                        if t > 1e-9 && (u < 1e-6 || u > 1.0 - 1e-6) {
                            degenerate = true;
                            break;
                        }
                        if t > 1e-9 {
                            count += 1;
                        }
                    }
                    Intersection::Collinear => {
                        degenerate = true;
                        break;
                    }
                    Intersection::None => {}
                }
            }
            if !degenerate {
                return if count % 2 == 1 { PointLocation::Inside } else { PointLocation::Outside };
            }
        }
        PointLocation::Outside
    }

    /// Lexicographically smallest (x, y) vertex; always convex.
    pub fn find_convex_point(&self) -> Option<HalfEdgeHandle> {
        let start = self.any_live_handle()?;
        self.iter_from(start)
            .min_by(|&a, &b| {
                let pa = self.points[a];
                let pb = self.points[b];
                pa.x.total_cmp(&pb.x).then(pa.y.total_cmp(&pb.y))
            })
    }

    /// A point guaranteed to lie in the polygon's interior, via a convex
    /// vertex and its two neighbours (falling back to their centroid).
    pub fn representative_interior_point(&self) -> Option<Vec2> {
        let va = self.find_convex_point()?;
        let vb = self.half_edges[va].next;
        let vc = self.half_edges[va].prev;
        let (pa, pb, pc) = (self.points[va], self.points[vb], self.points[vc]);
        let centroid = (pa + pb + pc) / 3.0;
        Some(centroid)
    }

    pub fn to_line_graph(&self) -> LineGraph {
        let mut graph = LineGraph::new();
        let Some(start) = self.any_live_handle() else { return graph };
        let handles: Vec<HalfEdgeHandle> = self.iter_from(start).collect();
        let mut vertex_of = vec![0usize; handles.len()];
        for (i, &h) in handles.iter().enumerate() {
            vertex_of[i] = graph.add_vertex(self.points[h]);
        }
        for i in 0..handles.len() {
            let j = (i + 1) % handles.len();
            graph.add_edge(vertex_of[i], vertex_of[j]);
        }
        graph
    }
}

pub struct HEPolygonIter<'a> {
    poly: &'a HEPolygon,
    start: HalfEdgeHandle,
    current: Option<HalfEdgeHandle>,
    done: bool,
}

impl<'a> Iterator for HEPolygonIter<'a> {
    type Item = HalfEdgeHandle;

    fn next(&mut self) -> Option<HalfEdgeHandle> {
        if self.done {
            return None;
        }
        let current = self.current?;
        let next = self.poly.half_edges[current].next;
        self.current = if next == self.start { None } else { Some(next) };
        if self.current.is_none() {
            self.done = true;
        }
        Some(current)
    }
}

fn shoelace_area(pts: &[Vec2]) -> f64 {
    let n = pts.len();
    let mut sum = 0.0;
    for i in 0..n {
        let p1 = pts[i];
        let p2 = pts[(i + 1) % n];
        sum += (p1.x + p2.x) * (p2.y - p1.y);
    }
    sum / 2.0
}

fn point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> bool {
    let ab = b - a;
    let ap = p - a;
    let cross = ab.cross(ap);
    if cross.abs() > 1e-9 * (ab.norm().max(1.0)) {
        return false;
    }
    let dot = ap.dot(ab);
    dot >= -1e-9 && dot <= ab.sqr_norm() + 1e-9
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> HEPolygon {
        HEPolygon::from_points(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ])
    }

    #[test]
    fn construction_is_ccw_with_positive_area() {
        let square = unit_square();
        assert!(square.area() > 0.0);
        assert_eq!(square.num_vertices(), 4);
    }

    #[test]
    fn next_prev_roundtrip_holds() {
        let square = unit_square();
        let start = square.any_live_handle().unwrap();
        for h in square.iter_from(start) {
            assert_eq!(square.next(square.prev(h)), h);
        }
    }

    #[test]
    fn split_then_collapse_restores_vertex_count() {
        let mut square = unit_square();
        let h = square.any_live_handle().unwrap();
        let new_handle = square.split(h, 0.5);
        assert_eq!(square.num_vertices(), 5);
        square.collapse(new_handle, 0.0);
        square.compact();
        assert_eq!(square.num_vertices(), 4);
    }

    #[test]
    fn point_in_polygon_classifies_inside_and_outside() {
        let square = unit_square();
        let mut rng = Rng::new(42);
        assert_eq!(square.point_in_polygon(Vec2::new(0.5, 0.5), &mut rng), PointLocation::Inside);
        assert_eq!(square.point_in_polygon(Vec2::new(2.0, 2.0), &mut rng), PointLocation::Outside);
    }

    #[test]
    fn representative_point_is_inside() {
        let square = unit_square();
        let mut rng = Rng::new(7);
        let p = square.representative_interior_point().unwrap();
        assert_eq!(square.point_in_polygon(p, &mut rng), PointLocation::Inside);
    }
}
