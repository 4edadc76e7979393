//! `BoundaryBuilder`: clips a marching-quads coastline against a region
//! polygon, separating outer water boundary from islands (spec §4.4),
//! grounded on the original source's `boundary/boundary_builder.cpp`.

use std::collections::HashMap;

use crate::error::{OceanMeshError, Result};
use crate::geometry::he_polygon::{HEPolygon, PointLocation};
use crate::geometry::line_graph::{Edge, LineGraph};
use crate::geometry::line_intersection::{line_intersection, Intersection};
use crate::geometry::vec2::Vec2;
use crate::marching_quads::marching_quads;
use crate::rng::Rng;
use crate::scalar_field::ScalarField;
use crate::size_field::SizeField;
use crate::units::degrees_to_meters;

#[derive(Clone, Copy, Debug)]
pub struct BoundaryOptions {
    pub ignore_islands: bool,
    pub simplify: bool,
    pub min_angle_deg: f64,
    pub allow_self_intersection: bool,
}

impl Default for BoundaryOptions {
    fn default() -> Self {
        BoundaryOptions { ignore_islands: false, simplify: true, min_angle_deg: 5.0, allow_self_intersection: false }
    }
}

#[derive(Clone, Debug)]
pub struct Boundary {
    pub outer: HEPolygon,
    pub islands: Vec<HEPolygon>,
}

impl Boundary {
    /// Combines outer + islands into one `LineGraph` and reports whether any
    /// two non-adjacent edges cross (spec §4.4 post-condition).
    pub fn has_intersections(&self) -> bool {
        let mut graphs = vec![self.outer.to_line_graph()];
        graphs.extend(self.islands.iter().map(|p| p.to_line_graph()));
        LineGraph::combine_polygons(&graphs).has_self_intersection()
    }
}

struct RegionHit {
    region_edge: usize,
    t: f64,
    coast_edge: usize,
    u: f64,
    point: Vec2,
    vertex: usize,
}

pub struct BoundaryBuilder;

impl BoundaryBuilder {
    pub fn build(
        bathymetry: &ScalarField<i16>,
        region: &LineGraph,
        size: &SizeField,
        height: f64,
        options: &BoundaryOptions,
        rng: &mut Rng,
    ) -> Result<Boundary> {
        let region_poly = canonicalize_region(region)?;
        let region_handles: Vec<usize> = region_poly.iter_from(region_poly.any_live_handle().unwrap()).collect();
        let n = region_handles.len();

        let mut coast = marching_quads(bathymetry, height);
        coast.remove_degenerate_geometry();

        let mut hits = find_intersections(&region_poly, &region_handles, &coast);
        let first_corner = region_poly.point(region_handles[0]);
        let water_flag = sample_is_water(bathymetry, first_corner, height);

        if hits.is_empty() {
            if water_flag {
                return Ok(Boundary { outer: region_poly, islands: Vec::new() });
            }
            return Err(OceanMeshError::DegeneratePolygon("region contains no water".into()));
        }

        split_coast_edges(&mut coast, &mut hits);

        let mut order: Vec<usize> = (0..hits.len()).collect();
        if !water_flag {
            let first = order.remove(0);
            order.push(first);
        }
        for pair in order.chunks(2) {
            if pair.len() != 2 {
                continue;
            }
            splice_pair(&mut coast, &region_poly, &region_handles, n, &hits[pair[0]], &hits[pair[1]], rng);
        }

        let cycles = extract_cycles(&coast);
        let mut polygons: Vec<HEPolygon> = cycles
            .into_iter()
            .filter(|c| c.len() >= 3)
            .map(HEPolygon::from_points)
            .collect();

        polygons.retain(|p| cycle_is_in_region(p, &region_poly, rng));

        let mut best: Option<(usize, f64)> = None;
        for (idx, p) in polygons.iter().enumerate() {
            if !cycle_encloses_water(p, bathymetry, height) {
                continue;
            }
            let area = p.area();
            if best.map(|(_, a)| area > a).unwrap_or(true) {
                best = Some((idx, area));
            }
        }
        let Some((outer_idx, _)) = best else {
            return Err(OceanMeshError::InvalidRegion("no water-enclosing cycle found".into()));
        };
        let mut outer = polygons.remove(outer_idx);

        let mut islands: Vec<HEPolygon> = if options.ignore_islands {
            Vec::new()
        } else {
            polygons
                .into_iter()
                .filter(|p| !cycle_encloses_water(p, bathymetry, height))
                .filter(|p| cycle_is_in_region(p, &outer, rng))
                .collect()
        };

        if options.simplify {
            simplify_polygon(&mut outer, size, options.min_angle_deg)?;
            for island in &mut islands {
                simplify_polygon(island, size, options.min_angle_deg)?;
            }
        }

        let boundary = Boundary { outer, islands };
        if !options.allow_self_intersection && boundary.has_intersections() {
            return Err(OceanMeshError::BoundaryIntersection);
        }
        Ok(boundary)
    }
}

fn sample_is_water(bathymetry: &ScalarField<i16>, p: Vec2, height: f64) -> bool {
    bathymetry.sample(p).map(|v| v < height).unwrap_or(false)
}

/// Validates the region is a single simple CCW cycle (spec §4.4 step 1).
fn canonicalize_region(region: &LineGraph) -> Result<HEPolygon> {
    if region.has_self_intersection() {
        return Err(OceanMeshError::InvalidRegion("region polygon self-intersects".into()));
    }
    let adjacency = region.compute_adjacency();
    for v in 0..region.points.len() {
        if adjacency.degree(v) != 2 {
            return Err(OceanMeshError::InvalidRegion("region vertex does not have adjacency 2".into()));
        }
    }
    let cycles = extract_cycles(region);
    if cycles.len() != 1 || cycles[0].len() != region.points.len() {
        return Err(OceanMeshError::InvalidRegion("region is not a single cycle".into()));
    }
    Ok(HEPolygon::from_points(cycles.into_iter().next().unwrap()))
}

/// Follows vertex-degree-<=2 connectivity to emit every closed cycle in
/// `graph`; dangling (open) paths are not polygons and are dropped.
fn extract_cycles(graph: &LineGraph) -> Vec<Vec<Vec2>> {
    let adjacency = graph.compute_adjacency();
    let mut visited_edges = vec![false; graph.edges.len()];
    let mut cycles = Vec::new();

    for start_edge in 0..graph.edges.len() {
        if visited_edges[start_edge] {
            continue;
        }
        let start_vertex = graph.edges[start_edge].first;
        let mut path = vec![start_vertex];
        let mut current_vertex = start_vertex;
        let mut current_edge = start_edge;
        let mut closed = false;
        loop {
            visited_edges[current_edge] = true;
            let next_vertex = adjacency.other_endpoint(graph, current_edge, current_vertex);
            if next_vertex == start_vertex {
                closed = true;
                break;
            }
            path.push(next_vertex);
            let candidates = &adjacency.neighbors[next_vertex];
            let Some(&next_edge) = candidates.iter().find(|&&e| e != current_edge && !visited_edges[e]) else {
                break;
            };
            current_edge = next_edge;
            current_vertex = next_vertex;
        }
        if closed && path.len() >= 3 {
            cycles.push(path.iter().map(|&v| graph.points[v]).collect());
        }
    }
    cycles
}

/// Per spec §4.4 step 3: per region half-edge (CCW order), coast-edge
/// intersections sorted by parameter along the region edge.
fn find_intersections(region: &HEPolygon, region_handles: &[usize], coast: &LineGraph) -> Vec<RegionHit> {
    let n = region_handles.len();
    let mut hits = Vec::new();
    for i in 0..n {
        let p1 = region.point(region_handles[i]);
        let p2 = region.point(region_handles[(i + 1) % n]);
        let mut edge_hits = Vec::new();
        for (ce, edge) in coast.edges.iter().enumerate() {
            let p3 = coast.points[edge.first];
            let p4 = coast.points[edge.second];
            if let Intersection::Point { t, u, at } = line_intersection(p1, p2, p3, p4) {
                if t > 1e-9 && t < 1.0 - 1e-9 && u > 1e-9 && u < 1.0 - 1e-9 {
                    edge_hits.push(RegionHit { region_edge: i, t, coast_edge: ce, u, point: at, vertex: usize::MAX });
                }
            }
        }
        edge_hits.sort_by(|a, b| a.t.total_cmp(&b.t));
        hits.extend(edge_hits);
    }
    hits
}

/// Splits every intersected coast edge at its crossing points, recording the
/// new vertex index on each `RegionHit`.
fn split_coast_edges(coast: &mut LineGraph, hits: &mut [RegionHit]) {
    let original_edges: Vec<Edge> = coast.edges.clone();
    let mut by_edge: HashMap<usize, Vec<usize>> = HashMap::new();
    for (idx, hit) in hits.iter().enumerate() {
        by_edge.entry(hit.coast_edge).or_default().push(idx);
    }

    let mut edges_to_remove = Vec::new();
    let mut new_edges = Vec::new();
    for (&ce, hit_idxs) in by_edge.iter() {
        let edge = original_edges[ce];
        let mut sorted = hit_idxs.clone();
        sorted.sort_by(|&a, &b| hits[a].u.total_cmp(&hits[b].u));
        let mut prev_vertex = edge.first;
        for &hi in &sorted {
            let v = coast.add_vertex(hits[hi].point);
            hits[hi].vertex = v;
            new_edges.push(Edge { first: prev_vertex, second: v });
            prev_vertex = v;
        }
        new_edges.push(Edge { first: prev_vertex, second: edge.second });
        edges_to_remove.push(ce);
    }
    coast.remove_edges_by_index(edges_to_remove);
    coast.edges.extend(new_edges);
}

/// Cuts the outward-pointing half of each split coast edge and splices in
/// the region-boundary stretch between `a` and `b` (spec §4.4 step 4).
fn splice_pair(
    coast: &mut LineGraph,
    region: &HEPolygon,
    region_handles: &[usize],
    n: usize,
    a: &RegionHit,
    b: &RegionHit,
    rng: &mut Rng,
) {
    disconnect_outside_neighbor(coast, region, a.vertex, rng);
    disconnect_outside_neighbor(coast, region, b.vertex, rng);

    let mut chain = vec![a.vertex];
    let mut e = a.region_edge;
    while e != b.region_edge {
        e = (e + 1) % n;
        let corner = region.point(region_handles[e]);
        chain.push(coast.add_vertex(corner));
    }
    chain.push(b.vertex);
    for w in chain.windows(2) {
        coast.add_edge(w[0], w[1]);
    }
}

fn disconnect_outside_neighbor(coast: &mut LineGraph, region: &HEPolygon, v: usize, rng: &mut Rng) {
    let mut to_remove = None;
    for (idx, edge) in coast.edges.iter().enumerate() {
        let other = if edge.first == v {
            Some(edge.second)
        } else if edge.second == v {
            Some(edge.first)
        } else {
            None
        };
        if let Some(o) = other {
            if region.point_in_polygon(coast.points[o], rng) == PointLocation::Outside {
                to_remove = Some(idx);
                break;
            }
        }
    }
    if let Some(idx) = to_remove {
        coast.remove_edges_by_index(vec![idx]);
    }
}

/// Spec §4.4 step 6: keep a cycle only if its first non-edge vertex lies
/// inside `region`.
fn cycle_is_in_region(cycle: &HEPolygon, region: &HEPolygon, rng: &mut Rng) -> bool {
    let Some(start) = cycle.any_live_handle() else { return false };
    for h in cycle.iter_from(start) {
        match region.point_in_polygon(cycle.point(h), rng) {
            PointLocation::Inside => return true,
            PointLocation::Outside => return false,
            PointLocation::OnEdge => continue,
        }
    }
    false
}

/// Spec §4.4 step 7/9(b): prefer a direct bathymetry sample at a guaranteed
/// interior point over the gradient-sign heuristic (open question 9(b)).
fn cycle_encloses_water(cycle: &HEPolygon, bathymetry: &ScalarField<i16>, height: f64) -> bool {
    let Some(p) = cycle.representative_interior_point() else { return false };
    sample_is_water(bathymetry, p, height)
}

/// Spec §4.4 step 9: repeated edge collapse until none of the three
/// conditions apply.
fn simplify_polygon(poly: &mut HEPolygon, size: &SizeField, min_angle_deg: f64) -> Result<()> {
    let one_meter_deg = crate::units::meters_to_degrees(1.0);
    loop {
        let Some(start) = poly.any_live_handle() else { break };
        let handles: Vec<usize> = poly.iter_from(start).collect();
        let mut collapsed_any = false;
        for h in handles {
            if poly.is_deleted(h) {
                continue;
            }
            let next = poly.next(h);
            if poly.is_deleted(next) {
                continue;
            }
            let p0 = poly.point(h);
            let p1 = poly.point(next);
            let length = (p1 - p0).norm();
            let mid = (p0 + p1) * 0.5;
            let target = size.sample(mid).unwrap_or(f64::INFINITY);
            let cond_a = length < target;

            let next_next = poly.next(next);
            let p2 = poly.point(next_next);
            let cond_b = (p2 - p0).norm() < one_meter_deg;

            let v1 = (p0 - p1).normalized();
            let v2 = (p2 - p1).normalized();
            let angle = v1.dot(v2).clamp(-1.0, 1.0).acos().to_degrees();
            let cond_c = angle < min_angle_deg;

            if cond_a || cond_b || cond_c {
                poly.collapse(h, 0.5);
                collapsed_any = true;
            }
        }
        if !collapsed_any {
            break;
        }
        poly.compact();
    }
    if poly.num_vertices() < 3 {
        return Err(OceanMeshError::DegeneratePolygon("polygon collapsed below 3 vertices".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vec2::Aabb;

    fn rectangle_region(min: Vec2, max: Vec2) -> LineGraph {
        let mut g = LineGraph::new();
        let a = g.add_vertex(Vec2::new(min.x, min.y));
        let b = g.add_vertex(Vec2::new(max.x, min.y));
        let c = g.add_vertex(Vec2::new(max.x, max.y));
        let d = g.add_vertex(Vec2::new(min.x, max.y));
        g.add_edge(a, b);
        g.add_edge(b, c);
        g.add_edge(c, d);
        g.add_edge(d, a);
        g
    }

    fn uniform_size(value: f64) -> SizeField {
        let aabb = Aabb::new(Vec2::new(-100.0, -100.0), Vec2::new(100.0, 100.0));
        SizeField::new(ScalarField::new(aabb, 2, 2, vec![value; 4]))
    }

    #[test]
    fn region_fully_over_water_returns_region_as_outer() {
        let bathy_aabb = Aabb::new(Vec2::new(-2.0, -2.0), Vec2::new(2.0, 2.0));
        let bathy = ScalarField::new(bathy_aabb, 5, 5, vec![-10_i16; 25]);
        let region = rectangle_region(Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0));
        let size = uniform_size(0.05);
        let mut rng = Rng::new(1);
        let boundary =
            BoundaryBuilder::build(&bathy, &region, &size, 0.0, &BoundaryOptions { simplify: false, ..Default::default() }, &mut rng)
                .unwrap();
        assert!(boundary.islands.is_empty());
        assert!(boundary.outer.area() > 0.0);
    }

    #[test]
    fn canonicalize_rejects_open_path() {
        let mut g = LineGraph::new();
        let a = g.add_vertex(Vec2::new(0.0, 0.0));
        let b = g.add_vertex(Vec2::new(1.0, 0.0));
        let c = g.add_vertex(Vec2::new(1.0, 1.0));
        g.add_edge(a, b);
        g.add_edge(b, c);
        assert!(canonicalize_region(&g).is_err());
    }
}
