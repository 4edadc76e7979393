//! `LineGraph`: a planar graph of points and unordered edges (spec §3),
//! grounded on the original source's `geometry/line_graph.h`/`.cpp`.

use std::collections::HashMap;

use super::line_intersection::{line_intersection, Intersection};
use super::vec2::{Aabb, Vec2};

pub type VertexHandle = usize;
pub type EdgeHandle = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub first: VertexHandle,
    pub second: VertexHandle,
}

#[derive(Clone, Debug, Default)]
pub struct LineGraph {
    pub points: Vec<Vec2>,
    pub edges: Vec<Edge>,
}

/// Per-vertex incident edge lists, derived from a `LineGraph` snapshot.
#[derive(Clone, Debug, Default)]
pub struct AdjacencyList {
    pub neighbors: Vec<Vec<EdgeHandle>>,
}

impl AdjacencyList {
    pub fn degree(&self, v: VertexHandle) -> usize {
        self.neighbors[v].len()
    }

    /// The other endpoint of edge `e` relative to vertex `from`.
    pub fn other_endpoint(&self, graph: &LineGraph, e: EdgeHandle, from: VertexHandle) -> VertexHandle {
        let edge = graph.edges[e];
        if edge.first == from {
            edge.second
        } else {
            edge.first
        }
    }
}

impl LineGraph {
    pub fn new() -> Self {
        LineGraph::default()
    }

    pub fn add_vertex(&mut self, p: Vec2) -> VertexHandle {
        self.points.push(p);
        self.points.len() - 1
    }

    pub fn add_edge(&mut self, a: VertexHandle, b: VertexHandle) -> EdgeHandle {
        self.edges.push(Edge { first: a, second: b });
        self.edges.len() - 1
    }

    pub fn aabb(&self) -> Option<Aabb> {
        Aabb::from_points(self.points.iter().copied())
    }

    pub fn compute_adjacency(&self) -> AdjacencyList {
        let mut neighbors = vec![Vec::new(); self.points.len()];
        for (e, edge) in self.edges.iter().enumerate() {
            neighbors[edge.first].push(e);
            neighbors[edge.second].push(e);
        }
        AdjacencyList { neighbors }
    }

    /// Removes edges at the given indices (largest-first so earlier indices
    /// stay valid during the removal).
    pub fn remove_edges_by_index(&mut self, mut indices: Vec<EdgeHandle>) {
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.dedup();
        for idx in indices {
            self.edges.remove(idx);
        }
    }

    /// Removes zero-length edges and unifies vertices that are bit-identical
    /// but reached via different edges, matching the source's
    /// `removeDegeneratedGeometry` (`SPEC_FULL.md` §B).
    pub fn remove_degenerate_geometry(&mut self) {
        // Unify coincident points first, keyed by exact coordinate (marching
        // quads can emit the same location from two different cell edges).
        let mut canonical: HashMap<(u64, u64), VertexHandle> = HashMap::new();
        let mut remap: Vec<VertexHandle> = (0..self.points.len()).collect();
        for (i, p) in self.points.iter().enumerate() {
            let key = (p.x.to_bits(), p.y.to_bits());
            match canonical.get(&key) {
                Some(&existing) => remap[i] = existing,
                None => {
                    canonical.insert(key, i);
                }
            }
        }

        let mut dead_edges = Vec::new();
        for (e, edge) in self.edges.iter_mut().enumerate() {
            edge.first = remap[edge.first];
            edge.second = remap[edge.second];
            if edge.first == edge.second {
                dead_edges.push(e);
            }
        }
        self.remove_edges_by_index(dead_edges);
        self.compact_vertices();
    }

    /// Drops vertices no edge references and reindexes the survivors.
    fn compact_vertices(&mut self) {
        let mut used = vec![false; self.points.len()];
        for edge in &self.edges {
            used[edge.first] = true;
            used[edge.second] = true;
        }
        let mut new_index = vec![0usize; self.points.len()];
        let mut new_points = Vec::new();
        for (i, keep) in used.iter().enumerate() {
            if *keep {
                new_index[i] = new_points.len();
                new_points.push(self.points[i]);
            }
        }
        for edge in &mut self.edges {
            edge.first = new_index[edge.first];
            edge.second = new_index[edge.second];
        }
        self.points = new_points;
    }

    /// O(n^2) pairwise test, skipping edges sharing a vertex.
    pub fn has_self_intersection(&self) -> bool {
        for i in 0..self.edges.len() {
            for j in (i + 1)..self.edges.len() {
                let a = self.edges[i];
                let b = self.edges[j];
                if a.first == b.first || a.first == b.second || a.second == b.first || a.second == b.second {
                    continue;
                }
                let p1 = self.points[a.first];
                let p2 = self.points[a.second];
                let p3 = self.points[b.first];
                let p4 = self.points[b.second];
                match line_intersection(p1, p2, p3, p4) {
                    Intersection::None => {}
                    _ => return true,
                }
            }
        }
        false
    }

    /// Appends `other`'s points and edges, offsetting indices.
    pub fn combine(&mut self, other: &LineGraph) {
        let offset = self.points.len();
        self.points.extend_from_slice(&other.points);
        self.edges.extend(other.edges.iter().map(|e| Edge {
            first: e.first + offset,
            second: e.second + offset,
        }));
    }

    pub fn combine_polygons(graphs: &[LineGraph]) -> LineGraph {
        let mut combined = LineGraph::new();
        for g in graphs {
            combined.combine(g);
        }
        combined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacency_counts_incident_edges() {
        let mut g = LineGraph::new();
        let a = g.add_vertex(Vec2::new(0.0, 0.0));
        let b = g.add_vertex(Vec2::new(1.0, 0.0));
        let c = g.add_vertex(Vec2::new(1.0, 1.0));
        g.add_edge(a, b);
        g.add_edge(b, c);
        let adj = g.compute_adjacency();
        assert_eq!(adj.degree(a), 1);
        assert_eq!(adj.degree(b), 2);
        assert_eq!(adj.degree(c), 1);
    }

    #[test]
    fn degenerate_geometry_merges_coincident_points() {
        let mut g = LineGraph::new();
        let a = g.add_vertex(Vec2::new(0.0, 0.0));
        let b = g.add_vertex(Vec2::new(1.0, 0.0));
        let c = g.add_vertex(Vec2::new(1.0, 0.0)); // duplicate of b
        let d = g.add_vertex(Vec2::new(2.0, 0.0));
        g.add_edge(a, b);
        g.add_edge(c, d);
        g.remove_degenerate_geometry();
        assert_eq!(g.points.len(), 3);
        assert_eq!(g.edges.len(), 2);
    }

    #[test]
    fn crossing_square_diagonals_self_intersect() {
        let mut g = LineGraph::new();
        let a = g.add_vertex(Vec2::new(0.0, 0.0));
        let b = g.add_vertex(Vec2::new(1.0, 1.0));
        let c = g.add_vertex(Vec2::new(0.0, 1.0));
        let d = g.add_vertex(Vec2::new(1.0, 0.0));
        g.add_edge(a, b);
        g.add_edge(c, d);
        assert!(g.has_self_intersection());
    }

    #[test]
    fn non_crossing_segments_do_not_self_intersect() {
        let mut g = LineGraph::new();
        let a = g.add_vertex(Vec2::new(0.0, 0.0));
        let b = g.add_vertex(Vec2::new(1.0, 0.0));
        let c = g.add_vertex(Vec2::new(0.0, 1.0));
        let d = g.add_vertex(Vec2::new(1.0, 1.0));
        g.add_edge(a, b);
        g.add_edge(c, d);
        assert!(!g.has_self_intersection());
    }
}
