//! Marching quads: iso-contour extraction from a `ScalarField` into a
//! `LineGraph` (spec §4.3), grounded on the original source's
//! `boundary/marching_quads.cpp`. Parallel over cells per spec §5, with a
//! reader/writer lock guarding the dedup table and short critical sections
//! for vertex/edge array append, mirroring `worldgen`'s `rayon` usage
//! elsewhere in the teacher.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use rayon::prelude::*;

use crate::geometry::line_graph::LineGraph;
use crate::geometry::vec2::Vec2;
use crate::scalar_field::{FieldValue, ScalarField};

/// Bit `k` set means side `k` (0=bottom,1=right,2=top,3=left) of the cell
/// carries a contour crossing. Each nibble groups up to two sides.
const EDGE_TABLE: [u8; 16] = [
    0b0000, 0b1001, 0b0011, 0b1010, 0b0110, 0b1111, 0b0101, 0b1100, 0b1100, 0b0101, 0b1111, 0b0110,
    0b1010, 0b0011, 0b1001, 0b0000,
];

fn linear_interpolation(p1: Vec2, p2: Vec2, v1: f64, v2: f64, iso: f64) -> Vec2 {
    if (v2 - v1).abs() < 1e-5 {
        return (p1 + p2) * 0.5;
    }
    let t = (iso - v1) / (v2 - v1);
    p1 + (p2 - p1) * t
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct EdgeKey(usize);

struct CellSample {
    corners: [Vec2; 4],
    values: [f64; 4],
}

fn sample_cell<T: FieldValue>(field: &ScalarField<T>, i: usize, j: usize) -> CellSample {
    CellSample {
        corners: [
            field.node_position(i, j),
            field.node_position(i + 1, j),
            field.node_position(i + 1, j + 1),
            field.node_position(i, j + 1),
        ],
        values: [
            field.grid(i, j).to_f64(),
            field.grid(i + 1, j).to_f64(),
            field.grid(i + 1, j + 1).to_f64(),
            field.grid(i, j + 1).to_f64(),
        ],
    }
}

/// Side index -> (corner_a, corner_b) within the cell's 4-corner local array.
const SIDES: [(usize, usize); 4] = [(0, 1), (1, 2), (2, 3), (3, 0)];

/// Extracts the iso-contour of `field` at `iso_value` as a `LineGraph`.
pub fn marching_quads<T: FieldValue + Sync>(field: &ScalarField<T>, iso_value: f64) -> LineGraph {
    let (nx, ny) = field.dims();
    if nx < 2 || ny < 2 {
        return LineGraph::new();
    }

    let dedup: RwLock<HashMap<EdgeKey, usize>> = RwLock::new(HashMap::new());
    let graph = Mutex::new(LineGraph::new());

    let cells: Vec<(usize, usize)> = (0..ny - 1)
        .flat_map(|j| (0..nx - 1).map(move |i| (i, j)))
        .collect();

    cells.par_iter().for_each(|&(i, j)| {
        let cell = sample_cell(field, i, j);
        let mut lookup_index = 0u8;
        for (k, v) in cell.values.iter().enumerate() {
            if *v >= iso_value {
                lookup_index |= 1 << k;
            }
        }
        let active = EDGE_TABLE[lookup_index as usize];
        if active == 0 {
            return;
        }

        let base_linear = field.linear_index(i, j);
        let mut side_points: Vec<(usize, usize)> = Vec::new(); // (side, vertex idx in graph)

        for side in 0..4 {
            if active & (1 << side) == 0 {
                continue;
            }
            let key = EdgeKey(base_linear * 2 + side_offset(side, nx));
            let (a, b) = SIDES[side];
            let vertex = {
                let existing = dedup.read().unwrap().get(&key).copied();
                if let Some(v) = existing {
                    v
                } else {
                    let point = linear_interpolation(
                        cell.corners[a],
                        cell.corners[b],
                        cell.values[a],
                        cell.values[b],
                        iso_value,
                    );
                    let mut guard = dedup.write().unwrap();
                    // Re-check under the write lock in case another thread
                    // inserted the same key between our read and this write.
                    *guard.entry(key).or_insert_with(|| {
                        let mut g = graph.lock().unwrap();
                        g.add_vertex(point)
                    })
                }
            };
            side_points.push((side, vertex));
        }

        // Connect pairs of crossing points produced for this cell. The
        // (ambiguous) 4-vertex case resolves via the asymptotic decider.
        if side_points.len() == 2 {
            let mut g = graph.lock().unwrap();
            g.add_edge(side_points[0].1, side_points[1].1);
        } else if side_points.len() == 4 {
            let v0 = cell.values[0];
            let v1 = cell.values[1];
            let v2 = cell.values[2];
            let v3 = cell.values[3];
            let denom = v0 + v2 - v1 - v3;
            let cross_pair = if denom.abs() > 1e-12 {
                (v0 * v2 + v1 * v3) / denom < iso_value
            } else {
                true
            };
            let mut g = graph.lock().unwrap();
            if cross_pair {
                g.add_edge(side_points[0].1, side_points[2].1);
                g.add_edge(side_points[1].1, side_points[3].1);
            } else {
                g.add_edge(side_points[0].1, side_points[1].1);
                g.add_edge(side_points[2].1, side_points[3].1);
            }
        }
    });

    graph.into_inner().unwrap()
}

/// Per-side offset into the shared cell-edge key space: bottom/left sides are
/// owned by this cell, right/top sides alias the neighbouring cell's
/// bottom/left so both cells agree on the same dedup key.
fn side_offset(side: usize, nx: usize) -> usize {
    match side {
        0 => 0,        // bottom, owned here
        1 => 3,        // right: shares the next column's left side
        2 => 2 * nx,   // top: shares the row-above cell's bottom
        3 => 1,        // left, owned here
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vec2::Aabb;

    #[test]
    fn flat_field_produces_no_contour() {
        let aabb = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));
        let field = ScalarField::new(aabb, 3, 3, vec![1.0_f64; 9]);
        let graph = marching_quads(&field, 0.0);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn simple_step_produces_one_segment() {
        let aabb = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));
        // left column negative, right column positive: one vertical contour.
        let values = vec![-1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
        let field = ScalarField::new(aabb, 3, 3, values);
        let graph = marching_quads(&field, 0.0);
        assert!(!graph.edges.is_empty());
    }

    #[test]
    fn ambiguous_cell_connects_some_pair() {
        // 2x2 grid, alternating corner signs, iso = 0 (spec §8 scenario 3).
        let aabb = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));
        let values = vec![1.0, -1.0, -1.0, 1.0];
        let field = ScalarField::new(aabb, 2, 2, values);
        let graph = marching_quads(&field, 0.0);
        assert_eq!(graph.edges.len(), 2);
    }
}
