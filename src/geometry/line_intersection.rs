//! Robust 2-D segment intersection, grounded on the original source's
//! `geometry/line_intersection.cpp`. Per §9 design notes: a single vetted
//! predicate (determinant sign for parallel/collinear detection, followed by
//! interval-checked parameter evaluation) rather than the multiple diverging
//! fixes the source accumulated.

use super::vec2::Vec2;

const EPS: f64 = 1e-9;
const NEAR_PARALLEL: f64 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Intersection {
    /// Segments cross (or touch) at a single point, parameter `t` along p1-p2.
    Point { t: f64, u: f64, at: Vec2 },
    /// Segments are collinear and overlap.
    Collinear,
    /// No intersection.
    None,
}

struct Values {
    num_t: f64,
    num_u: f64,
    den: f64,
}

fn compute_values(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> Values {
    let d1 = p2 - p1;
    let d2 = p4 - p3;
    let den = d1.cross(d2);
    let diff = p3 - p1;
    let num_t = diff.cross(d2);
    let num_u = diff.cross(d1);
    Values { num_t, num_u, den }
}

fn on_segment(p: Vec2, a: Vec2, b: Vec2) -> bool {
    let min_x = a.x.min(b.x) - EPS;
    let max_x = a.x.max(b.x) + EPS;
    let min_y = a.y.min(b.y) - EPS;
    let max_y = a.y.max(b.y) + EPS;
    p.x >= min_x && p.x <= max_x && p.y >= min_y && p.y <= max_y
}

fn collinear_overlap(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> bool {
    on_segment(p3, p1, p2) || on_segment(p4, p1, p2) || on_segment(p1, p3, p4) || on_segment(p2, p3, p4)
}

/// Classifies the relationship between segment (p1,p2) and segment (p3,p4).
pub fn line_intersection(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> Intersection {
    let values = compute_values(p1, p2, p3, p4);
    if values.den.abs() < EPS {
        if values.num_t.abs() < EPS && collinear_overlap(p1, p2, p3, p4) {
            return Intersection::Collinear;
        }
        return Intersection::None;
    }

    let t = values.num_t / values.den;
    let u = values.num_u / values.den;
    if (-EPS..=1.0 + EPS).contains(&t) && (-EPS..=1.0 + EPS).contains(&u) {
        let at = p1 + (p2 - p1) * t.clamp(0.0, 1.0);
        Intersection::Point { t: t.clamp(0.0, 1.0), u: u.clamp(0.0, 1.0), at }
    } else {
        Intersection::None
    }
}

/// Intersection parameter `t` along (p1,p2) only, or `None` if the segments
/// don't cross within bounds. Near-parallel denominators (`|den| < 1e-4`) fall
/// back to an approximate test comparing squared distances, matching the
/// source's `lineIntersectionFactor` guard against catastrophic cancellation.
pub fn line_intersection_factor(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> Option<f64> {
    let values = compute_values(p1, p2, p3, p4);
    if values.den.abs() < NEAR_PARALLEL {
        if values.num_t.abs() < EPS && collinear_overlap(p1, p2, p3, p4) {
            // Approximate: project p3 onto (p1,p2) by squared-length ratio.
            let d = p2 - p1;
            let len2 = d.sqr_norm();
            if len2 < EPS {
                return None;
            }
            let t = (p3 - p1).dot(d) / len2;
            return Some(t.clamp(0.0, 1.0));
        }
        return None;
    }

    let t = values.num_t / values.den;
    let u = values.num_u / values.den;
    if (-EPS..=1.0 + EPS).contains(&t) && (-EPS..=1.0 + EPS).contains(&u) {
        Some(t.clamp(0.0, 1.0))
    } else {
        None
    }
}

/// Convenience wrapper returning the actual intersection point.
pub fn line_intersection_point(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> Option<Vec2> {
    line_intersection_factor(p1, p2, p3, p4).map(|t| p1 + (p2 - p1) * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_segments_intersect_at_midpoint() {
        let p1 = Vec2::new(-1.0, 0.0);
        let p2 = Vec2::new(1.0, 0.0);
        let p3 = Vec2::new(0.0, -1.0);
        let p4 = Vec2::new(0.0, 1.0);
        match line_intersection(p1, p2, p3, p4) {
            Intersection::Point { at, .. } => {
                assert!((at.x).abs() < 1e-9);
                assert!((at.y).abs() < 1e-9);
            }
            other => panic!("expected a point intersection, got {other:?}"),
        }
    }

    #[test]
    fn parallel_non_overlapping_segments_do_not_intersect() {
        let p1 = Vec2::new(0.0, 0.0);
        let p2 = Vec2::new(1.0, 0.0);
        let p3 = Vec2::new(0.0, 1.0);
        let p4 = Vec2::new(1.0, 1.0);
        assert_eq!(line_intersection(p1, p2, p3, p4), Intersection::None);
    }

    #[test]
    fn collinear_overlap_detected() {
        let p1 = Vec2::new(0.0, 0.0);
        let p2 = Vec2::new(2.0, 0.0);
        let p3 = Vec2::new(1.0, 0.0);
        let p4 = Vec2::new(3.0, 0.0);
        assert_eq!(line_intersection(p1, p2, p3, p4), Intersection::Collinear);
    }

    #[test]
    fn factor_matches_point_intersection() {
        let p1 = Vec2::new(0.0, 0.0);
        let p2 = Vec2::new(10.0, 0.0);
        let p3 = Vec2::new(5.0, -5.0);
        let p4 = Vec2::new(5.0, 5.0);
        let t = line_intersection_factor(p1, p2, p3, p4).unwrap();
        assert!((t - 0.5).abs() < 1e-9);
    }
}
