//! A 2-manifold half-edge triangle mesh over points whose z is always zero
//! (spec §3 `Mesh`), arena-and-index based per §9 design notes — there is no
//! OpenMesh-equivalent crate in this pack's dependency stack, so this is a
//! from-scratch half-edge structure in the spirit of the source's
//! `OpenMesh::TriMesh_ArrayKernelT` usage (`geometry/mesh.h`).

use std::collections::HashSet;

use crate::geometry::vec3::Vec3;

pub type VHandle = usize;
pub type HHandle = usize;
pub type FHandle = usize;

#[derive(Clone, Copy, Debug)]
struct HalfEdge {
    origin: VHandle,
    twin: HHandle,
    next: HHandle,
    prev: HHandle,
    face: Option<FHandle>,
    /// Set by `collapse_edge` on the (up to) six half-edges belonging to the
    /// one or two triangles it removes. Origin-vertex deletion alone cannot
    /// mark these: an apex vertex whose cached `half_edge` still points to
    /// one of them stays live, so this flag is the only signal `edges()` and
    /// `garbage_collect()` have to exclude them.
    deleted: bool,
}

#[derive(Clone, Copy, Debug)]
struct VertexData {
    pos: Vec3,
    half_edge: HHandle,
    marked: bool,
    deleted: bool,
}

#[derive(Clone, Copy, Debug)]
struct FaceData {
    half_edge: HHandle,
    deleted: bool,
}

#[derive(Clone, Debug, Default)]
pub struct Mesh {
    vertices: Vec<VertexData>,
    half_edges: Vec<HalfEdge>,
    faces: Vec<FaceData>,
}

impl Mesh {
    /// Builds a mesh from a triangle soup sharing vertex indices. Boundary
    /// half-edges (no opposing triangle) are synthesized with `face = None`
    /// and linked into boundary loops.
    pub fn from_triangles(points: Vec<Vec3>, triangles: &[[VHandle; 3]]) -> Mesh {
        let mut vertices: Vec<VertexData> = points
            .into_iter()
            .map(|p| VertexData { pos: p, half_edge: usize::MAX, marked: false, deleted: false })
            .collect();
        let mut half_edges: Vec<HalfEdge> = Vec::with_capacity(triangles.len() * 3);
        let mut faces: Vec<FaceData> = Vec::with_capacity(triangles.len());
        let mut edge_map: std::collections::HashMap<(VHandle, VHandle), HHandle> =
            std::collections::HashMap::new();

        for &[a, b, c] in triangles {
            let face_idx = faces.len();
            let he0 = half_edges.len();
            let (he1, he2) = (he0 + 1, he0 + 2);
            half_edges.push(HalfEdge { origin: a, twin: usize::MAX, next: he1, prev: he2, face: Some(face_idx), deleted: false });
            half_edges.push(HalfEdge { origin: b, twin: usize::MAX, next: he2, prev: he0, face: Some(face_idx), deleted: false });
            half_edges.push(HalfEdge { origin: c, twin: usize::MAX, next: he0, prev: he1, face: Some(face_idx), deleted: false });
            faces.push(FaceData { half_edge: he0, deleted: false });
            edge_map.insert((a, b), he0);
            edge_map.insert((b, c), he1);
            edge_map.insert((c, a), he2);
            vertices[a].half_edge = he0;
            vertices[b].half_edge = he1;
            vertices[c].half_edge = he2;
        }

        let interior_count = half_edges.len();
        let mut boundary_origin: std::collections::HashMap<VHandle, HHandle> = std::collections::HashMap::new();
        let mut boundary_edges: Vec<(HHandle, VHandle)> = Vec::new();
        for he in 0..interior_count {
            if half_edges[he].twin != usize::MAX {
                continue;
            }
            let o = half_edges[he].origin;
            let d = half_edges[half_edges[he].next].origin;
            if let Some(&twin) = edge_map.get(&(d, o)) {
                half_edges[he].twin = twin;
                half_edges[twin].twin = he;
            } else {
                let b = half_edges.len();
                half_edges.push(HalfEdge { origin: d, twin: he, next: usize::MAX, prev: usize::MAX, face: None, deleted: false });
                half_edges[he].twin = b;
                boundary_origin.insert(d, b);
                vertices[d].half_edge = b;
                boundary_edges.push((b, o));
            }
        }
        for (b, o) in boundary_edges {
            if let Some(&next_b) = boundary_origin.get(&o) {
                half_edges[b].next = next_b;
                half_edges[next_b].prev = b;
            }
        }

        Mesh { vertices, half_edges, faces }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.iter().filter(|v| !v.deleted).count()
    }

    pub fn face_count(&self) -> usize {
        self.faces.iter().filter(|f| !f.deleted).count()
    }

    pub fn position(&self, v: VHandle) -> Vec3 {
        self.vertices[v].pos
    }

    pub fn set_position(&mut self, v: VHandle, pos: Vec3) {
        self.vertices[v].pos = pos;
    }

    pub fn mark(&mut self, v: VHandle) {
        self.vertices[v].marked = true;
    }

    pub fn is_marked(&self, v: VHandle) -> bool {
        self.vertices[v].marked
    }

    pub fn reset_marks(&mut self) {
        for v in &mut self.vertices {
            v.marked = false;
        }
    }

    #[inline]
    fn dest(&self, h: HHandle) -> VHandle {
        self.half_edges[self.half_edges[h].next].origin
    }

    pub fn edge_endpoints(&self, h: HHandle) -> (VHandle, VHandle) {
        (self.half_edges[h].origin, self.dest(h))
    }

    pub fn twin_of(&self, h: HHandle) -> HHandle {
        self.half_edges[h].twin
    }

    /// Third vertex of the triangle on `h`'s side, or `None` on a boundary
    /// half-edge.
    pub fn apex(&self, h: HHandle) -> Option<VHandle> {
        self.half_edges[h].face?;
        let next = self.half_edges[h].next;
        Some(self.half_edges[self.half_edges[next].next].origin)
    }

    pub fn edge_length(&self, h: HHandle) -> f64 {
        let (a, b) = self.edge_endpoints(h);
        (self.vertices[b].pos - self.vertices[a].pos).norm()
    }

    pub fn edge_midpoint(&self, h: HHandle) -> Vec3 {
        let (a, b) = self.edge_endpoints(h);
        (self.vertices[a].pos + self.vertices[b].pos) * 0.5
    }

    /// Iterates live half-edges, one representative per undirected edge
    /// (the smaller of `h` and `twin(h)`).
    pub fn edges(&self) -> Vec<HHandle> {
        (0..self.half_edges.len())
            .filter(|&h| !self.half_edge_deleted(h) && h < self.half_edges[h].twin)
            .collect()
    }

    fn half_edge_deleted(&self, h: HHandle) -> bool {
        self.half_edges[h].deleted || self.vertices[self.half_edges[h].origin].deleted
    }

    pub fn is_boundary_edge(&self, h: HHandle) -> bool {
        self.half_edges[h].face.is_none() || self.half_edges[self.half_edges[h].twin].face.is_none()
    }

    pub fn is_boundary_vertex(&self, v: VHandle) -> bool {
        self.outgoing(v).iter().any(|&h| self.half_edges[h].face.is_none())
    }

    /// All half-edges leaving `v`, in rotational order, starting with a
    /// boundary half-edge when `v` is on the boundary.
    pub fn outgoing(&self, v: VHandle) -> Vec<HHandle> {
        let start = self.vertices[v].half_edge;
        if start == usize::MAX {
            return Vec::new();
        }
        let mut result = vec![start];
        let mut h = start;
        loop {
            if self.half_edges[h].face.is_none() {
                break;
            }
            let candidate = self.half_edges[self.half_edges[h].prev].twin;
            if candidate == start {
                break;
            }
            result.push(candidate);
            h = candidate;
        }
        result
    }

    pub fn one_ring(&self, v: VHandle) -> Vec<VHandle> {
        self.outgoing(v).iter().map(|&h| self.dest(h)).collect()
    }

    pub fn valence(&self, v: VHandle) -> usize {
        self.outgoing(v).len()
    }

    pub fn face_vertices(&self, f: FHandle) -> [VHandle; 3] {
        let h0 = self.faces[f].half_edge;
        let h1 = self.half_edges[h0].next;
        let h2 = self.half_edges[h1].next;
        [self.half_edges[h0].origin, self.half_edges[h1].origin, self.half_edges[h2].origin]
    }

    pub fn faces_iter(&self) -> impl Iterator<Item = FHandle> + '_ {
        (0..self.faces.len()).filter(|&f| !self.faces[f].deleted)
    }

    pub fn vertices_iter(&self) -> impl Iterator<Item = VHandle> + '_ {
        (0..self.vertices.len()).filter(|&v| !self.vertices[v].deleted)
    }

    pub fn face_area(&self, f: FHandle) -> f64 {
        let [a, b, c] = self.face_vertices(f);
        let (pa, pb, pc) = (self.vertices[a].pos, self.vertices[b].pos, self.vertices[c].pos);
        0.5 * (pb - pa).cross(pc - pa).norm()
    }

    /// Whether collapsing `h` (merging its origin into its destination) would
    /// preserve manifoldness: the link condition, restricted to the common
    /// neighbours of the two endpoints not exceeding the opposite vertices of
    /// the (at most two) incident faces.
    pub fn is_collapse_legal(&self, h: HHandle) -> bool {
        let (a, b) = self.edge_endpoints(h);
        let ring_a: HashSet<VHandle> = self.one_ring(a).into_iter().collect();
        let ring_b: HashSet<VHandle> = self.one_ring(b).into_iter().collect();
        let common: Vec<VHandle> = ring_a.intersection(&ring_b).cloned().collect();
        let expected = if self.is_boundary_edge(h) { 1 } else { 2 };
        common.len() <= expected && self.valence(a) > 3 && self.valence(b) > 3
    }

    /// Collapses edge `h`, merging its origin vertex into its destination at
    /// the destination's current position, removing the (up to two) incident
    /// faces. No-op (returns `false`) if the link condition fails.
    pub fn collapse_edge(&mut self, h: HHandle) -> bool {
        if !self.is_collapse_legal(h) {
            return false;
        }
        let (a, b) = self.edge_endpoints(h);
        let twin = self.half_edges[h].twin;
        // Captured before any mutation: the third vertex of each deleted
        // triangle, whose cached `half_edge` may need repointing below.
        let apex_h = self.apex(h);
        let apex_twin = self.apex(twin);

        for face in [self.half_edges[h].face, self.half_edges[twin].face].into_iter().flatten() {
            self.faces[face].deleted = true;
        }

        // Re-route every half-edge leaving `a` to leave `b` instead.
        let outgoing_a: Vec<HHandle> = self.outgoing(a);
        for oh in outgoing_a {
            self.half_edges[oh].origin = b;
        }
        self.vertices[a].deleted = true;
        if self.vertices[b].half_edge == twin || self.vertices[b].half_edge == h {
            if let Some(&replacement) = self.outgoing(b).iter().find(|&&oh| oh != h && oh != twin) {
                self.vertices[b].half_edge = replacement;
            }
        }

        // Stitch the two half-edges flanking the collapsed edge on each
        // side, then tombstone all three edges of each deleted triangle
        // (`removed` plus its `prev`/`next`) — none of them belong to any
        // surviving face once the collapse completes.
        for removed in [h, twin] {
            let prev = self.half_edges[removed].prev;
            let next = self.half_edges[removed].next;
            let prev_twin = self.half_edges[prev].twin;
            let next_twin = self.half_edges[next].twin;
            self.half_edges[prev_twin].twin = next_twin;
            self.half_edges[next_twin].twin = prev_twin;
            self.half_edges[removed].deleted = true;
            self.half_edges[prev].deleted = true;
            self.half_edges[next].deleted = true;
        }

        // An apex vertex's cached `half_edge` may have been one of the six
        // just tombstoned; repoint it at any surviving half-edge leaving it.
        for apex in [apex_h, apex_twin].into_iter().flatten() {
            if self.half_edges[self.vertices[apex].half_edge].deleted {
                if let Some(replacement) =
                    (0..self.half_edges.len()).find(|&oh| self.half_edges[oh].origin == apex && !self.half_edges[oh].deleted)
                {
                    self.vertices[apex].half_edge = replacement;
                }
            }
        }

        true
    }

    /// Splits edge `h` (origin a, dest b) at its current midpoint `m`,
    /// subdividing the one or two incident triangles: `(a,b,c)` becomes
    /// `(a,m,c)` + `(m,b,c)`, and symmetrically across the twin side when
    /// present. Returns the new vertex.
    pub fn split_edge(&mut self, h: HHandle) -> VHandle {
        let mid = self.edge_midpoint(h);
        let m = self.vertices.len();
        self.vertices.push(VertexData { pos: mid, half_edge: h, marked: false, deleted: false });

        let t = self.half_edges[h].twin;
        let n1 = self.half_edges[h].next; // b -> c
        let n0 = self.half_edges[h].prev; // c -> a
        let c = self.half_edges[n1].origin;
        let b = self.dest(h);

        // h-side: face (a,b,c) -> (a,m,c) [reuses h's face] + (m,b,c) [new face]
        let (e1, e2, e3) = if self.half_edges[h].face.is_some() {
            let f1 = self.half_edges[h].face.unwrap();
            let f1b = self.faces.len();
            self.faces.push(FaceData { half_edge: 0, deleted: false });

            let e1 = self.half_edges.len(); // m -> c
            let e2 = e1 + 1; // m -> b
            let e3 = e1 + 2; // c -> m
            self.half_edges.push(HalfEdge { origin: m, twin: e3, next: n0, prev: h, face: Some(f1), deleted: false });
            self.half_edges.push(HalfEdge { origin: m, twin: t, next: n1, prev: e3, face: Some(f1b), deleted: false });
            self.half_edges.push(HalfEdge { origin: c, twin: e1, next: e2, prev: n1, face: Some(f1b), deleted: false });

            self.half_edges[h].next = e1;
            self.half_edges[n0].prev = e1;
            self.half_edges[n1].next = e3;
            self.half_edges[n1].prev = e2;
            self.half_edges[n1].face = Some(f1b);

            self.faces[f1].half_edge = h;
            self.faces[f1b].half_edge = n1;
            self.vertices[c].half_edge = n0;
            self.vertices[b].half_edge = n1;
            (Some(e1), Some(e2), Some(e3))
        } else {
            (None, None, None)
        };

        // t-side: face (b,a,d) -> (b,m,d) [reuses t's face] + (m,a,d) [new face]
        if self.half_edges[t].face.is_some() {
            let ta1 = self.half_edges[t].next; // a -> d
            let ta0 = self.half_edges[t].prev; // d -> b
            let d = self.half_edges[ta1].origin;

            let f2 = self.half_edges[t].face.unwrap();
            let f2b = self.faces.len();
            self.faces.push(FaceData { half_edge: 0, deleted: false });

            let e4 = self.half_edges.len(); // m -> d
            let e5 = e4 + 1; // m -> a
            let e6 = e4 + 2; // d -> m
            self.half_edges.push(HalfEdge { origin: m, twin: e6, next: ta0, prev: t, face: Some(f2), deleted: false });
            self.half_edges.push(HalfEdge { origin: m, twin: h, next: ta1, prev: e6, face: Some(f2b), deleted: false });
            self.half_edges.push(HalfEdge { origin: d, twin: e4, next: e5, prev: ta1, face: Some(f2b), deleted: false });

            self.half_edges[t].next = e4;
            self.half_edges[ta0].prev = e4;
            self.half_edges[ta1].next = e6;
            self.half_edges[ta1].prev = e5;
            self.half_edges[ta1].face = Some(f2b);

            self.faces[f2].half_edge = t;
            self.faces[f2b].half_edge = ta1;
            self.vertices[d].half_edge = ta0;

            self.half_edges[h].twin = e5;
            self.half_edges[e5].twin = h;
            self.half_edges[t].twin = e2.expect("h-side exists whenever t-side does for a shared edge");
            self.half_edges[e2.unwrap()].twin = t;
        } else {
            // Boundary twin: split the lone boundary half-edge b->a into
            // b->m and m->a, preserving the boundary chain.
            let t_next = self.half_edges[t].next;
            let new_bnd = self.half_edges.len(); // m -> a
            self.half_edges.push(HalfEdge { origin: m, twin: h, next: t_next, prev: t, face: None, deleted: false });
            self.half_edges[t].next = new_bnd;
            self.half_edges[t_next].prev = new_bnd;
            self.half_edges[h].twin = new_bnd;
            if let Some(e2) = e2 {
                self.half_edges[t].twin = e2;
                self.half_edges[e2].twin = t;
            }
        }

        m
    }

    /// Flips the shared edge of the two triangles incident to `h`, replacing
    /// it with the diagonal between the two opposite vertices.
    pub fn flip_edge(&mut self, h: HHandle) -> bool {
        let twin = self.half_edges[h].twin;
        let (Some(_), Some(_)) = (self.half_edges[h].face, self.half_edges[twin].face) else { return false };

        let h_next = self.half_edges[h].next;
        let h_prev = self.half_edges[h].prev;
        let t_next = self.half_edges[twin].next;
        let t_prev = self.half_edges[twin].prev;

        let c = self.half_edges[h_next].origin; // apex opposite h
        let d = self.half_edges[t_next].origin; // apex opposite twin

        if self.one_ring(c).contains(&d) {
            return false; // c-d edge already exists; flip would duplicate it
        }

        let face_h = self.half_edges[h].face.unwrap();
        let face_t = self.half_edges[twin].face.unwrap();

        self.half_edges[h].origin = c;
        self.half_edges[twin].origin = d;

        self.half_edges[h].next = h_prev;
        self.half_edges[h].prev = t_next;
        self.half_edges[twin].next = t_prev;
        self.half_edges[twin].prev = h_next;

        self.half_edges[h_next].next = twin;
        self.half_edges[h_next].prev = t_prev;
        self.half_edges[t_prev].next = h_next;
        self.half_edges[t_prev].prev = twin;

        self.half_edges[t_next].next = h;
        self.half_edges[t_next].prev = h_prev;
        self.half_edges[h_prev].next = t_next;
        self.half_edges[h_prev].prev = h;

        for he in [h, h_prev, t_next] {
            self.half_edges[he].face = Some(face_h);
        }
        for he in [twin, t_prev, h_next] {
            self.half_edges[he].face = Some(face_t);
        }
        self.faces[face_h].half_edge = h;
        self.faces[face_t].half_edge = twin;

        let a = self.half_edges[t_next].origin;
        let b = self.half_edges[h_next].origin;
        self.vertices[a].half_edge = t_next;
        self.vertices[b].half_edge = h_next;
        self.vertices[c].half_edge = h;
        self.vertices[d].half_edge = twin;

        true
    }

    /// Moves every interior vertex to the centroid of its one-ring.
    pub fn smooth_vertices(&mut self) {
        let targets: Vec<(VHandle, Vec3)> = self
            .vertices_iter()
            .filter(|&v| !self.is_boundary_vertex(v))
            .map(|v| {
                let ring = self.one_ring(v);
                let centroid = ring.iter().fold(Vec3::new(0.0, 0.0, 0.0), |acc, &n| acc + self.vertices[n].pos)
                    / ring.len() as f64;
                (v, centroid)
            })
            .collect();
        for (v, p) in targets {
            self.vertices[v].pos = p;
        }
    }

    /// Compacts vertices and faces, dropping tombstoned entries and
    /// invalidating all previously issued handles.
    pub fn garbage_collect(&mut self) {
        let mut new_vertex_index = vec![usize::MAX; self.vertices.len()];
        let mut new_vertices = Vec::new();
        for (i, v) in self.vertices.iter().enumerate() {
            if !v.deleted {
                new_vertex_index[i] = new_vertices.len();
                new_vertices.push(*v);
            }
        }

        let mut new_face_index = vec![usize::MAX; self.faces.len()];
        let mut new_faces = Vec::new();
        for (i, f) in self.faces.iter().enumerate() {
            if !f.deleted {
                new_face_index[i] = new_faces.len();
                new_faces.push(*f);
            }
        }

        let live_half_edges: Vec<bool> = self
            .half_edges
            .iter()
            .map(|he| !he.deleted && !self.vertices[he.origin].deleted)
            .collect();
        let mut new_he_index = vec![usize::MAX; self.half_edges.len()];
        let mut new_half_edges = Vec::new();
        for (i, he) in self.half_edges.iter().enumerate() {
            if live_half_edges[i] {
                new_he_index[i] = new_half_edges.len();
                new_half_edges.push(*he);
            }
        }
        for he in &mut new_half_edges {
            he.twin = new_he_index[he.twin];
            he.next = new_he_index[he.next];
            he.prev = new_he_index[he.prev];
            he.origin = new_vertex_index[he.origin];
            if let Some(f) = he.face {
                he.face = Some(new_face_index[f]);
            }
        }
        for v in &mut new_vertices {
            if v.half_edge != usize::MAX {
                v.half_edge = new_he_index[v.half_edge];
            }
        }
        for f in &mut new_faces {
            f.half_edge = new_he_index[f.half_edge];
        }

        self.vertices = new_vertices;
        self.half_edges = new_half_edges;
        self.faces = new_faces;
    }
}
