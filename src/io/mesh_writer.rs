//! Mesh output writers (spec §6): VTK legacy (ASCII or big-endian binary),
//! OFF (ASCII), and the triple-file `nod2d`/`elem2d`/`nodhn` text format.
//! Grounded on the original source's `io/vtk_writer.cpp`, `off_writer.cpp`,
//! and `fesom_writer.cpp`.

use std::io::{self, Write};

use crate::error::{OceanMeshError, Result};
use crate::mesh::mesh::Mesh;
use crate::scalar_field::ScalarField;

fn io(err: io::Error) -> OceanMeshError {
    OceanMeshError::IoError(err)
}

/// Writes VTK legacy format. `binary = true` writes points/cells in
/// big-endian binary per the VTK legacy spec; `false` writes ASCII.
pub fn write_vtk<W: Write>(mut out: W, mesh: &Mesh, binary: bool) -> Result<()> {
    let vertices: Vec<usize> = mesh.vertices_iter().collect();
    let mut index_of = std::collections::HashMap::new();
    for (i, &v) in vertices.iter().enumerate() {
        index_of.insert(v, i);
    }
    let faces: Vec<[usize; 3]> = mesh.faces_iter().map(|f| mesh.face_vertices(f)).collect();

    writeln!(out, "# vtk DataFile Version 3.0").map_err(io)?;
    writeln!(out, "oceanmesh triangulation").map_err(io)?;
    writeln!(out, "{}", if binary { "BINARY" } else { "ASCII" }).map_err(io)?;
    writeln!(out, "DATASET UNSTRUCTURED_GRID").map_err(io)?;
    writeln!(out, "POINTS {} double", vertices.len()).map_err(io)?;

    if binary {
        for &v in &vertices {
            let p = mesh.position(v);
            for coord in [p.x, p.y, p.z] {
                out.write_all(&coord.to_be_bytes()).map_err(io)?;
            }
        }
        writeln!(out).map_err(io)?;
    } else {
        for &v in &vertices {
            let p = mesh.position(v);
            writeln!(out, "{} {} {}", p.x, p.y, p.z).map_err(io)?;
        }
    }

    writeln!(out, "CELLS {} {}", faces.len(), faces.len() * 4).map_err(io)?;
    if binary {
        for tri in &faces {
            out.write_all(&3u32.to_be_bytes()).map_err(io)?;
            for &v in tri {
                out.write_all(&(index_of[&v] as u32).to_be_bytes()).map_err(io)?;
            }
        }
        writeln!(out).map_err(io)?;
    } else {
        for tri in &faces {
            writeln!(out, "3 {} {} {}", index_of[&tri[0]], index_of[&tri[1]], index_of[&tri[2]]).map_err(io)?;
        }
    }

    writeln!(out, "CELL_TYPES {}", faces.len()).map_err(io)?;
    if binary {
        for _ in &faces {
            out.write_all(&5u32.to_be_bytes()).map_err(io)?; // VTK_TRIANGLE
        }
        writeln!(out).map_err(io)?;
    } else {
        for _ in &faces {
            writeln!(out, "5").map_err(io)?;
        }
    }
    Ok(())
}

/// Writes OFF (Object File Format), ASCII only.
pub fn write_off<W: Write>(mut out: W, mesh: &Mesh) -> Result<()> {
    let vertices: Vec<usize> = mesh.vertices_iter().collect();
    let mut index_of = std::collections::HashMap::new();
    for (i, &v) in vertices.iter().enumerate() {
        index_of.insert(v, i);
    }
    let faces: Vec<[usize; 3]> = mesh.faces_iter().map(|f| mesh.face_vertices(f)).collect();

    writeln!(out, "OFF").map_err(io)?;
    writeln!(out, "{} {} 0", vertices.len(), faces.len()).map_err(io)?;
    for &v in &vertices {
        let p = mesh.position(v);
        writeln!(out, "{} {} {}", p.x, p.y, p.z).map_err(io)?;
    }
    for tri in &faces {
        writeln!(out, "3 {} {} {}", index_of[&tri[0]], index_of[&tri[1]], index_of[&tri[2]]).map_err(io)?;
    }
    Ok(())
}

/// Writes the triple-file text format used by FESOM-style solvers:
/// `<prefix>nod2d.out` (1-based `idx x y boundary_marker` records),
/// `<prefix>elem2d.out` (1-based triangle `v1 v2 v3` records), and
/// `<prefix>nodhn.out` (per-vertex bathymetry height).
pub fn write_triple_format(
    prefix: &str,
    mesh: &Mesh,
    bathymetry: Option<&ScalarField<i16>>,
) -> Result<()> {
    let vertices: Vec<usize> = mesh.vertices_iter().collect();
    let mut index_of = std::collections::HashMap::new();
    for (i, &v) in vertices.iter().enumerate() {
        index_of.insert(v, i + 1); // 1-based
    }
    let faces: Vec<[usize; 3]> = mesh.faces_iter().map(|f| mesh.face_vertices(f)).collect();

    let nod_path = format!("{prefix}nod2d.out");
    let mut nod = std::fs::File::create(&nod_path).map_err(io)?;
    writeln!(nod, "{}", vertices.len()).map_err(io)?;
    for &v in &vertices {
        let p = mesh.position(v);
        let marker = if mesh.is_boundary_vertex(v) { 1 } else { 0 };
        writeln!(nod, "{} {} {} {}", index_of[&v], p.x, p.y, marker).map_err(io)?;
    }

    let elem_path = format!("{prefix}elem2d.out");
    let mut elem = std::fs::File::create(&elem_path).map_err(io)?;
    writeln!(elem, "{}", faces.len()).map_err(io)?;
    for tri in &faces {
        writeln!(elem, "{} {} {}", index_of[&tri[0]], index_of[&tri[1]], index_of[&tri[2]]).map_err(io)?;
    }

    let nodhn_path = format!("{prefix}nodhn.out");
    let mut nodhn = std::fs::File::create(&nodhn_path).map_err(io)?;
    for &v in &vertices {
        let p = mesh.position(v);
        let height = bathymetry.and_then(|b| b.sample(p.xy()).ok()).unwrap_or(0.0);
        writeln!(nodhn, "{height}").map_err(io)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vec3::Vec3;

    fn unit_triangle_mesh() -> Mesh {
        let pts = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)];
        Mesh::from_triangles(pts, &[[0, 1, 2]])
    }

    #[test]
    fn writes_ascii_vtk() {
        let mesh = unit_triangle_mesh();
        let mut buf = Vec::new();
        write_vtk(&mut buf, &mesh, false).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("DATASET UNSTRUCTURED_GRID"));
        assert!(text.contains("CELLS 1 4"));
    }

    #[test]
    fn writes_off() {
        let mesh = unit_triangle_mesh();
        let mut buf = Vec::new();
        write_off(&mut buf, &mesh).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("OFF\n"));
        assert!(text.contains("3 3 0"));
    }
}
