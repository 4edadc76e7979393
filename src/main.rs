use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use oceanmesh::config::Config;
use oceanmesh::error::OceanMeshError;
use oceanmesh::io::mesh_writer;
use oceanmesh::io::raster::TextGridSource;

/// Generates a triangulated ocean/lake mesh from a bathymetry raster and a
/// region polygon, per a JSON configuration file.
#[derive(Parser)]
struct Args {
    /// Path to the pipeline configuration file (JSON).
    config: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args.config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn exit_code(err: &OceanMeshError) -> u8 {
    match err {
        OceanMeshError::InvalidConfig(_) => 2,
        OceanMeshError::InvalidRegion(_) => 3,
        OceanMeshError::BoundaryIntersection => 4,
        OceanMeshError::BackendFailure(_) => 5,
        OceanMeshError::DegeneratePolygon(_) => 6,
        OceanMeshError::OutOfRange(_) => 7,
        OceanMeshError::IoError(_) => 8,
    }
}

fn run(config_path: &PathBuf) -> oceanmesh::Result<()> {
    let config_text = std::fs::read_to_string(config_path).map_err(OceanMeshError::IoError)?;
    let config: Config = serde_json::from_str(&config_text)
        .map_err(|e| OceanMeshError::InvalidConfig(e.to_string()))?;
    config.validate()?;

    let bathymetry_file = File::open(&config.netcdf_bathymetry).map_err(OceanMeshError::IoError)?;
    let bathymetry_source = TextGridSource::new(BufReader::new(bathymetry_file));
    let bathymetry = bathymetry_source.read_once()?;

    struct PreloadedBathymetry(oceanmesh::scalar_field::ScalarField<i16>);
    impl oceanmesh::io::raster::BathymetrySource for PreloadedBathymetry {
        fn load(&self) -> oceanmesh::Result<oceanmesh::scalar_field::ScalarField<i16>> {
            Ok(self.0.clone())
        }
    }

    let output = oceanmesh::generate(&config, &PreloadedBathymetry(bathymetry))?;

    log::info!(
        "generated mesh: {} vertices, {} faces",
        output.mesh.vertex_count(),
        output.mesh.face_count()
    );
    for diagnostic in &output.diagnostics {
        log::warn!("[{}] {}", diagnostic.stage, diagnostic.message);
    }

    if let Some(path) = &config.output.mesh_file_path {
        write_mesh(&config, &output, path)?;
    }

    Ok(())
}

fn write_mesh(config: &Config, output: &oceanmesh::GenerateOutput, path: &str) -> oceanmesh::Result<()> {
    use oceanmesh::config::MeshFileFormat;

    match config.output.mesh_file_format {
        MeshFileFormat::Vtk => {
            let file = File::create(path).map_err(OceanMeshError::IoError)?;
            mesh_writer::write_vtk(file, &output.mesh, false)
        }
        MeshFileFormat::Off => {
            let file = File::create(path).map_err(OceanMeshError::IoError)?;
            mesh_writer::write_off(file, &output.mesh)
        }
        MeshFileFormat::Nod2d => {
            let bathy = config.output.save_bathymetry.then_some(&output.bathymetry);
            mesh_writer::write_triple_format(path, &output.mesh, bathy)
        }
    }
}
