//! Pipeline configuration (spec §6), grounded on the original source's
//! `config/params.cpp` and the teacher's `config::Params`.

use serde::{Deserialize, Serialize};

use crate::error::{OceanMeshError, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PolyRegion {
    File { path: String },
    Rectangle { min: (f64, f64), max: (f64, f64) },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AreaOfInterestSpec {
    pub center: (f64, f64),
    pub r_inner: f64,
    pub r_outer: f64,
    pub size_m: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolutionSpec {
    pub coarsest: f64,
    pub finest: f64,
    pub coastal: f64,
    #[serde(default)]
    pub aois: Vec<AreaOfInterestSpec>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum GradientLimitingSpec {
    None,
    Omg { limit: f64 },
    Marche { limit: f64 },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BoundarySpec {
    pub height: f64,
    #[serde(default)]
    pub ignore_islands: bool,
    #[serde(default)]
    pub allow_self_intersection: bool,
    #[serde(default = "default_min_angle")]
    pub min_angle: f64,
}

fn default_min_angle() -> f64 {
    5.0
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TriangulatorBackend {
    Triangle,
    Jigsaw,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MeshFileFormat {
    Vtk,
    Off,
    Nod2d,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputSpec {
    pub mesh_file_path: Option<String>,
    pub mesh_file_format: MeshFileFormat,
    #[serde(default)]
    pub save_bathymetry: bool,
    #[serde(default)]
    pub save_size_function: bool,
    #[serde(default)]
    pub save_boundary: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub poly_region: PolyRegion,
    pub netcdf_bathymetry: String,
    #[serde(default)]
    pub sea_level: f64,
    pub resolution: ResolutionSpec,
    pub gradient_limiting: GradientLimitingSpec,
    pub boundary: BoundarySpec,
    pub triangulator: TriangulatorBackend,
    #[serde(default = "default_remeshing_iterations")]
    pub remeshing_iterations: u32,
    pub output: OutputSpec,
}

fn default_remeshing_iterations() -> u32 {
    10
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.resolution.coarsest <= 0.0 || self.resolution.finest <= 0.0 || self.resolution.coastal <= 0.0 {
            return Err(OceanMeshError::InvalidConfig("resolution coarsest/finest/coastal must be positive".into()));
        }
        for aoi in &self.resolution.aois {
            if aoi.r_inner >= aoi.r_outer {
                return Err(OceanMeshError::InvalidConfig("area of interest requires r_inner < r_outer".into()));
            }
            if aoi.size_m <= 0.0 {
                return Err(OceanMeshError::InvalidConfig("area of interest size_m must be positive".into()));
            }
        }
        if let GradientLimitingSpec::Omg { limit } | GradientLimitingSpec::Marche { limit } = self.gradient_limiting {
            if limit <= 0.0 {
                return Err(OceanMeshError::InvalidConfig("gradient limiting limit must be positive".into()));
            }
        }
        if self.boundary.min_angle < 0.0 || self.boundary.min_angle >= 180.0 {
            return Err(OceanMeshError::InvalidConfig("boundary min_angle must be in [0, 180)".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> Config {
        Config {
            poly_region: PolyRegion::Rectangle { min: (-1.0, -1.0), max: (1.0, 1.0) },
            netcdf_bathymetry: "bathy.nc".into(),
            sea_level: 0.0,
            resolution: ResolutionSpec { coarsest: 10_000.0, finest: 1_000.0, coastal: 5_000.0, aois: vec![] },
            gradient_limiting: GradientLimitingSpec::Marche { limit: 0.1 },
            boundary: BoundarySpec { height: 0.0, ignore_islands: false, allow_self_intersection: false, min_angle: 5.0 },
            triangulator: TriangulatorBackend::Triangle,
            remeshing_iterations: 10,
            output: OutputSpec {
                mesh_file_path: Some("out.vtk".into()),
                mesh_file_format: MeshFileFormat::Vtk,
                save_bathymetry: false,
                save_size_function: false,
                save_boundary: false,
            },
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn non_positive_resolution_is_rejected() {
        let mut cfg = sample_config();
        cfg.resolution.coarsest = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn aoi_with_inverted_radii_is_rejected() {
        let mut cfg = sample_config();
        cfg.resolution.aois.push(AreaOfInterestSpec { center: (0.0, 0.0), r_inner: 10.0, r_outer: 5.0, size_m: 100.0 });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn json_round_trips() {
        let cfg = sample_config();
        let json = serde_json::to_string(&cfg).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.netcdf_bathymetry, cfg.netcdf_bathymetry);
    }
}
