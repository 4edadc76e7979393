//! Bathymetry raster input (spec §6): consumers only ever see the
//! `ScalarField<i16>` interface. Decoding an actual NetCDF file is out of
//! scope (spec §1 non-goals); this module defines the consumer-facing
//! trait plus a self-describing text fixture reader used by tests and the
//! CLI's `--bathymetry` escape hatch, grounded on the original source's
//! `io/netcdf_reader.cpp` read-path shape.

use std::io::{BufRead, BufReader, Read};

use crate::error::{OceanMeshError, Result};
use crate::geometry::vec2::{Aabb, Vec2};
use crate::scalar_field::ScalarField;

/// A bathymetry source producing a `ScalarField<i16>` over a lon/lat box.
/// Longitude/latitude axes are assumed ascending; a source spanning the
/// antimeridian is expected to stitch both halves before returning (spec
/// §6), which is the caller's responsibility, not this trait's.
pub trait BathymetrySource {
    fn load(&self) -> Result<ScalarField<i16>>;
}

/// Reads a plain-text grid fixture:
/// ```text
/// nx ny
/// min_lon min_lat max_lon max_lat
/// v(0,0) v(1,0) ... v(nx-1,0)
/// v(0,1) ...
/// ...
/// ```
/// rows given south-to-north (ascending latitude), matching `ScalarField`'s
/// row-major, corner-sampled layout.
pub struct TextGridSource<R> {
    reader: R,
}

impl<R: Read> TextGridSource<R> {
    pub fn new(reader: R) -> Self {
        TextGridSource { reader }
    }
}

impl<R: Read> TextGridSource<R> {
    /// Consumes the source, since the inner reader is not `Clone`.
    pub fn read_once(self) -> Result<ScalarField<i16>> {
        let mut buf = BufReader::new(self.reader);
        let mut line = String::new();

        buf.read_line(&mut line).map_err(OceanMeshError::IoError)?;
        let mut dims = line.split_whitespace();
        let nx: usize = parse_field(dims.next())?;
        let ny: usize = parse_field(dims.next())?;

        line.clear();
        buf.read_line(&mut line).map_err(OceanMeshError::IoError)?;
        let mut bounds = line.split_whitespace();
        let min_lon: f64 = parse_field(bounds.next())?;
        let min_lat: f64 = parse_field(bounds.next())?;
        let max_lon: f64 = parse_field(bounds.next())?;
        let max_lat: f64 = parse_field(bounds.next())?;

        let mut values = Vec::with_capacity(nx * ny);
        for _ in 0..ny {
            line.clear();
            buf.read_line(&mut line).map_err(OceanMeshError::IoError)?;
            for token in line.split_whitespace() {
                values.push(parse_field(Some(token))?);
            }
        }
        if values.len() != nx * ny {
            return Err(OceanMeshError::InvalidConfig(format!(
                "expected {} values, got {}",
                nx * ny,
                values.len()
            )));
        }

        let aabb = Aabb::new(Vec2::new(min_lon, min_lat), Vec2::new(max_lon, max_lat));
        Ok(ScalarField::new(aabb, nx, ny, values))
    }
}

fn parse_field<T: std::str::FromStr>(token: Option<&str>) -> Result<T> {
    token
        .ok_or_else(|| OceanMeshError::InvalidConfig("missing field in bathymetry fixture".into()))?
        .parse()
        .map_err(|_| OceanMeshError::InvalidConfig("malformed field in bathymetry fixture".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_flat_grid() {
        let text = "3 3\n-1.0 -1.0 1.0 1.0\n-10 -10 -10\n-10 -10 -10\n-10 -10 -10\n";
        let field = TextGridSource::new(text.as_bytes()).read_once().unwrap();
        assert_eq!(field.dims(), (3, 3));
        assert_eq!(field.grid(1, 1), -10);
    }

    #[test]
    fn mismatched_value_count_errors() {
        let text = "3 3\n-1.0 -1.0 1.0 1.0\n-10 -10\n";
        assert!(TextGridSource::new(text.as_bytes()).read_once().is_err());
    }
}
