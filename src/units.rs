//! Degree <-> metre conversion for the single scalar "flat earth" projection
//! the source uses: longitude/latitude degrees scaled by a constant derived
//! from the mean earth radius (spec §3, open question §9(a)).

pub const EARTH_RADIUS_M: f64 = 6_371_009.0;

/// Metres per degree of arc, `pi * R / 180`.
pub const METERS_PER_DEGREE: f64 = std::f64::consts::PI * EARTH_RADIUS_M / 180.0;

#[inline]
pub fn degrees_to_meters(deg: f64) -> f64 {
    deg * METERS_PER_DEGREE
}

#[inline]
pub fn meters_to_degrees(m: f64) -> f64 {
    m / METERS_PER_DEGREE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let m = 12_345.6;
        assert!((meters_to_degrees(degrees_to_meters(meters_to_degrees(m))) - meters_to_degrees(m)).abs() < 1e-9);
    }

    #[test]
    fn one_degree_is_about_111km() {
        assert!((degrees_to_meters(1.0) - 111_195.0).abs() < 50.0);
    }
}
