use thiserror::Error;

/// Error kinds returned from top-level pipeline operations (spec §7).
///
/// Low-level invariant violations (index bounds, empty aggregates) are not
/// represented here — they panic via `debug_assert!`, matching the source's
/// use of C++ `assert`.
#[derive(Debug, Error)]
pub enum OceanMeshError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid region: {0}")]
    InvalidRegion(String),

    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("degenerate polygon: {0}")]
    DegeneratePolygon(String),

    #[error("boundary self-intersection detected")]
    BoundaryIntersection,

    #[error("triangulation backend failure: {0}")]
    BackendFailure(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OceanMeshError>;
