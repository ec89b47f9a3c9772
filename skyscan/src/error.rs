use common::ShapeError;
use thiserror::Error;

/// Errors reported by the stretch renderer and the point-source detector.
///
/// A detection run that finds nothing is not an error; it returns an empty
/// catalog with absent roundness means.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Caller-supplied parameters are out of range or out of order.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The stretch window collapsed to a single value (flat or constant image).
    #[error("degenerate image: stretch window collapsed to {value}")]
    DegenerateImage { value: f64 },

    /// Input is not a non-empty 2-D array.
    #[error("invalid shape: {0}")]
    InvalidShape(String),
}

impl From<ShapeError> for Error {
    fn from(err: ShapeError) -> Self {
        Error::InvalidShape(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
