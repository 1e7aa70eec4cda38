use thiserror::Error;

#[derive(Error, Debug)]
pub enum TethysError {
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Parameter out of range: {0}")]
    ParameterOutOfRange(String),

    #[error("Interpolation failure: {0}")]
    InterpolationFailure(String),
}
