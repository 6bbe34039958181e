use thiserror::Error;

/// Error type for sampling post-processing operations.
///
/// All errors are fatal and surface to the caller immediately; there is no
/// retry or partial-result recovery anywhere in this crate.
#[derive(Error, Debug)]
pub enum SamplingError {
    #[error("format error: {0}")]
    Format(String),

    #[error("shape mismatch in {context}: expected {expected} elements, got {actual}")]
    ShapeMismatch {
        expected: usize,
        actual: usize,
        context: String,
    },

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("variable not found: {0}")]
    MissingVariable(String),

    #[error("group not found: {0}")]
    MissingGroup(String),

    #[error("NetCDF error: {0}")]
    Netcdf(#[from] netcdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
