use thiserror::Error;

/// Errors raised at the boundaries of the analysis core: stream decoding,
/// the recording store and settings validation.
///
/// Analytical functions never return these; insufficient data is expressed
/// through `Option`, empty vectors or zero scores instead.
#[derive(Debug, Error)]
pub enum LabError {
    #[error("malformed sample batch: {0}")]
    MalformedBatch(String),
    #[error("binary frame length {0} is not a multiple of {1} bytes")]
    FrameLength(usize, usize),
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("recording store failure: {0}")]
    Store(String),
    #[error("invalid settings: {0}")]
    Settings(String),
}

pub type LabResult<T> = Result<T, LabError>;
