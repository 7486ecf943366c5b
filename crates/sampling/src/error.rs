use thiserror::Error;

/// Errors raised while running a sampling pipeline.
///
/// Every variant aborts the call that produced it. The pipeline never
/// downgrades or retries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    #[error("temperature must be between 0 and 2, got {0}")]
    InvalidTemperature(f64),

    #[error("k must be positive, got {0}")]
    InvalidTopK(i64),

    #[error("top-p must be between 0 and 1 (exclusive), got {0}")]
    InvalidTopP(f64),

    #[error("min-p must be between 0 and 1 (exclusive), got {0}")]
    InvalidMinP(f64),

    #[error("no valid tokens found")]
    NoValidTokens,

    #[error("weighted sampler failed: {0}")]
    SelectionFailed(String),
}

pub type Result<T> = std::result::Result<T, SampleError>;
