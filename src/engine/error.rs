use thiserror::Error;

/// Errors produced by the analysis engine.
///
/// Malformed *odds* never surface here — the value comparator treats any
/// quote it cannot read as absent so partial market data does not abort an
/// analysis. A non-positive expected-goals input, by contrast, is a data
/// error and fails the whole request.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
