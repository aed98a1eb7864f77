//! Error taxonomy for page acquisition and extraction.

use crate::types::Strategy;

/// Stable machine-readable error kinds.
pub mod kinds {
    pub const LOAD_FAILED: &str = "load_failed";
    pub const TIMEOUT: &str = "timeout";
    pub const ENGINE_FAILURE: &str = "engine_failure";
    pub const HTTP_ERROR: &str = "http_error";
    pub const PARSE_ERROR: &str = "parse_error";
    pub const EXTRACTION_FAILED: &str = "extraction_failed";
}

/// All errors that can occur while acquiring a variant page.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    /// Navigation produced no response or a non-success status.
    #[error("page failed to load: {0}")]
    LoadFailed(String),

    /// Navigation or a single engine operation exceeded its bound.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The browser engine could not launch or crashed.
    #[error("browser engine failure: {0}")]
    EngineFailure(String),

    /// The plain HTTP request failed or returned a non-200 status.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The response body could not be turned into a document.
    #[error("could not parse response: {0}")]
    ParseError(String),

    /// Every strategy was tried; `source` is the last underlying cause.
    #[error("extraction failed on the {strategy} path: {source}")]
    ExtractionFailed {
        strategy: Strategy,
        source: Box<ExtractError>,
    },
}

impl ExtractError {
    pub fn kind(&self) -> &'static str {
        use kinds::*;
        match self {
            ExtractError::LoadFailed(_) => LOAD_FAILED,
            ExtractError::Timeout(_) => TIMEOUT,
            ExtractError::EngineFailure(_) => ENGINE_FAILURE,
            ExtractError::HttpError(_) => HTTP_ERROR,
            ExtractError::ParseError(_) => PARSE_ERROR,
            ExtractError::ExtractionFailed { .. } => EXTRACTION_FAILED,
        }
    }

    /// The innermost error, skipping `ExtractionFailed` wrappers.
    pub fn root_cause(&self) -> &ExtractError {
        match self {
            ExtractError::ExtractionFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Wrap a final-strategy failure for the caller.
    pub(crate) fn exhausted(strategy: Strategy, cause: ExtractError) -> Self {
        match cause {
            already @ ExtractError::ExtractionFailed { .. } => already,
            cause => ExtractError::ExtractionFailed {
                strategy,
                source: Box::new(cause),
            },
        }
    }
}

pub type ExtractResult<T> = Result<T, ExtractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinct() {
        let errors = [
            ExtractError::LoadFailed("x".into()),
            ExtractError::Timeout("x".into()),
            ExtractError::EngineFailure("x".into()),
            ExtractError::HttpError("x".into()),
            ExtractError::ParseError("x".into()),
            ExtractError::exhausted(Strategy::Light, ExtractError::HttpError("x".into())),
        ];
        let mut kinds: Vec<&str> = errors.iter().map(|e| e.kind()).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_exhausted_keeps_cause() {
        let err = ExtractError::exhausted(
            Strategy::Light,
            ExtractError::HttpError("status 404".into()),
        );
        assert_eq!(err.kind(), kinds::EXTRACTION_FAILED);
        assert_eq!(err.root_cause().kind(), kinds::HTTP_ERROR);
        assert!(err.to_string().contains("status 404"));
        assert!(err.to_string().contains("light"));
    }

    #[test]
    fn test_exhausted_does_not_double_wrap() {
        let inner = ExtractError::exhausted(Strategy::Light, ExtractError::ParseError("x".into()));
        let outer = ExtractError::exhausted(Strategy::Heavy, inner);
        match outer {
            ExtractError::ExtractionFailed { strategy, source } => {
                assert_eq!(strategy, Strategy::Light);
                assert_eq!(source.kind(), kinds::PARSE_ERROR);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
