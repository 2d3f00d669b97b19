/// Convenience result type used across kakijun.
pub type KakijunResult<T> = Result<T, KakijunError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum KakijunError {
    /// Caller-provided value is malformed (e.g. a glyph that is not exactly one code point).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No source tier produced the requested glyph within its time bound.
    #[error("not found: {0}")]
    NotFound(String),

    /// Vector source text could not be parsed as XML.
    #[error("parse failure: {0}")]
    Parse(String),

    /// The caller cancelled the operation before it completed.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Invalid graph definition or structure.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors raised by an executor while running an evaluation pass.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KakijunError {
    /// Build a [`KakijunError::InvalidInput`] value.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Build a [`KakijunError::NotFound`] value.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`KakijunError::Parse`] value.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Build a [`KakijunError::Cancelled`] value.
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Build a [`KakijunError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`KakijunError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
