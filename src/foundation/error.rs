/// Convenience result type used across Umbra.
pub type UmbraResult<T> = Result<T, UmbraError>;

/// Top-level error taxonomy used by Umbra APIs.
///
/// Variants follow the stages of a recompute pass. A pass that returns any of these commits
/// nothing to the host scene.
#[derive(thiserror::Error, Debug)]
pub enum UmbraError {
    /// Input model or option validation failure.
    #[error("validation error: {0}")]
    Validation(String),

    /// Boolean path algebra or invalid geometry failure.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Missing or malformed shadow worker response.
    #[error("worker error: {0}")]
    Worker(String),

    /// Persistence store read/write failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Host scene boundary failure.
    #[error("host error: {0}")]
    Host(String),

    /// Serialization/deserialization failure.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl UmbraError {
    /// Build [`UmbraError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build [`UmbraError::Geometry`].
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build [`UmbraError::Worker`].
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }

    /// Build [`UmbraError::Storage`].
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Build [`UmbraError::Host`].
    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }

    /// Build [`UmbraError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for UmbraError {
    fn from(err: serde_json::Error) -> Self {
        Self::serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
