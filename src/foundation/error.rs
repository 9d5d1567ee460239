/// Convenience result type used across the try-on engine.
pub type TryOnResult<T> = Result<T, TryOnError>;

/// Top-level error taxonomy used by engine, store and view APIs.
#[derive(thiserror::Error, Debug)]
pub enum TryOnError {
    /// A required image was not supplied; nothing was drawn.
    #[error("missing input: {0}")]
    MissingInput(String),

    /// The capture device refused access or does not exist.
    #[error("camera access error: {0}")]
    CameraAccess(String),

    /// The overlay image could not be fetched or decoded.
    #[error("overlay load error: {0}")]
    OverlayLoad(String),

    /// The base (person) image could not be fetched or decoded.
    #[error("base image load error: {0}")]
    BaseLoad(String),

    /// Serializing the composited surface failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// Invalid user-provided or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Reading or writing the durable key-value store failed.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TryOnError {
    /// Build a [`TryOnError::MissingInput`] value.
    pub fn missing_input(msg: impl Into<String>) -> Self {
        Self::MissingInput(msg.into())
    }

    /// Build a [`TryOnError::CameraAccess`] value.
    pub fn camera_access(msg: impl Into<String>) -> Self {
        Self::CameraAccess(msg.into())
    }

    /// Build a [`TryOnError::OverlayLoad`] value.
    pub fn overlay_load(msg: impl Into<String>) -> Self {
        Self::OverlayLoad(msg.into())
    }

    /// Build a [`TryOnError::BaseLoad`] value.
    pub fn base_load(msg: impl Into<String>) -> Self {
        Self::BaseLoad(msg.into())
    }

    /// Build a [`TryOnError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`TryOnError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TryOnError::Persistence`] value.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Build a [`TryOnError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Re-label any decode/fetch failure as an overlay failure, keeping the message.
    pub(crate) fn into_overlay_load(self) -> Self {
        match self {
            Self::OverlayLoad(_) => self,
            other => Self::OverlayLoad(other.to_string()),
        }
    }

    /// Re-label any decode/fetch failure as a base-image failure, keeping the message.
    pub(crate) fn into_base_load(self) -> Self {
        match self {
            Self::BaseLoad(_) => self,
            other => Self::BaseLoad(other.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
