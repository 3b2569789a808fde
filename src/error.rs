use crate::image::ImageFormat;
use crate::platform::BackendKind;

/// Errors raised by backend selection and clipboard operations
///
/// Absent clipboard content is never an error: getters return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Unsupported desktop environment: {}", .0.as_deref().unwrap_or("<unset>"))]
    UnsupportedDesktopEnvironment(Option<String>),

    #[error("Missing platform dependency for {backend} backend: {reason}")]
    MissingPlatformDependency { backend: BackendKind, reason: String },

    #[error("Unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    #[error("Invalid image type: expected {expected}, got {found}")]
    InvalidImageType {
        expected: ImageFormat,
        found: ImageFormat,
    },

    #[error("Invalid clipboard backend: {0}")]
    InvalidBackend(String),

    #[error("Invalid image data: {0}")]
    InvalidImageData(String),

    #[error("Image codec error: {0}")]
    Image(#[from] ::image::ImageError),

    #[error("{backend} clipboard call failed: {message}")]
    Native {
        backend: BackendKind,
        message: String,
    },
}

impl ClipboardError {
    /// Wrap a failure reported by a native clipboard API
    pub fn native(backend: BackendKind, err: impl std::fmt::Display) -> Self {
        ClipboardError::Native {
            backend,
            message: err.to_string(),
        }
    }

    /// Binding for `backend` could not be loaded or initialized
    pub fn missing(backend: BackendKind, reason: impl Into<String>) -> Self {
        ClipboardError::MissingPlatformDependency {
            backend,
            reason: reason.into(),
        }
    }

    /// True for errors raised while choosing or starting a backend
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ClipboardError::UnsupportedPlatform(_)
                | ClipboardError::UnsupportedDesktopEnvironment(_)
                | ClipboardError::MissingPlatformDependency { .. }
                | ClipboardError::InvalidBackend(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ClipboardError>;
