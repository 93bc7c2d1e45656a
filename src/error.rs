use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for operations that may fail with [`SketchError`].
pub type SketchResult<T> = std::result::Result<T, SketchError>;

/// Error types that can occur while turning an image into a sketch path.
///
/// A raster without any ink is not an error: it traces to an empty path.
#[derive(Debug, Error)]
pub enum SketchError {
    /// The input could not be read, decoded, or has a zero dimension.
    #[error("Invalid image: {reason}")]
    InvalidImage { reason: String },
    /// A numeric parameter or a mask shape is out of range.
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    /// Persisting an output artefact failed.
    #[error("Failed to write {}: {source}", path.display())]
    IoWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SketchError {
    pub fn invalid_image(reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            reason: reason.into(),
        }
    }

    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Wrap an encoder failure for `path`, keeping the underlying I/O error when there is one.
    pub fn write_failed(path: &Path, err: image::ImageError) -> Self {
        let source = match err {
            image::ImageError::IoError(io_err) => io_err,
            other => io::Error::other(other),
        };
        Self::IoWrite {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Reject zero or negative values for a named parameter.
pub(crate) fn ensure_positive<T>(name: &'static str, value: T) -> SketchResult<T>
where
    T: PartialOrd + Default + Copy + std::fmt::Display,
{
    if value > T::default() {
        Ok(value)
    } else {
        Err(SketchError::invalid_parameter(
            name,
            format!("must be positive, got {value}"),
        ))
    }
}
