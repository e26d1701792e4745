//! Error types for easelkit
//!
//! The drawing API itself never fails: backend limitations are emulated and
//! contract violations degrade to warned no-ops. Errors are reserved for the
//! places where a real resource can be invalid:
//! - Surface construction (zero-sized or oversized pixmaps)
//! - Pixel encode/decode round trips used by tools and tests
//!
//! All errors use the `thiserror` crate for minimal boilerplate and proper
//! error trait implementations.

use thiserror::Error;

/// Result type alias for easelkit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for easelkit
///
/// # Examples
///
/// ```
/// use easelkit::{Error, error::PixmapError};
///
/// let err = Error::Pixmap(PixmapError::InvalidSize { width: 0, height: 64 });
/// assert!(format!("{}", err).contains("0x64"));
/// ```
#[derive(Error, Debug)]
pub enum Error {
  /// Pixmap allocation or pixel access error
  #[error("Pixmap error: {0}")]
  Pixmap(#[from] PixmapError),

  /// I/O error (file reading/writing in tools)
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  /// Generic error for miscellaneous issues
  #[error("{0}")]
  Other(String),
}

/// Errors that occur creating or converting pixmaps
#[derive(Error, Debug, Clone)]
pub enum PixmapError {
  /// Requested dimensions cannot back a pixel buffer
  #[error("Invalid pixmap size: {width}x{height}")]
  InvalidSize { width: u32, height: u32 },

  /// PNG decoding failed
  #[error("Failed to decode PNG: {reason}")]
  DecodeFailed { reason: String },

  /// PNG encoding failed
  #[error("Failed to encode PNG: {reason}")]
  EncodeFailed { reason: String },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_pixmap_error_invalid_size() {
    let error = PixmapError::InvalidSize {
      width: 0,
      height: 100,
    };
    assert!(format!("{}", error).contains("0x100"));
  }

  #[test]
  fn test_error_from_pixmap_error() {
    let error: Error = PixmapError::DecodeFailed {
      reason: "truncated".to_string(),
    }
    .into();
    assert!(matches!(error, Error::Pixmap(_)));
  }

  #[test]
  fn test_error_trait_implemented() {
    let error = Error::Other("test".to_string());
    let _: &dyn std::error::Error = &error;
  }
}
