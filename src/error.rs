use std::fmt::{self, Display, Formatter};

use thiserror::Error;

/// Maximum number of bytes kept by `LastError`.
pub const MAX_LAST_ERROR_LENGTH: usize = 1024;

/// Everything that can go wrong while loading the GL library or creating a context.
///
/// A modern context silently degrading to a legacy one is *not* an error, see
/// `Degradation` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// None of the candidate library names could be opened.
    #[error("failed loading OpenGL library, tried: {}", .candidates.join(", "))]
    LibraryNotFound {
        candidates: Vec<String>,
    },

    /// The library opened but a required bootstrap symbol is not exported from it.
    ///
    /// The library handle has already been released when this is returned.
    #[error("failed resolving '{symbol}' from OpenGL library '{library}'")]
    SymbolMissing {
        library: String,
        symbol: String,
    },

    /// No usable device context: the window handle was null or the platform refused to hand
    /// out a device context for it.
    #[error("no device context available for the requested surface")]
    DeviceContextUnavailable,

    /// The platform rejected every pixel format we tried.
    #[error("failed negotiating pixel format: {0}")]
    PixelFormatNegotiationFailed(String),

    /// The mandatory first-stage context could not be created or activated.
    #[error("failed creating legacy OpenGL rendering context: {0}")]
    LegacyContextCreationFailed(String),

    /// The caller asked for something that doesn't make sense, e.g. a profile without a version.
    #[error("invalid context creation request: {0}")]
    InvalidRequest(String),

    /// Dynamic OpenGL loading isn't implemented for the target platform.
    #[error("dynamic OpenGL loading is not supported on this platform")]
    UnsupportedPlatform,
}

/// Fixed-capacity buffer holding the most recent diagnostic message.
///
/// Overwritten on every failure, never cleared by successful calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LastError {
    message: String,
}

impl LastError {
    pub fn new() -> LastError {
        LastError {
            message: String::with_capacity(MAX_LAST_ERROR_LENGTH),
        }
    }

    /// Replaces the stored message, truncating it to `MAX_LAST_ERROR_LENGTH` bytes.
    pub fn set<M: Display>(&mut self, message: M) {
        use std::fmt::Write;

        self.message.clear();
        let _ = write!(self.message, "{}", message);

        if self.message.len() > MAX_LAST_ERROR_LENGTH {
            let mut end = MAX_LAST_ERROR_LENGTH;
            while !self.message.is_char_boundary(end) {
                end -= 1;
            }
            self.message.truncate(end);
        }
    }

    pub fn as_str(&self) -> &str {
        &self.message
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_empty()
    }
}

impl Display for LastError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_error_overwrites() {
        let mut last_error = LastError::new();
        assert!(last_error.is_empty());

        last_error.set(Error::DeviceContextUnavailable);
        assert_eq!("no device context available for the requested surface", last_error.as_str());

        last_error.set(Error::UnsupportedPlatform);
        assert_eq!(
            "dynamic OpenGL loading is not supported on this platform",
            last_error.as_str());
    }

    #[test]
    fn last_error_truncates_on_char_boundary() {
        let mut last_error = LastError::new();

        // Three-byte characters don't line up with the capacity.
        let message: String = ::std::iter::repeat('\u{20AC}').take(MAX_LAST_ERROR_LENGTH).collect();
        last_error.set(&message);

        assert!(last_error.as_str().len() <= MAX_LAST_ERROR_LENGTH);
        assert!(last_error.as_str().len() > MAX_LAST_ERROR_LENGTH - 3);
        assert!(last_error.as_str().chars().all(|c| c == '\u{20AC}'));
    }

    #[test]
    fn library_not_found_lists_candidates() {
        let error = Error::LibraryNotFound {
            candidates: vec!["libGL.so.1".into(), "libGL.so".into()],
        };
        assert_eq!(
            "failed loading OpenGL library, tried: libGL.so.1, libGL.so",
            error.to_string());
    }
}
