//! Error types for docpress.
//!
//! Library crates use [`DocpressError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Degraded parses (malformed frontmatter, a code fence that fails to
//! highlight) are deliberately not errors: the pipeline absorbs them with a
//! safe fallback and logs a warning instead.

use std::path::PathBuf;

/// Top-level error type for all docpress operations.
#[derive(Debug, thiserror::Error)]
pub enum DocpressError {
    /// Site configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A slug that does not resolve in the navigation index, or a page
    /// whose backing file cannot be read. Translates to a 404-equivalent
    /// at the request boundary.
    #[error("page not found: {slug:?}")]
    NotFound { slug: String },

    /// Filesystem I/O error outside the per-page request path.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Catalog integrity error (duplicate slug, ill-formed slug).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocpressError>;

impl DocpressError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a not-found error for a slug.
    pub fn not_found(slug: impl Into<String>) -> Self {
        Self::NotFound { slug: slug.into() }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error should translate to a 404-equivalent response.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = DocpressError::config("missing docpress.toml");
        assert_eq!(err.to_string(), "config error: missing docpress.toml");

        let err = DocpressError::validation("duplicate slug \"guide\"");
        assert!(err.to_string().contains("duplicate slug"));
    }

    #[test]
    fn not_found_quotes_empty_slug() {
        let err = DocpressError::not_found("");
        assert_eq!(err.to_string(), "page not found: \"\"");
        assert!(err.is_not_found());
        assert!(!DocpressError::config("x").is_not_found());
    }
}
