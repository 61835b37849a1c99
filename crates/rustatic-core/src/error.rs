//! Error types for the serving pipeline.
//!
//! Defines [`ServeError`], a domain-specific error enum with one variant per
//! failure class the pipeline can produce. Every variant is resolved locally
//! into an HTTP status or a silent close by the HTTP layer; none escape as
//! unhandled faults.

/// Serving pipeline error type.
///
/// The first four variants are business-level outcomes answered with a
/// status code (or passed upstream, depending on the pass-on-fail policy).
/// The remaining variants surface I/O and internal faults.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    // -----------------------------------------------------------------------
    // Request validation
    // -----------------------------------------------------------------------
    /// The raw request path was rejected by the sanitizer before any I/O.
    #[error("unsafe request path: {path}")]
    UnsafePath {
        /// The raw path as received.
        path: String,
    },

    /// The request used a method other than GET or HEAD.
    #[error("method not served: {method}")]
    MethodNotServed {
        /// The offending method.
        method: String,
    },

    // -----------------------------------------------------------------------
    // Resource outcomes
    // -----------------------------------------------------------------------
    /// The resolved resource does not exist.
    #[error("resource not found: {path}")]
    Absent {
        /// External form of the resource location.
        path: String,
    },

    /// The resolved resource exists but is not a regular file (a directory
    /// or an archive namespace).
    #[error("resource is not a regular file: {path}")]
    NotAFile {
        /// External form of the resource location.
        path: String,
    },

    // -----------------------------------------------------------------------
    // Transfer / internal faults
    // -----------------------------------------------------------------------
    /// A handle was requested on a resource that cannot produce one.
    /// Callers must check `exists` and `is_file` first.
    #[error("illegal state: {message}")]
    IllegalState {
        /// What went wrong.
        message: String,
    },

    /// Native I/O error while opening or streaming a resource body.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServeError {
    /// Whether this error means the backing file vanished between the
    /// existence probe and the open, which degrades to a not-found answer
    /// rather than a server fault.
    #[must_use]
    pub fn is_vanished(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Convenience result type for serving operations.
pub type ServeResult<T> = Result<T, ServeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_detect_vanished_file() {
        let err = ServeError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        assert!(err.is_vanished());
    }

    #[test]
    fn test_should_not_treat_other_io_errors_as_vanished() {
        let err = ServeError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(!err.is_vanished());
    }

    #[test]
    fn test_should_not_treat_business_errors_as_vanished() {
        let err = ServeError::Absent {
            path: "file:/tmp/x".to_owned(),
        };
        assert!(!err.is_vanished());
    }
}
