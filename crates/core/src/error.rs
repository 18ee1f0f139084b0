//! Error types for docview.

use alloc::string::String;
use core::fmt;
use thiserror::Error;

/// Result type alias for docview operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Coarse error classification, stable across message changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown or deleted view.
    NotFound,
    /// The view has no map function.
    MapUndefined,
    /// Persisted view state is inconsistent.
    CorruptState,
    /// Underlying store or transaction failure.
    Storage,
    /// Reduce requested on a view without a reduce function.
    ReduceUnavailable,
    /// Invalid query option combination.
    BadRequest,
    /// Key or value could not be encoded or decoded.
    Codec,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::MapUndefined => "map_undefined",
            ErrorKind::CorruptState => "corrupt_state",
            ErrorKind::Storage => "storage",
            ErrorKind::ReduceUnavailable => "reduce_unavailable",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Codec => "codec",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error types for view maintenance and querying.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The view has no persisted identity (never created, or deleted).
    #[error("View not found: {name}")]
    NotFound { name: String },
    /// No map function is configured for the view.
    #[error("View {view} has no map function")]
    MapUndefined { view: String },
    /// The view's persisted metadata is inconsistent.
    #[error("Corrupt state in view {view}: {message}")]
    CorruptState { view: String, message: String },
    /// The ordered store or its transaction failed.
    #[error("Storage error: {message}")]
    Storage { message: String },
    /// A reduce was requested but the view defines no reduce function.
    #[error("View {view} has no reduce function")]
    ReduceUnavailable { view: String },
    /// The query options are invalid or contradictory.
    #[error("Bad request: {message}")]
    BadRequest { message: String },
    /// A key or value could not be encoded or decoded.
    #[error("Codec error: {message}")]
    Codec { message: String },
}

impl Error {
    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::MapUndefined { .. } => ErrorKind::MapUndefined,
            Error::CorruptState { .. } => ErrorKind::CorruptState,
            Error::Storage { .. } => ErrorKind::Storage,
            Error::ReduceUnavailable { .. } => ErrorKind::ReduceUnavailable,
            Error::BadRequest { .. } => ErrorKind::BadRequest,
            Error::Codec { .. } => ErrorKind::Codec,
        }
    }

    /// Creates a not found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Error::NotFound { name: name.into() }
    }

    /// Creates a map undefined error.
    pub fn map_undefined(view: impl Into<String>) -> Self {
        Error::MapUndefined { view: view.into() }
    }

    /// Creates a corrupt state error.
    pub fn corrupt_state(view: impl Into<String>, message: impl Into<String>) -> Self {
        Error::CorruptState {
            view: view.into(),
            message: message.into(),
        }
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Error::Storage {
            message: message.into(),
        }
    }

    /// Creates a reduce unavailable error.
    pub fn reduce_unavailable(view: impl Into<String>) -> Self {
        Error::ReduceUnavailable { view: view.into() }
    }

    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest {
            message: message.into(),
        }
    }

    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Error::Codec {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        use alloc::format;
        Error::codec(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("by_name");
        assert!(err.to_string().contains("by_name"));

        let err = Error::corrupt_state("by_name", "last sequence is negative");
        assert!(err.to_string().contains("Corrupt state"));
        assert!(err.to_string().contains("negative"));

        let err = Error::storage("quota exceeded");
        assert_eq!(err.to_string(), "Storage error: quota exceeded");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(Error::map_undefined("v").kind(), ErrorKind::MapUndefined);
        assert_eq!(Error::reduce_unavailable("v").kind(), ErrorKind::ReduceUnavailable);
        assert_eq!(Error::bad_request("x").kind(), ErrorKind::BadRequest);
        assert_eq!(Error::codec("x").kind(), ErrorKind::Codec);
        assert_eq!(ErrorKind::ReduceUnavailable.as_str(), "reduce_unavailable");
        assert_eq!(ErrorKind::Storage.to_string(), "storage");
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.kind(), ErrorKind::Codec);
        assert!(err.to_string().contains("JSON error"));
    }
}
