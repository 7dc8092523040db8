//! Error types for the Sesame client

use thiserror::Error;

/// Errors that can occur when talking to a Sesame server
///
/// A namespace or repository that does not exist is not an error; lookups
/// return `Option` for that case.
#[derive(Error, Debug)]
pub enum SesameError {
    /// Delete-safety gate refused an unqualified delete. Raised before any
    /// request is sent.
    #[error(
        "refusing to delete every statement in the repository: \
         give a subj/pred/obj qualifier or disable the safety check"
    )]
    UnsafeDelete,

    /// The server answered with a status other than the operation's success code
    #[error("Protocol error: HTTP {status} ({reason}): {body}")]
    Protocol {
        /// HTTP status code
        status: u16,
        /// Reason phrase, empty if the status has none
        reason: String,
        /// Raw response body
        body: String,
    },

    /// A success response whose body could not be interpreted
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Unknown result or data format name
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    /// A known format that the operation cannot produce or accept
    #[error("Format {format} is not supported by {operation}")]
    UnsupportedFormat {
        /// Format name
        format: String,
        /// Operation that refused it
        operation: &'static str,
    },

    /// Client configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Form encoding error
    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_urlencoded::ser::Error),

    /// YAML configuration error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SesameError {
    /// HTTP status carried by a protocol error
    pub fn status(&self) -> Option<u16> {
        match self {
            SesameError::Protocol { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error was raised locally, before any network call
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            SesameError::UnsafeDelete
                | SesameError::UnknownFormat(_)
                | SesameError::UnsupportedFormat { .. }
                | SesameError::Config(_)
        )
    }
}

pub type SesameResult<T> = Result<T, SesameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let err = SesameError::Protocol {
            status: 400,
            reason: "Bad Request".to_string(),
            body: "MALFORMED QUERY".to_string(),
        };
        assert_eq!(err.status(), Some(400));
        assert!(!err.is_local());
        assert_eq!(
            err.to_string(),
            "Protocol error: HTTP 400 (Bad Request): MALFORMED QUERY"
        );
    }

    #[test]
    fn test_unsafe_delete_is_local() {
        assert!(SesameError::UnsafeDelete.is_local());
        assert_eq!(SesameError::UnsafeDelete.status(), None);
    }
}
