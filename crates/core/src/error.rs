//! Error types for zs-core
//!
//! Every failure the adapter can report is a variant of [`Error`]. The host
//! decides what to retry by looking at the variant (see [`crate::retry`]).

use thiserror::Error;

/// Result type alias for zs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the storage adapter
#[derive(Debug, Error)]
pub enum Error {
    /// The query string failed syntactic validation
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Missing credential or unusable address
    #[error("Configuration error: {0}")]
    Config(String),

    /// File is not listed in the record
    #[error("Not found: {0}")]
    NotFound(String),

    /// Remote service answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// Transport level failure
    #[error("Network error: {0}")]
    Network(String),

    /// Listing entry uses a digest other than md5
    #[error("Unsupported checksum (only md5 is supported): {0}")]
    UnsupportedChecksum(String),

    /// Downloaded content does not match the declared checksum
    #[error("File checksums do not match for remote file: {0}")]
    ChecksumMismatch(String),

    /// Restricted access handshake did not yield a session
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Operation the remote service cannot perform
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Record metadata carries no file listing
    #[error(
        "No files found in record {0}. Either the record is empty or access is restricted. \
         Please check in your browser."
    )]
    NoFiles(String),

    /// Response body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for a remote 404 or a file missing from a registry
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::Http { status: 404, .. })
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidQuery(_) => 2,
            Error::Network(_) => 3,
            Error::Http { status, .. } if *status == 404 => 5,
            Error::Http { status, .. } if *status >= 500 || *status == 429 => 3,
            Error::Http { status, .. } if *status == 401 || *status == 403 => 4,
            Error::Auth(_) => 4,
            Error::NotFound(_) | Error::NoFiles(_) => 5,
            Error::UnsupportedOperation(_) | Error::UnsupportedChecksum(_) => 7,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        assert!(Error::NotFound("data.csv".into()).is_not_found());
        assert!(
            Error::Http {
                status: 404,
                url: "https://zenodo.org/api/records/0".into()
            }
            .is_not_found()
        );
        assert!(
            !Error::Http {
                status: 500,
                url: "https://zenodo.org/api/records/0".into()
            }
            .is_not_found()
        );
        assert!(!Error::Auth("denied".into()).is_not_found());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::InvalidQuery("bad".into()).exit_code(), 2);
        assert_eq!(Error::Network("reset".into()).exit_code(), 3);
        assert_eq!(Error::NotFound("x".into()).exit_code(), 5);
        assert_eq!(
            Error::UnsupportedOperation("remove".into()).exit_code(),
            7
        );
        assert_eq!(Error::ChecksumMismatch("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_checksum_mismatch_names_file() {
        let err = Error::ChecksumMismatch("data.csv".into());
        assert!(err.to_string().contains("data.csv"));
    }
}
