//! Error taxonomy for a push run.
//!
//! Every failure is terminal: the binary prints the message and exits with 1.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PushError>;

#[derive(Debug, Error)]
pub enum PushError {
    // Usage / validation
    #[error("missing required parameter: --payload")]
    MissingPayload,

    #[error("do not mix --destination/--type with --queue/--topic")]
    MixedDestinationModes,

    #[error("unified mode requires both --destination and --type")]
    IncompleteUnifiedDestination,

    #[error("--type must be 'queue' or 'topic' (got '{0}')")]
    InvalidDestinationType(String),

    #[error("provide --queue or --topic (only one)")]
    MissingDestination,

    #[error("use only one destination: --queue or --topic")]
    MultipleDestinations,

    // Configuration
    #[error("environment variable SB_CONNECTION_STRING (or SB_ENDPOINT) not found; set it in .env")]
    MissingConnectionString,

    // Filesystem
    #[error("failed to resolve path {path}: {source}")]
    PathResolution {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("path is not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("failed to read file: {}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // Content
    #[error("content is not valid JSON: {}", .path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to compact JSON: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to parse JSON body: {0}")]
    BodyParse(#[source] serde_json::Error),

    // Broker
    #[error("failed to create broker client: {0:#}")]
    Client(anyhow::Error),

    #[error("failed to create sender: {0:#}")]
    Sender(anyhow::Error),

    #[error("failed to send message: {0:#}")]
    Send(anyhow::Error),
}

impl PushError {
    /// True for failures raised by the broker rather than by local checks.
    pub fn is_broker(&self) -> bool {
        matches!(
            self,
            PushError::Client(_) | PushError::Sender(_) | PushError::Send(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broker_errors_carry_context_chain() {
        let err = PushError::Send(anyhow::anyhow!("connection reset").context("publish failed"));
        assert_eq!(
            err.to_string(),
            "failed to send message: publish failed: connection reset"
        );
        assert!(err.is_broker());
    }

    #[test]
    fn test_file_errors_show_path() {
        let err = PushError::FileNotFound(PathBuf::from("/tmp/missing.json"));
        assert_eq!(err.to_string(), "file not found: /tmp/missing.json");
        assert!(!err.is_broker());
    }
}
