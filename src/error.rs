//! Centralized error types for mailsort.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the mailsort library.
#[derive(Error, Debug)]
pub enum SorterError {
    /// The mail server could not be reached.
    #[error("Cannot connect to '{host}': {reason}")]
    Connect { host: String, reason: String },

    /// The server rejected the configured credentials.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// An IMAP command failed after the session was established.
    #[error("Mailbox protocol error: {0}")]
    Protocol(String),

    /// TLS setup failed before any bytes were exchanged.
    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    /// A fetched message could not be parsed.
    #[error("Cannot parse message {id}: {reason}")]
    Parse { id: String, reason: String },

    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The configuration file is not valid TOML for [`crate::config::Config`].
    #[error("Cannot parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Something escaped the poll cycle boundary; the daemon must stop.
    #[error("Fatal error: {0}")]
    Fatal(String),
}

/// Convenience alias for `Result<T, SorterError>`.
pub type Result<T> = std::result::Result<T, SorterError>;

impl SorterError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// `true` for connection, authentication and protocol failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::Auth(_) | Self::Protocol(_) | Self::Tls(_)
        )
    }

    /// Render the error together with every `source()` below it.
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            // thiserror variants often embed their source in the message already
            if !out.contains(&text) {
                out.push_str(": ");
                out.push_str(&text);
            }
            source = cause.source();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        let connect = SorterError::Connect {
            host: "imap.example.com".into(),
            reason: "refused".into(),
        };
        assert!(connect.is_transport());
        assert!(SorterError::Auth("bad password".into()).is_transport());
        assert!(SorterError::Protocol("NO".into()).is_transport());

        let io = SorterError::io("x", std::io::Error::other("disk full"));
        assert!(!io.is_transport());
        assert!(!SorterError::Fatal("boom".into()).is_transport());
    }

    #[test]
    fn test_io_display_includes_path() {
        let err = SorterError::io(
            "attachments/Финансы/report.pdf",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let text = err.to_string();
        assert!(text.contains("attachments/Финансы/report.pdf"));
        assert!(text.contains("denied"));
    }

    #[test]
    fn test_chain_does_not_repeat_source() {
        let err = SorterError::io("a.txt", std::io::Error::other("disk full"));
        assert_eq!(err.chain(), "I/O error on 'a.txt': disk full");
    }
}
