//! Error types for the auction server manager
//!
//! Only configuration-load failures are meant to cross the manager's
//! boundary. Resolution misses are modelled as `None`, never as errors.

use thiserror::Error;

/// Result type alias for auction manager operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the auction server manager
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid manager settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// A configuration node could not be turned into a registered server
    ///
    /// Fatal to the load call that produced it; the caller decides
    /// whether to abort the rest of its configuration processing.
    #[error("Failed to parse <{tag}>: {message}")]
    ConfigParse {
        /// Tag of the offending node
        tag: String,
        /// Human-readable cause
        message: String,
    },

    /// No factory is registered under this server name
    #[error("No server factory registered for '{0}'")]
    UnknownServer(String),

    /// A factory was found but failed to build its server
    #[error("Failed to construct server '{server}': {message}")]
    Construction {
        /// Server name
        server: String,
        /// Error message
        message: String,
    },

    /// A server rejected its own configuration sub-tree
    #[error("Server '{server}' could not parse its configuration: {message}")]
    ServerParse {
        /// Server name
        server: String,
        /// Error message
        message: String,
    },

    /// Malformed URL handed to URL-based resolution
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Server-specific runtime error (e.g. a failed time refresh)
    #[error("Server error ({provider}): {message}")]
    Provider {
        /// Server name
        provider: String,
        /// Error message
        message: String,
    },

    /// Listener registration on a bus that has been shut down
    #[error("Message bus is shut down; cannot subscribe to topic '{0}'")]
    BusClosed(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a structured configuration parse failure
    pub fn config_parse(tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigParse {
            tag: tag.into(),
            message: message.into(),
        }
    }

    /// Create a construction error
    pub fn construction(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Construction {
            server: server.into(),
            message: message.into(),
        }
    }

    /// Create a per-server parse error
    pub fn server_parse(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ServerParse {
            server: server.into(),
            message: message.into(),
        }
    }

    /// Create a server-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parse_names_tag_and_cause() {
        let err = Error::config_parse("server", "No server factory registered for 'ebay'");
        assert_eq!(
            err.to_string(),
            "Failed to parse <server>: No server factory registered for 'ebay'"
        );
    }

    #[test]
    fn url_errors_convert() {
        let err: Error = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
