//! Error handling and custom error types
//!
//! Provides unified error handling across the crate using thiserror.

use std::fmt;
use thiserror::Error;

/// Coarse transport failure category, shown to the user verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkCategory {
    NoConnection,
    TimedOut,
    HostNotFound,
    Generic,
}

impl NetworkCategory {
    /// Classify a reqwest transport error.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::TimedOut;
        }
        if err.is_connect() {
            if source_chain_mentions_dns(err) {
                return Self::HostNotFound;
            }
            return Self::NoConnection;
        }
        Self::Generic
    }
}

impl fmt::Display for NetworkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoConnection => "No internet connection",
            Self::TimedOut => "The request timed out",
            Self::HostNotFound => "The server could not be found",
            Self::Generic => "Something went wrong",
        };
        f.write_str(text)
    }
}

// hyper-util reports resolver failures as "dns error" somewhere in the chain.
fn source_chain_mentions_dns(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        let text = e.to_string().to_lowercase();
        if text.contains("dns error") || text.contains("failed to lookup address") {
            return true;
        }
        current = e.source();
    }
    false
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{category}: {message}")]
    Network {
        category: NetworkCategory,
        message: String,
    },

    #[error("Decoding error: {0}")]
    Decoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("An active subscription is required to interpret dreams")]
    NotEntitled,

    #[error("An interpretation is already in progress")]
    Busy,

    #[error("Interpretation cancelled")]
    Cancelled,
}

impl Error {
    pub fn network(category: NetworkCategory, message: impl Into<String>) -> Self {
        Self::Network {
            category,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decoding(err.to_string());
        }
        Self::network(NetworkCategory::from_reqwest(&err), err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_display_leads_with_category() {
        let err = Error::network(NetworkCategory::TimedOut, "after 60s");
        assert_eq!(err.to_string(), "The request timed out: after 60s");
    }

    #[test]
    fn test_dns_detection_walks_source_chain() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "dns error: no record");
        assert!(source_chain_mentions_dns(&inner));

        let other = std::io::Error::new(std::io::ErrorKind::Other, "connection refused");
        assert!(!source_chain_mentions_dns(&other));
    }

    #[tokio::test]
    async fn test_refused_connection_is_no_connection() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = reqwest::Client::new()
            .get(format!("http://127.0.0.1:{}/", port))
            .send()
            .await
            .unwrap_err();
        assert_eq!(NetworkCategory::from_reqwest(&err), NetworkCategory::NoConnection);
        assert!(matches!(Error::from(err), Error::Network { .. }));
    }

    #[tokio::test]
    async fn test_unknown_host_is_host_not_found() {
        // `.invalid` never resolves.
        let err = reqwest::Client::new()
            .get("http://no-such-host.invalid/")
            .send()
            .await
            .unwrap_err();
        assert_eq!(NetworkCategory::from_reqwest(&err), NetworkCategory::HostNotFound);
        assert!(matches!(
            Error::from(err),
            Error::Network {
                category: NetworkCategory::HostNotFound,
                ..
            }
        ));
    }
}
