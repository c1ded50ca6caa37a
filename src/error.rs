//! Error types.
//!
//! `FetchError` is what a single provider/page request can fail with and is
//! what the retry policy inspects. `Failure` is its clonable summary, kept in
//! resolver results and crawl records. `Error` covers the orchestration layer
//! (files, config, client setup).

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// One outbound request failed.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("network error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// The server answered 200 but reports that it could not run the query
    /// (Overpass `remark`: timeout, out of memory).
    #[error("server could not answer {url}: {remark}")]
    Remote { url: String, remark: String },
}

impl FetchError {
    pub fn decode(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Decode { url: url.into(), reason: reason.to_string() }
    }

    /// Worth another attempt: timeouts, connection trouble, 408/429/5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Transport { .. } | Self::Remote { .. } => true,
            Self::Status { status, .. } => matches!(status, 408 | 429 | 500..=599),
            Self::Decode { .. } => false,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Status { .. } => FailureKind::Status,
            Self::Transport { .. } => FailureKind::Network,
            Self::Decode { .. } => FailureKind::Decode,
            Self::Remote { .. } => FailureKind::Remote,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Status,
    Network,
    Decode,
    /// Answered, but the server gave up on the query.
    Remote,
    /// Not fetched: robots.txt shuts the crawler out.
    Blocked,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Status => "http status",
            FailureKind::Network => "network",
            FailureKind::Decode => "decode",
            FailureKind::Remote => "server gave up",
            FailureKind::Blocked => "robots.txt",
        })
    }
}

/// Clonable record of a failed lookup.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn blocked(url: &str) -> Self {
        Self { kind: FailureKind::Blocked, message: format!("{url} disallowed by robots.txt") }
    }
}

impl From<&FetchError> for Failure {
    fn from(e: &FetchError) -> Self {
        Self { kind: e.kind(), message: e.to_string() }
    }
}

impl From<FetchError> for Failure {
    fn from(e: FetchError) -> Self {
        Failure::from(&e)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

/// Crate-level error for everything around the network calls.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_split_into_transient_and_permanent() {
        let s = |status| FetchError::Status { status, url: s!("http://x") };
        assert!(s(503).is_transient());
        assert!(s(429).is_transient());
        assert!(s(408).is_transient());
        assert!(!s(404).is_transient());
        assert!(!s(400).is_transient());
    }

    #[test]
    fn decode_errors_are_not_retried() {
        let e = FetchError::decode("http://x", "expected array");
        assert!(!e.is_transient());
        assert_eq!(e.kind(), FailureKind::Decode);
        assert!(e.to_string().contains("expected array"));
    }

    #[test]
    fn server_side_give_up_is_retried() {
        let e = FetchError::Remote { url: s!("http://x"), remark: s!("runtime error: Query timed out") };
        assert!(e.is_transient());
        assert_eq!(e.kind(), FailureKind::Remote);
    }

    #[test]
    fn failure_keeps_kind_and_message() {
        let e = FetchError::Timeout { url: s!("http://slow") };
        let f = Failure::from(&e);
        assert_eq!(f.kind, FailureKind::Timeout);
        assert!(f.message.contains("http://slow"));
        assert!(f.to_string().ends_with("(timeout)"));
    }

    #[test]
    fn io_error_mentions_path() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::io("/tmp/cache.json", io);
        assert!(err.to_string().contains("/tmp/cache.json"));
    }
}
