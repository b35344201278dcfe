//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Requested session or approval request does not exist.
    NotFound(String),
    /// A pending approval request already exists for the session.
    Conflict(String),
    /// Every required fetch source failed or timed out.
    InsufficientData(String),
    /// Resolution attempted against a request that is no longer pending.
    AlreadyResolved(String),
    /// A fetch source reported a failure for a single task.
    Source(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Conflict(msg) => write!(f, "conflict: {msg}"),
            Self::InsufficientData(msg) => write!(f, "insufficient data: {msg}"),
            Self::AlreadyResolved(msg) => write!(f, "already resolved: {msg}"),
            Self::Source(msg) => write!(f, "source: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
