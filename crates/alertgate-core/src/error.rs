//! Error types for AlertGate

use thiserror::Error;

/// Result type alias using AlertGate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for AlertGate operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid construction input
    #[error("Configuration error: {0}")]
    Config(String),

    /// Readiness probe failed or no alert target was discovered in time
    #[error("Remote Alertmanager not ready: {0}")]
    NotReady(String),

    /// Non-success HTTP status from the remote Alertmanager
    #[error("{operation}: unexpected status code {status}")]
    Backend {
        /// What was being done
        operation: String,
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// Resource does not exist remotely
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of resource
        entity: String,
        /// Identifier that was looked up
        id: String,
    },

    /// Marshal/unmarshal failure
    #[error("Serialization error while {context}: {source}")]
    Serialization {
        /// What was being encoded or decoded
        context: String,
        /// Underlying decoder error
        #[source]
        source: serde_json::Error,
    },

    /// A panic raised inside the Alertmanager API binding, caught at the relay boundary
    #[error("Recovered from fault while {operation}: {message}")]
    FaultIsolated {
        /// Relay operation that panicked
        operation: String,
        /// Panic payload
        message: String,
    },

    /// The caller's cancellation token fired before the operation finished
    #[error("Operation cancelled: {operation}")]
    Cancelled {
        /// Operation that was abandoned
        operation: String,
    },

    /// Network or protocol failure reported by the HTTP client
    #[error("Transport error while {operation}: {source}")]
    Transport {
        /// What was being done
        operation: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// Local configuration store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not ready error
    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::NotReady(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a backend error from a response status
    pub fn backend(operation: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            status,
            body: body.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Create a transport error
    pub fn transport(operation: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            operation: operation.into(),
            source,
        }
    }

    /// Create a cancellation error
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Status code carried by a backend error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error was produced by the caller's cancellation signal
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
