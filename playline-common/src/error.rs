//! Common error types for Playline

use thiserror::Error;

/// Common result type for Playline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of a transport-level failure.
///
/// Callers use this to decide whether a retry is worthwhile: connection
/// refusals and timeouts are transient, protocol errors are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Connection could not be established (refused, DNS, reset)
    Connect,
    /// The call exceeded the configured timeout
    Timeout,
    /// The peer answered, but not with anything we could use
    Protocol,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TransportKind::Connect => "connect",
            TransportKind::Timeout => "timeout",
            TransportKind::Protocol => "protocol",
        };
        write!(f, "{}", label)
    }
}

/// Common error types across the Playline pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// A record or payload field is missing or of the wrong type.
    /// Surfaced immediately to the caller, never retried.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A remote call failed at the transport level.
    /// Retried with bounded backoff at the driver boundary only.
    #[error("transport failure ({kind}): {message}")]
    Transport {
        kind: TransportKind,
        message: String,
    },

    /// A downstream stage in the forwarding chain reported a failure.
    /// Propagated unchanged to the caller, never masked.
    #[error("upstream stage {stage} failed: {message}")]
    UpstreamStage {
        stage: crate::model::StageName,
        message: String,
    },

    /// Configuration loading or validation error
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable kind string, used in wire error bodies.
    pub fn kind_str(&self) -> &'static str {
        match self {
            Error::MalformedInput(_) => "malformed_input",
            Error::Transport { .. } => "transport_failure",
            Error::UpstreamStage { .. } => "upstream_stage_failure",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
            Error::Internal(_) => "internal",
        }
    }

    /// Whether a driver-side retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Transport {
                kind: TransportKind::Connect | TransportKind::Timeout,
                ..
            }
        )
    }
}
