//! Error taxonomy for building and executing Gremlin queries.
//!
//! - `UsageError`: caller mistakes, raised while a chain is being built (or
//!   when a chain that cannot be executed is read).
//! - `TransportError`: the endpoint could not be reached or answered with a
//!   non-success status.
//! - `ProtocolError`: the endpoint answered 200 but the body does not have the
//!   expected shape.
//!
//! All of them are `Clone`: a failed chain keeps its error and hands it back on
//! every later access.

use thiserror::Error;

pub type Result<T, E = GremlinError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GremlinError {
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("{step}() takes at least {expected} args, received {actual}")]
    TooFewArgs {
        step: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{step}() takes at most {expected} args, received {actual}")]
    TooManyArgs {
        step: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{step}() takes {expected} as argument {index}, received {actual}")]
    ArgType {
        step: &'static str,
        index: usize,
        expected: String,
        actual: &'static str,
    },
    #[error("{step}() requires a Morphism as argument {index}")]
    MorphismRequired { step: &'static str, index: usize },
    #[error("no step may follow terminal step {terminal}() (attempted {attempted}())")]
    TerminalChain {
        terminal: &'static str,
        attempted: String,
    },
    #[error("unknown step '{0}'")]
    UnknownStep(String),
    #[error("{0}() starts a chain and is only available on the graph handle")]
    RootOnlyStep(&'static str),
    #[error("query is not terminal and cannot be executed: {query}")]
    NotExecutable { query: String, morphism: bool },
}

impl UsageError {
    /// True for both arity variants.
    pub fn is_arity(&self) -> bool {
        matches!(self, Self::TooFewArgs { .. } | Self::TooManyArgs { .. })
    }
}

/// Failure talking to the query endpoint.
///
/// `status` is `None` when no HTTP response was received at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render_transport(.status, .message))]
pub struct TransportError {
    pub status: Option<u16>,
    pub message: Option<String>,
}

fn render_transport(status: &Option<u16>, message: &Option<String>) -> String {
    match (status, message) {
        (Some(code), Some(msg)) => format!("Error({code}) - {msg}"),
        (Some(code), None) => format!("Error({code})"),
        (None, Some(msg)) => format!("transport failure: {msg}"),
        (None, None) => "transport failure".to_string(),
    }
}

impl TransportError {
    pub fn status(status: u16, message: Option<String>) -> Self {
        Self {
            status: Some(status),
            message,
        }
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Error({status}) - 'result' not received{}", error_suffix(.error))]
    MissingResult { status: u16, error: Option<String> },
    #[error("response body is not valid JSON: {0}")]
    MalformedBody(String),
    #[error("record {index} does not match tags {expected:?}: {reason}")]
    MalformedRecord {
        index: usize,
        expected: Vec<String>,
        reason: String,
    },
}

fn error_suffix(error: &Option<String>) -> String {
    error.as_deref().map(|e| format!(": {e}")).unwrap_or_default()
}
