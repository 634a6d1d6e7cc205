// ABOUTME: Responder error types with SNAFU pattern.
// ABOUTME: Wraps delivery failures so callers can classify them.

use snafu::Snafu;

use super::transport::TransportError;

/// Failure to get the one response back to the stack engine.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ResponderError {
    #[snafu(display("response for {logical_resource_id} was not delivered: {source}"))]
    Delivery {
        logical_resource_id: String,
        source: TransportError,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponderErrorKind {
    /// Callback URL unusable or response unencodable; retrying will not help.
    Permanent,
    /// Network trouble or a rejected PUT; the stack engine will time out.
    Transient,
}

impl ResponderError {
    pub fn kind(&self) -> ResponderErrorKind {
        match self {
            ResponderError::Delivery { source, .. } => match source {
                TransportError::InvalidUrl(_)
                | TransportError::UnsupportedScheme(_)
                | TransportError::Encode(_) => ResponderErrorKind::Permanent,
                TransportError::Connect(..)
                | TransportError::Http(_)
                | TransportError::Rejected { .. }
                | TransportError::Timeout(_) => ResponderErrorKind::Transient,
            },
        }
    }
}
