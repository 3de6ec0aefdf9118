use std::fmt;

use crate::server::RequestError;
use crate::spec::SchemaError;

/// Failure of one endpoint execution.
///
/// Every variant except [`EndpointError::Request`] is answered with a generic 500; the detail
/// only goes to the logs.
#[derive(Debug)]
pub enum EndpointError {
    /// The request context or handler is not in a usable state
    Initialization { reason: String },
    /// The handler's output broke its own declared contract
    Execution { reason: String },
    Schema(SchemaError),
    Request(RequestError),
    /// The handler logic returned an error or panicked
    Logic(anyhow::Error),
}

impl EndpointError {
    pub(crate) fn initialization(reason: impl Into<String>) -> Self {
        EndpointError::Initialization {
            reason: reason.into(),
        }
    }

    pub(crate) fn execution(reason: impl Into<String>) -> Self {
        EndpointError::Execution {
            reason: reason.into(),
        }
    }

    /// Whether the client is at fault (content negotiation) rather than the server.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, EndpointError::Request(e) if e.is_client_error())
    }
}

impl fmt::Display for EndpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointError::Initialization { reason } => {
                write!(f, "Endpoint initialization failed: {}", reason)
            }
            EndpointError::Execution { reason } => {
                write!(f, "Endpoint execution failed: {}", reason)
            }
            EndpointError::Schema(e) => write!(f, "{}", e),
            EndpointError::Request(e) => write!(f, "{}", e),
            EndpointError::Logic(e) => write!(f, "Endpoint logic failed: {:#}", e),
        }
    }
}

impl std::error::Error for EndpointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EndpointError::Schema(e) => Some(e),
            EndpointError::Request(e) => Some(e),
            EndpointError::Logic(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<SchemaError> for EndpointError {
    fn from(e: SchemaError) -> Self {
        EndpointError::Schema(e)
    }
}

impl From<RequestError> for EndpointError {
    fn from(e: RequestError) -> Self {
        EndpointError::Request(e)
    }
}
