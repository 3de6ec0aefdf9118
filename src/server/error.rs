use http::StatusCode;
use std::fmt;

/// Failures while turning a raw request into a [`RequestContext`](super::RequestContext).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Effective method (after override) is not one of the supported methods
    InvalidHttpMethod { method: String },
    /// Content type unsupported, or not allowed for the method or operation
    InvalidContentType { reason: String },
    /// Body could not be parsed as the declared content type
    InvalidRequestBody { reason: String },
    /// An augmentation ran twice or before its dependencies
    Augmentation { reason: String },
    /// A non-GET request without a `Content-Type` header
    MissingContentType,
}

impl RequestError {
    /// HTTP status this error maps to at the service boundary.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::InvalidHttpMethod { .. } => StatusCode::METHOD_NOT_ALLOWED,
            RequestError::InvalidContentType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            RequestError::InvalidRequestBody { .. } | RequestError::MissingContentType => {
                StatusCode::BAD_REQUEST
            }
            RequestError::Augmentation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the client caused the error.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::InvalidHttpMethod { method } => {
                write!(f, "Method '{}' is not valid.", method)
            }
            RequestError::InvalidContentType { reason } => f.write_str(reason),
            RequestError::InvalidRequestBody { reason } => f.write_str(reason),
            RequestError::Augmentation { reason } => f.write_str(reason),
            RequestError::MissingContentType => {
                f.write_str("Incoming Request did not define a 'Content-Type' header")
            }
        }
    }
}

impl std::error::Error for RequestError {}

/// A status given to [`Response::http_status`](super::Response::http_status) that has no
/// known code or reason phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus {
    pub input: String,
}

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to find Text and Code Status based on given input '{}'",
            self.input
        )
    }
}

impl std::error::Error for UnknownStatus {}
