use std::fmt;

/// Errors raised while building or searching a [`RouteTree`](super::RouteTree).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// More than one candidate survived every tie-break
    Ambiguous { reason: String },
    /// A registered path segment is unusable (HTTP method name, bad placeholder marker,
    /// duplicate registration)
    InvalidSegment { segment: String, reason: String },
}

impl RouteError {
    pub(crate) fn ambiguous(reason: impl Into<String>) -> Self {
        RouteError::Ambiguous {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(segment: impl Into<String>, reason: impl Into<String>) -> Self {
        RouteError::InvalidSegment {
            segment: segment.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::Ambiguous { reason } => write!(f, "Ambiguous route. {}", reason),
            RouteError::InvalidSegment { segment, reason } => {
                write!(f, "Invalid path segment '{}': {}", segment, reason)
            }
        }
    }
}

impl std::error::Error for RouteError {}
