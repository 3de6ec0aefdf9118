use std::fmt;

/// Error raised while interpreting a declarative schema.
///
/// Every variant is a configuration problem in the schema itself, never in the data being
/// validated. Processing of the affected endpoint stops; the request is answered with a
/// 500-equivalent response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A `$ref` string is malformed, names an unknown group, or points at nothing
    BadReference {
        /// Human readable description of the problem
        reason: String,
    },
    /// A key that must be present is missing (`type`, `name`, `format` for numbers, ...)
    PropertyMissing {
        /// Human readable description of the problem
        reason: String,
    },
    /// A key is present but its value is not allowed
    PropertyInvalid {
        /// Human readable description of the problem
        reason: String,
    },
    /// A prefixed custom key (`{prefix}auth`, ...) is missing
    CustomPropertyMissing {
        /// Human readable description of the problem
        reason: String,
    },
    /// A prefixed custom key holds an unusable value
    CustomPropertyInvalid {
        /// Human readable description of the problem
        reason: String,
    },
    /// The top-level response schema has a type that cannot be validated
    UnsupportedResponseSchema {
        /// Response key (`"200"`, `"default"`, ...)
        status: String,
        /// Declared schema type
        kind: String,
    },
    /// A signature was requested for a response key the operation does not declare
    UnknownResponse {
        /// Response key that was requested
        status: String,
    },
    /// The schema document could not be deserialized
    Parse {
        /// Deserializer message
        reason: String,
    },
}

impl SchemaError {
    pub(crate) fn bad_reference(reason: impl Into<String>) -> Self {
        SchemaError::BadReference {
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(reason: impl Into<String>) -> Self {
        SchemaError::PropertyMissing {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        SchemaError::PropertyInvalid {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::BadReference { reason } => write!(f, "Bad reference. {}", reason),
            SchemaError::PropertyMissing { reason } => {
                write!(f, "Schema property missing: {}", reason)
            }
            SchemaError::PropertyInvalid { reason } => {
                write!(f, "Schema property invalid: {}", reason)
            }
            SchemaError::CustomPropertyMissing { reason } => {
                write!(f, "Custom schema property missing: {}", reason)
            }
            SchemaError::CustomPropertyInvalid { reason } => {
                write!(f, "Custom schema property invalid: {}", reason)
            }
            SchemaError::UnsupportedResponseSchema { status, kind } => write!(
                f,
                "Response '{}' declares a top-level schema of type '{}'; only 'object' and \
                'string' response schemas are supported",
                status, kind
            ),
            SchemaError::UnknownResponse { status } => write!(
                f,
                "The outgoing response qualifier '{}' does not exist in the operation's responses",
                status
            ),
            SchemaError::Parse { reason } => write!(f, "Unable to parse schema: {}", reason),
        }
    }
}

impl std::error::Error for SchemaError {}
