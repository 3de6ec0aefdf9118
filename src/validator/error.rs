use std::fmt;

use crate::value::Value;

/// A single failed field check.
///
/// Raised by the per-type checkers and folded into the field's report entry by
/// [`validate`](super::validate); it never escapes a full validation pass. Only
/// [`simple_validate`](super::simple_validate) hands it back to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// `Expected type <expected> (received <actual> instead)`
    pub fn type_mismatch(expected: impl fmt::Display, received: &Value) -> Self {
        Self::new(format!(
            "Expected type {} (received {} instead)",
            expected,
            received.type_name()
        ))
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn into_message(self) -> String {
        self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}
