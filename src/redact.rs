//! Redaction of obscured fields for audit logging.
//!
//! [`redact`] returns a copy of the data in which every field flagged `obscure` in the signature
//! is replaced by [`REDACTED`]. Nested objects recurse with their property signature and list
//! elements are redacted one by one through the `{"items": element}` wrapper the validator also
//! uses.
//!
//! A redacted list collapses every sentinel into a single leading [`REDACTED`] followed by the
//! elements that were kept, so `[secret, "b", secret]` is logged as `["REDACTED", "b"]`. Log
//! consumers rely on that shape.
//!
//! The result is for logs only. It never replaces the data handed to business logic or returned
//! in a response.

use tracing::trace;

use crate::signature::{DataSignature, ITEMS_KEY};
use crate::value::{Map, Value};

/// Sentinel written in place of obscured values.
pub const REDACTED: &str = "REDACTED";

/// Deep copy of `data` with obscured fields replaced.
#[must_use]
pub fn redact(data: &Map, signature: &DataSignature) -> Map {
    let mut redacted = data.clone();
    for (key, spec) in signature {
        let Some(value) = redacted.get_mut(key) else {
            continue;
        };
        if spec.obscure {
            trace!(key = %key, "Redacting value");
            *value = Value::from(REDACTED);
            continue;
        }

        let empty = DataSignature::new();
        let child = spec.child.as_ref().unwrap_or(&empty);
        match value {
            Value::Object(nested) => *nested = redact(nested, child),
            Value::Array(elements) => {
                let redacted_elements = elements
                    .iter()
                    .map(|element| {
                        let mut wrapper = Map::new();
                        wrapper.insert(ITEMS_KEY.to_string(), element.clone());
                        redact(&wrapper, child)
                            .remove(ITEMS_KEY)
                            .unwrap_or_default()
                    })
                    .collect();
                *elements = collapse_redacted(redacted_elements);
            }
            _ => {}
        }
    }
    redacted
}

/// One leading sentinel if any element was redacted, then every element that was not.
fn collapse_redacted(elements: Vec<Value>) -> Vec<Value> {
    let is_sentinel = |v: &Value| v.as_str() == Some(REDACTED);
    let any_redacted = elements.iter().any(is_sentinel);
    let mut collapsed = Vec::with_capacity(elements.len());
    if any_redacted {
        collapsed.push(Value::from(REDACTED));
    }
    collapsed.extend(elements.into_iter().filter(|v| !is_sentinel(v)));
    collapsed
}
