//! # Validator Module
//!
//! Validates a data mapping against a compiled [`DataSignature`], coercing values in place and
//! producing a [`ValidationReport`] that mirrors the signature.
//!
//! ## Per-field flow
//!
//! For each field of the signature, in key order:
//!
//! 1. **Absent** - valid unless required. Optional fields with a declared default get the
//!    default injected into the data.
//! 2. **Null** - valid only if the field is nullable.
//! 3. **Present** - the type checker runs (string, boolean, number/integer, array, object). It
//!    may coerce the value in place; a failure records a message on the entry and skips the
//!    remaining checks of that field only.
//! 4. **Enum** - the (possibly coerced) value must be one of the declared options.
//!
//! Arrays are validated element by element by wrapping each element as `{"items": element}` and
//! running this same validator with the item signature. Objects recurse with their property
//! signature.
//!
//! ## Coercion
//!
//! With coercion enabled, strings such as `"50"` or `"true"` are converted to the declared
//! native type. Without it, only exact native types pass, except that integers always widen to
//! floats for `float`/`double` fields.
//!
//! ## Dates
//!
//! Incoming `date`/`datetime` strings are parsed into native date values. For responses, native
//! dates are formatted back into strings and strings are only checked for the right format.

mod check;
mod error;
mod report;

pub use error::ValidationError;
pub use report::{FieldReport, NestedReport, ValidationReport};

use std::collections::BTreeMap;
use tracing::{debug, trace};

use crate::signature::{DataSignature, FieldSpec, NumberFormat, NumberRules, StringRules};
use crate::spec::SchemaType;
use crate::value::{Map, Value};

#[derive(Debug, Clone, Copy)]
pub(crate) struct Options {
    pub coerce: bool,
    pub for_response: bool,
}

/// Validate `data` against `signature`, mutating it in place.
///
/// `allow_coercion` enables type conversion of mismatched values; `for_response` switches date
/// handling to its outgoing form.
pub fn validate(
    data: &mut Map,
    signature: &DataSignature,
    allow_coercion: bool,
    for_response: bool,
) -> ValidationReport {
    let opts = Options {
        coerce: allow_coercion,
        for_response,
    };
    let mut entries = BTreeMap::new();
    for (key, spec) in signature {
        trace!(key = %key, coerce = allow_coercion, for_response, "Validating field");
        entries.insert(key.clone(), validate_field(data, key, spec, opts));
    }
    let report = ValidationReport::from_entries(entries);
    debug!(all_valid = report.all_valid(), fields = report.len(), "Validation finished");
    report
}

fn validate_field(data: &mut Map, key: &str, spec: &FieldSpec, opts: Options) -> FieldReport {
    let mut entry = FieldReport::new(spec.kind);
    let value = match data.get_mut(key) {
        Some(value) => value,
        None => {
            if !spec.required {
                entry.valid = true;
                if let Some(default) = &spec.default {
                    data.insert(key.to_string(), default.clone());
                }
            }
            return entry;
        }
    };

    entry.found = true;
    if value.is_null() {
        if spec.nullable {
            entry.valid = true;
        } else {
            entry.message = Some(format!("Value for '{}' cannot be null", key));
        }
        return entry;
    }

    match check::check(value, spec, opts) {
        Ok(nested) => entry.nested = nested,
        Err(e) => {
            trace!(key = %key, error = %e, "Field failed validation");
            entry.message = Some(e.into_message());
            return entry;
        }
    }

    if let Some(options) = &spec.enum_values {
        if !options.contains(value) {
            entry.message = Some(format!(
                "Value '{}' is not in the list of allowed options {}",
                value,
                Value::Array(options.clone())
            ));
            return entry;
        }
    }

    entry.valid = true;
    entry
}

/// Check and coerce a single value against a bare type, with coercion enabled.
///
/// Used by the route resolver to test whether a path segment fits a placeholder type.
pub fn simple_validate(value: &Value, kind: SchemaType) -> Result<Value, ValidationError> {
    let opts = Options {
        coerce: true,
        for_response: false,
    };
    let mut value = value.clone();
    if value.is_null() {
        return Err(ValidationError::type_mismatch(kind, &value));
    }
    match kind {
        SchemaType::String => check::check_string(&mut value, &StringRules::default(), opts)?,
        SchemaType::Boolean => check::check_boolean(&mut value, opts)?,
        SchemaType::Integer => {
            check::check_number(&mut value, &NumberRules::new(NumberFormat::Integer), opts)?
        }
        SchemaType::Number => {
            check::check_number(&mut value, &NumberRules::new(NumberFormat::Float), opts)?
        }
        SchemaType::Array | SchemaType::Object => {
            check::check(&mut value, &FieldSpec::new(kind), opts)?;
        }
    }
    Ok(value)
}
