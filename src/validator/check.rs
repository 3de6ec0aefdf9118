//! Per-type field checkers.
//!
//! Each checker receives the (non-null) value in place and either accepts it, possibly after
//! coercing it, or fails with a [`ValidationError`]. Arrays and objects additionally return the
//! nested reports produced by recursing into their elements.

use chrono::{DateTime, NaiveDate};
use std::cmp::Ordering;
use tracing::trace;

use super::error::ValidationError;
use super::report::NestedReport;
use super::{validate, Options, ValidationReport};
use crate::signature::{
    ArrayRules, Bound, Constraints, DataSignature, FieldSpec, NumberFormat, NumberRules, StringFormat,
    StringRules, ITEMS_KEY,
};
use crate::spec::SchemaType;
use crate::value::{Map, Value, DATETIME_FORMAT, DATE_FORMAT};

pub(super) type CheckResult = Result<Option<NestedReport>, ValidationError>;

/// Run the type-specific checker for `spec` against `value`.
pub(super) fn check(value: &mut Value, spec: &FieldSpec, opts: Options) -> CheckResult {
    match spec.kind {
        SchemaType::String => {
            check_string(value, spec.string_rules().unwrap_or(&StringRules::default()), opts)
                .map(|()| None)
        }
        SchemaType::Boolean => check_boolean(value, opts).map(|()| None),
        SchemaType::Integer | SchemaType::Number => {
            let fallback;
            let rules = match &spec.constraints {
                Constraints::Number(rules) => rules,
                _ => {
                    fallback = NumberRules::new(if spec.kind == SchemaType::Integer {
                        NumberFormat::Integer
                    } else {
                        NumberFormat::Float
                    });
                    &fallback
                }
            };
            check_number(value, rules, opts).map(|()| None)
        }
        SchemaType::Array => {
            let fallback = ArrayRules::default();
            check_array(
                value,
                spec.array_rules().unwrap_or(&fallback),
                spec.child.as_ref(),
                opts,
            )
        }
        SchemaType::Object => check_object(value, spec.child.as_ref(), opts),
    }
}

pub(super) fn check_string(value: &mut Value, rules: &StringRules, opts: Options) -> Result<(), ValidationError> {
    if let Some(format) = rules.format {
        return check_date(value, format, opts);
    }

    let text = match value {
        Value::String(s) => s.as_str(),
        other => return Err(ValidationError::type_mismatch("string", other)),
    };
    if let Some(pattern) = &rules.pattern {
        trace!(pattern = %pattern.source(), "Checking string against pattern");
        if !pattern.is_match(text) {
            return Err(ValidationError::new(format!(
                "String '{}' does not match regex pattern '{}'",
                text,
                pattern.source()
            )));
        }
    }

    let length = text.chars().count() as u64;
    match (rules.min_length, rules.max_length) {
        (Some(min), Some(max)) if !(min..=max).contains(&length) => Err(ValidationError::new(
            format!("Value is not between {} and {} characters in length", min, max),
        )),
        (Some(min), None) if length < min => Err(ValidationError::new(format!(
            "Value must be greater than or equal to {} characters in length",
            min
        ))),
        (None, Some(max)) if length > max => Err(ValidationError::new(format!(
            "Value must be less than or equal to {} characters in length",
            max
        ))),
        _ => Ok(()),
    }
}

/// Dates are parsed into native values on the way in and formatted into strings on the way out.
fn check_date(value: &mut Value, format: StringFormat, opts: Options) -> Result<(), ValidationError> {
    let pattern = format.pattern();
    if opts.for_response {
        let formatted = match (&*value, format) {
            (Value::Date(d), StringFormat::Date) => d.format(DATE_FORMAT).to_string(),
            (Value::Date(d), StringFormat::DateTime) => {
                format!("{}T00:00:00 +00:00", d.format(DATE_FORMAT))
            }
            (Value::DateTime(dt), StringFormat::Date) => dt.format(DATE_FORMAT).to_string(),
            (Value::DateTime(dt), StringFormat::DateTime) => dt.format(DATETIME_FORMAT).to_string(),
            (Value::String(s), _) => {
                if parse_date(s, format).is_none() {
                    return Err(ValidationError::type_mismatch(
                        format!("Date string [format '{}']", pattern),
                        value,
                    ));
                }
                return Ok(());
            }
            (other, _) => {
                return Err(ValidationError::type_mismatch(
                    format!("Date Object or Date string [format '{}']", pattern),
                    other,
                ))
            }
        };
        *value = Value::String(formatted);
        return Ok(());
    }

    match value {
        Value::Date(_) | Value::DateTime(_) => Ok(()),
        Value::String(s) => {
            let parsed = parse_date(s, format).ok_or_else(|| {
                ValidationError::new(format!(
                    "Expected type Date String [format '{}'] (received '{}' instead)",
                    pattern, s
                ))
            })?;
            *value = parsed;
            Ok(())
        }
        other => Err(ValidationError::type_mismatch("string", other)),
    }
}

fn parse_date(text: &str, format: StringFormat) -> Option<Value> {
    match format {
        StringFormat::Date => NaiveDate::parse_from_str(text, DATE_FORMAT)
            .ok()
            .map(Value::Date),
        StringFormat::DateTime => DateTime::parse_from_str(text, DATETIME_FORMAT)
            .ok()
            .map(Value::DateTime),
    }
}

pub(super) fn check_boolean(value: &mut Value, opts: Options) -> Result<(), ValidationError> {
    if matches!(value, Value::Bool(_)) {
        return Ok(());
    }
    if !opts.coerce {
        return Err(ValidationError::type_mismatch("boolean", value));
    }
    let coerced = match &*value {
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        Value::Integer(1) => Some(true),
        Value::Integer(0) => Some(false),
        _ => None,
    };
    match coerced {
        Some(b) => {
            *value = Value::Bool(b);
            Ok(())
        }
        None => Err(ValidationError::type_mismatch("boolean", value)),
    }
}

pub(super) fn check_number(value: &mut Value, rules: &NumberRules, opts: Options) -> Result<(), ValidationError> {
    let format = rules.format;
    let mismatch = |v: &Value| ValidationError::type_mismatch(format.as_str(), v);

    let number = if format.is_integral() {
        let coerced = match &*value {
            Value::Integer(i) => Some(*i),
            _ if !opts.coerce => return Err(mismatch(value)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            Value::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(*f as i64),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        };
        let i = coerced.ok_or_else(|| mismatch(value))?;
        *value = Value::Integer(i);
        Bound::Integer(i)
    } else {
        let coerced = match &*value {
            Value::Float(f) => Some(*f),
            // Integers widen without needing coercion
            Value::Integer(i) => Some(*i as f64),
            _ if !opts.coerce => return Err(mismatch(value)),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        };
        let f = coerced.ok_or_else(|| mismatch(value))?;
        *value = Value::Float(f);
        Bound::Float(f)
    };

    check_range(number, rules)
}

/// Order of `n` relative to `bound`, exact when both sides are integral.
fn compare(n: Bound, bound: Bound) -> Option<Ordering> {
    match (n, bound) {
        (Bound::Integer(a), Bound::Integer(b)) => Some(a.cmp(&b)),
        (Bound::Integer(a), Bound::Float(b))
            if b.fract() == 0.0 && b >= i64::MIN as f64 && b < i64::MAX as f64 =>
        {
            Some(a.cmp(&(b as i64)))
        }
        (n, bound) => n.as_f64().partial_cmp(&bound.as_f64()),
    }
}

fn check_range(n: Bound, rules: &NumberRules) -> Result<(), ValidationError> {
    let (xmin, xmax) = (rules.exclusive_minimum, rules.exclusive_maximum);
    let below = |min: Bound| match compare(n, min) {
        Some(Ordering::Less) => true,
        Some(Ordering::Equal) => xmin,
        Some(Ordering::Greater) => false,
        None => true,
    };
    let above = |max: Bound| match compare(n, max) {
        Some(Ordering::Greater) => true,
        Some(Ordering::Equal) => xmax,
        Some(Ordering::Less) => false,
        None => true,
    };
    let excl = |flag: bool| if flag { " (exclusively)" } else { "" };

    match (rules.minimum, rules.maximum) {
        (Some(min), Some(max)) if below(min) || above(max) => Err(ValidationError::new(format!(
            "Value is not in the range {}{} to {}{}",
            min,
            excl(xmin),
            max,
            excl(xmax)
        ))),
        (Some(min), None) if below(min) => Err(ValidationError::new(format!(
            "Value must be greater than {}{}",
            if xmin { "" } else { "or equal to " },
            min
        ))),
        (None, Some(max)) if above(max) => Err(ValidationError::new(format!(
            "Value must be less than {}{}",
            if xmax { "" } else { "or equal to " },
            max
        ))),
        _ => Ok(()),
    }
}

fn check_array(
    value: &mut Value,
    rules: &ArrayRules,
    items: Option<&DataSignature>,
    opts: Options,
) -> CheckResult {
    if let Some(collection) = rules.collection_format {
        if let Value::String(s) = value {
            trace!(delimiter = %collection.delimiter(), "Splitting delimited string into array");
            let parts = s
                .split(collection.delimiter())
                .map(|part| Value::String(part.to_string()))
                .collect();
            *value = Value::Array(parts);
        }
    }
    let elements = match value {
        Value::Array(elements) => elements,
        other => return Err(ValidationError::type_mismatch("array", other)),
    };

    let empty = DataSignature::new();
    let item_signature = items.unwrap_or(&empty);
    let mut reports = Vec::with_capacity(elements.len());
    for element in elements.iter_mut() {
        let mut wrapper = Map::new();
        wrapper.insert(ITEMS_KEY.to_string(), std::mem::take(element));
        reports.push(validate_nested(&mut wrapper, item_signature, opts));
        *element = wrapper.remove(ITEMS_KEY).unwrap_or_default();
    }

    if rules.unique_items {
        let duplicates = elements.len() - distinct_count(elements);
        if duplicates > 0 {
            return Err(ValidationError::new(format!(
                "Array must have unique elements. Found {} elements that were duplicates",
                duplicates
            )));
        }
    }
    let len = elements.len() as u64;
    if let Some(min) = rules.min_items.filter(|min| len < *min) {
        return Err(ValidationError::new(format!(
            "Array must have at least {} elements",
            min
        )));
    }
    if let Some(max) = rules.max_items.filter(|max| len > *max) {
        return Err(ValidationError::new(format!(
            "Array must have at most {} elements",
            max
        )));
    }
    Ok(Some(NestedReport::Array(reports)))
}

fn distinct_count(values: &[Value]) -> usize {
    let mut seen: Vec<&Value> = Vec::with_capacity(values.len());
    for v in values {
        if !seen.contains(&v) {
            seen.push(v);
        }
    }
    seen.len()
}

fn check_object(value: &mut Value, properties: Option<&DataSignature>, opts: Options) -> CheckResult {
    let map = match value {
        Value::Object(map) => map,
        other => return Err(ValidationError::type_mismatch("object", other)),
    };
    let empty = DataSignature::new();
    Ok(Some(NestedReport::Object(validate_nested(
        map,
        properties.unwrap_or(&empty),
        opts,
    ))))
}

fn validate_nested(data: &mut Map, signature: &DataSignature, opts: Options) -> ValidationReport {
    validate(data, signature, opts.coerce, opts.for_response)
}
