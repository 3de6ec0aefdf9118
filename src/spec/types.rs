use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::error::SchemaError;

/// Extension keys that are not part of the typed structure (custom-prefixed keys, `x-*`, ...).
pub type Extensions = BTreeMap<String, serde_json::Value>;

/// The six recognised schema types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl SchemaType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Integer => "integer",
            SchemaType::Number => "number",
            SchemaType::Boolean => "boolean",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(SchemaType::String),
            "integer" => Ok(SchemaType::Integer),
            "number" => Ok(SchemaType::Number),
            "boolean" => Ok(SchemaType::Boolean),
            "array" => Ok(SchemaType::Array),
            "object" => Ok(SchemaType::Object),
            other => Err(SchemaError::invalid(format!("Unknown schema type '{}'", other))),
        }
    }
}

/// Where a parameter is carried in the request (`in`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Location {
    Path,
    Header,
    Query,
    FormData,
    Body,
}

impl Location {
    /// Incoming locations a signature can be compiled for, in compilation order.
    pub const INCOMING: [Location; 4] = [
        Location::Header,
        Location::Query,
        Location::FormData,
        Location::Body,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Path => "path",
            Location::Header => "header",
            Location::Query => "query",
            Location::FormData => "formData",
            Location::Body => "body",
        }
    }

    /// Schema types a parameter in this location may declare.
    #[must_use]
    pub fn allowed_types(&self) -> &'static [SchemaType] {
        use SchemaType::*;
        match self {
            Location::Path => &[String, Integer],
            Location::Header => &[String, Integer, Number, Boolean],
            Location::Query | Location::FormData => &[String, Integer, Number, Boolean, Array],
            Location::Body => &[String, Integer, Number, Boolean, Array, Object],
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `required` is a boolean on parameters and a list of property names on objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Required {
    Flag(bool),
    Names(Vec<String>),
}

/// A schema fragment as written in the declarative schema.
///
/// Parsed once at registration. Keys that are not modelled explicitly (custom-prefixed keys,
/// vendor extensions) are kept in [`SchemaFragment::extensions`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaFragment {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Required>,
    #[serde(rename = "x-nullable", default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_empty_value: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<serde_json::Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<serde_json::Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaFragment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, SchemaFragment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl SchemaFragment {
    /// A fragment declaring only a type.
    pub fn of_type(kind: SchemaType) -> Self {
        Self {
            kind: Some(kind.as_str().to_string()),
            ..Self::default()
        }
    }

    /// Names listed in an object-level `required` list; empty for boolean `required`.
    #[must_use]
    pub fn required_names(&self) -> &[String] {
        match &self.required {
            Some(Required::Names(names)) => names,
            _ => &[],
        }
    }

    /// Look up a custom key such as `is-x-obscure`.
    #[must_use]
    pub fn extension(&self, prefix: &str, key: &str) -> Option<&serde_json::Value> {
        extension(&self.extensions, prefix, key)
    }
}

/// One entry of an operation's `parameters` list.
///
/// A parameter that only carries a `$ref` is resolved against the catalog's `parameters` group
/// before use, which is why `in` is optional here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Only meaningful for `in: body`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaFragment>,
    #[serde(flatten)]
    pub fragment: SchemaFragment,
}

/// One entry of an operation's `responses` mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseDef {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaFragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// The declarative definition of one HTTP method on one path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub consumes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub produces: Option<Vec<String>>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<BTreeMap<String, ResponseDef>>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Operation {
    /// Parse an operation from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, SchemaError> {
        serde_yaml::from_str(text).map_err(|e| SchemaError::Parse {
            reason: e.to_string(),
        })
    }

    /// Parse an operation from an already decoded JSON value.
    pub fn from_json(value: serde_json::Value) -> Result<Self, SchemaError> {
        serde_json::from_value(value).map_err(|e| SchemaError::Parse {
            reason: e.to_string(),
        })
    }

    #[must_use]
    pub fn extension(&self, prefix: &str, key: &str) -> Option<&serde_json::Value> {
        extension(&self.extensions, prefix, key)
    }

    /// Read the custom behaviour flags using the given prefix.
    #[must_use]
    pub fn flags(&self, prefix: &str) -> OperationFlags {
        let flag = |key: &str, default: bool| {
            self.extension(prefix, key)
                .map(truthy)
                .unwrap_or(default)
        };
        let include_headers = self
            .extension(prefix, "includeHeaders")
            .and_then(|v| v.as_object())
            .map(|headers| {
                headers
                    .iter()
                    .map(|(name, value)| {
                        let rendered = match value {
                            serde_json::Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        (name.clone(), rendered)
                    })
                    .collect()
            })
            .unwrap_or_default();

        OperationFlags {
            hide: flag("hide", false),
            validate_request: flag("validateRequest", true),
            validate_response: flag("validateResponse", true),
            tag_group: self
                .extension(prefix, "tagGroup")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            include_headers,
        }
    }

    /// Whether `produces` lists `application/json`.
    #[must_use]
    pub fn produces_json(&self) -> bool {
        self.produces
            .as_ref()
            .is_some_and(|p| p.iter().any(|t| t == "application/json"))
    }
}

/// Custom behaviour flags of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationFlags {
    /// Hidden from the published catalog
    pub hide: bool,
    pub validate_request: bool,
    pub validate_response: bool,
    /// Documentation grouping
    pub tag_group: Option<String>,
    /// Headers added to every response of the operation
    pub include_headers: Vec<(String, String)>,
}

/// Look up `{prefix}{key}` in an extension map.
#[must_use]
pub fn extension<'a>(
    extensions: &'a Extensions,
    prefix: &str,
    key: &str,
) -> Option<&'a serde_json::Value> {
    extensions.get(&format!("{}{}", prefix, key))
}

/// Loose truthiness for flag values written by hand (`true`, `1`, `"yes"`).
pub(crate) fn truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(a) => !a.is_empty(),
        serde_json::Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPERATION: &str = r#"
is-x-validateResponse: false
is-x-tagGroup: Tests
is-x-includeHeaders:
  X-Api-Version: 2
  X-Frame-Options: DENY
operationId: tests_validation_get
consumes: [application/x-www-form-urlencoded]
produces: [application/json]
parameters:
  - in: query
    name: arg1
    type: integer
    required: true
    is-x-obscure: true
  - $ref: '#/parameters/PageSize'
responses:
  '200':
    description: ok
    schema:
      type: object
      required: [success]
      properties:
        success: {type: boolean}
"#;

    #[test]
    fn parses_parameters_and_custom_keys() {
        let op = Operation::from_yaml_str(OPERATION).unwrap();
        assert_eq!(op.parameters.len(), 2);
        let arg1 = &op.parameters[0];
        assert_eq!(arg1.location, Some(Location::Query));
        assert_eq!(arg1.fragment.kind.as_deref(), Some("integer"));
        assert_eq!(arg1.fragment.required, Some(Required::Flag(true)));
        assert_eq!(
            arg1.fragment.extension("is-x-", "obscure"),
            Some(&serde_json::Value::Bool(true))
        );
        assert_eq!(
            op.parameters[1].fragment.reference.as_deref(),
            Some("#/parameters/PageSize")
        );
        let schema = op.responses.as_ref().unwrap()["200"].schema.as_ref().unwrap();
        assert_eq!(schema.required_names(), ["success".to_string()]);
    }

    #[test]
    fn flags_use_prefix_and_defaults() {
        let op = Operation::from_yaml_str(OPERATION).unwrap();
        let flags = op.flags("is-x-");
        assert!(!flags.hide);
        assert!(flags.validate_request);
        assert!(!flags.validate_response);
        assert_eq!(flags.tag_group.as_deref(), Some("Tests"));
        assert_eq!(
            flags.include_headers,
            vec![
                ("X-Api-Version".to_string(), "2".to_string()),
                ("X-Frame-Options".to_string(), "DENY".to_string()),
            ]
        );

        // A different prefix sees none of the custom keys
        let other = op.flags("ac-");
        assert!(other.validate_response);
        assert!(other.include_headers.is_empty());
    }

    #[test]
    fn location_type_tables() {
        assert!(!Location::Query.allowed_types().contains(&SchemaType::Object));
        assert!(Location::Body.allowed_types().contains(&SchemaType::Object));
        assert_eq!(Location::Path.allowed_types(), &[SchemaType::String, SchemaType::Integer]);
    }
}
