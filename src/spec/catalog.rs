use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::SchemaError;
use super::types::{Parameter, Required, ResponseDef, SchemaFragment, SchemaType};

/// Longest `$ref` chain followed before giving up.
const MAX_REF_DEPTH: usize = 16;

/// Groups a `$ref` may point into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefGroup {
    Definitions,
    Parameters,
    Responses,
}

impl RefGroup {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RefGroup::Definitions => "definitions",
            RefGroup::Parameters => "parameters",
            RefGroup::Responses => "responses",
        }
    }
}

/// Split a `#/<group>/<name>` reference, checking the group against `expected`.
pub fn parse_ref(reference: &str, expected: RefGroup) -> Result<&str, SchemaError> {
    let parts: Vec<&str> = reference.split('/').collect();
    if parts.len() != 3 || parts[0] != "#" {
        return Err(SchemaError::bad_reference(format!(
            "Ref String '{}' did not start with '#' or is not of the form '#/<group>/<name>'",
            reference
        )));
    }
    if parts[1] != expected.as_str() {
        return Err(SchemaError::bad_reference(format!(
            "Ref String '{}' had bad grouping. Acceptable groupings are ['{}']",
            reference,
            expected.as_str()
        )));
    }
    Ok(parts[2])
}

/// Shared definitions that `$ref`s resolve against.
///
/// Parameter references resolve in `parameters`, schema references in `definitions` and
/// response references in `responses`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub definitions: BTreeMap<String, SchemaFragment>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,
    #[serde(default)]
    pub responses: BTreeMap<String, ResponseDef>,
}

impl Catalog {
    /// Catalog pre-populated with the `GenericSuccess` and `GenericFailure` responses.
    pub fn with_generic_responses() -> Self {
        let mut catalog = Self::default();
        catalog.add_generic_responses();
        catalog
    }

    /// Insert `GenericSuccess` / `GenericFailure` unless already defined.
    pub fn add_generic_responses(&mut self) {
        self.responses
            .entry("GenericSuccess".to_string())
            .or_insert_with(generic_success_response);
        self.responses
            .entry("GenericFailure".to_string())
            .or_insert_with(generic_failure_response);
    }

    pub fn resolve_definition(&self, reference: &str) -> Result<&SchemaFragment, SchemaError> {
        let name = parse_ref(reference, RefGroup::Definitions)?;
        self.definitions
            .get(name)
            .ok_or_else(|| missing_target(reference))
    }

    pub fn resolve_parameter(&self, reference: &str) -> Result<&Parameter, SchemaError> {
        let name = parse_ref(reference, RefGroup::Parameters)?;
        self.parameters
            .get(name)
            .ok_or_else(|| missing_target(reference))
    }

    pub fn resolve_response(&self, reference: &str) -> Result<&ResponseDef, SchemaError> {
        let name = parse_ref(reference, RefGroup::Responses)?;
        self.responses
            .get(name)
            .ok_or_else(|| missing_target(reference))
    }

    /// Follow schema `$ref`s until a concrete fragment is reached.
    pub fn deref_schema<'a>(
        &'a self,
        mut fragment: &'a SchemaFragment,
    ) -> Result<&'a SchemaFragment, SchemaError> {
        let mut depth = 0;
        while let Some(reference) = &fragment.reference {
            depth += 1;
            if depth > MAX_REF_DEPTH {
                return Err(SchemaError::bad_reference(format!(
                    "Reference chain starting at '{}' is too deep or circular",
                    reference
                )));
            }
            fragment = self.resolve_definition(reference)?;
        }
        Ok(fragment)
    }

    /// Follow parameter `$ref`s until a concrete parameter is reached.
    pub fn deref_parameter<'a>(
        &'a self,
        mut parameter: &'a Parameter,
    ) -> Result<&'a Parameter, SchemaError> {
        let mut depth = 0;
        while let Some(reference) = &parameter.fragment.reference {
            depth += 1;
            if depth > MAX_REF_DEPTH {
                return Err(SchemaError::bad_reference(format!(
                    "Reference chain starting at '{}' is too deep or circular",
                    reference
                )));
            }
            parameter = self.resolve_parameter(reference)?;
        }
        Ok(parameter)
    }
}

fn missing_target(reference: &str) -> SchemaError {
    SchemaError::bad_reference(format!("Reference '{}' does not exist.", reference))
}

fn envelope(success: bool) -> SchemaFragment {
    let mut properties = BTreeMap::new();
    properties.insert(
        "success".to_string(),
        SchemaFragment {
            enum_values: Some(vec![serde_json::Value::Bool(success)]),
            ..SchemaFragment::of_type(SchemaType::Boolean)
        },
    );
    properties.insert(
        "status".to_string(),
        SchemaFragment {
            enum_values: Some(vec![serde_json::Value::String(
                if success { "SUCCESS" } else { "FAILURE" }.to_string(),
            )]),
            ..SchemaFragment::of_type(SchemaType::String)
        },
    );
    properties.insert(
        "message".to_string(),
        SchemaFragment::of_type(SchemaType::String),
    );
    SchemaFragment {
        properties: Some(properties),
        required: Some(Required::Names(vec![
            "success".to_string(),
            "status".to_string(),
        ])),
        ..SchemaFragment::of_type(SchemaType::Object)
    }
}

/// Standard `{success: true, status: "SUCCESS", message?}` response.
pub fn generic_success_response() -> ResponseDef {
    ResponseDef {
        description: Some("**SUCCESS** (returns HTTP Status `OK`)".to_string()),
        schema: Some(envelope(true)),
        ..ResponseDef::default()
    }
}

/// Standard `{success: false, status: "FAILURE", message?, error?}` response.
pub fn generic_failure_response() -> ResponseDef {
    let mut schema = envelope(false);
    if let Some(properties) = schema.properties.as_mut() {
        properties.insert("error".to_string(), SchemaFragment::of_type(SchemaType::Object));
    }
    ResponseDef {
        description: Some("**FAILURE** (returns HTTP Status `OK`)".to_string()),
        schema: Some(schema),
        ..ResponseDef::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ref_rejects_malformed_and_wrong_group() {
        assert_eq!(parse_ref("#/definitions/Pet", RefGroup::Definitions).unwrap(), "Pet");
        assert!(matches!(
            parse_ref("definitions/Pet", RefGroup::Definitions),
            Err(SchemaError::BadReference { .. })
        ));
        assert!(matches!(
            parse_ref("#/definitions/Pet/extra", RefGroup::Definitions),
            Err(SchemaError::BadReference { .. })
        ));
        let err = parse_ref("#/paths/Pet", RefGroup::Definitions).unwrap_err();
        assert!(err.to_string().contains("bad grouping"));
    }

    #[test]
    fn resolving_a_missing_name_fails() {
        let catalog = Catalog::default();
        let err = catalog.resolve_definition("#/definitions/Nope").unwrap_err();
        assert_eq!(
            err,
            SchemaError::BadReference {
                reason: "Reference '#/definitions/Nope' does not exist.".to_string()
            }
        );
    }

    #[test]
    fn circular_schema_refs_are_detected() {
        let mut catalog = Catalog::default();
        catalog.definitions.insert(
            "A".to_string(),
            SchemaFragment {
                reference: Some("#/definitions/B".to_string()),
                ..SchemaFragment::default()
            },
        );
        catalog.definitions.insert(
            "B".to_string(),
            SchemaFragment {
                reference: Some("#/definitions/A".to_string()),
                ..SchemaFragment::default()
            },
        );
        let start = SchemaFragment {
            reference: Some("#/definitions/A".to_string()),
            ..SchemaFragment::default()
        };
        assert!(matches!(
            catalog.deref_schema(&start),
            Err(SchemaError::BadReference { .. })
        ));
    }

    #[test]
    fn generic_responses_require_success_and_status() {
        let catalog = Catalog::with_generic_responses();
        let failure = catalog.resolve_response("#/responses/GenericFailure").unwrap();
        let schema = failure.schema.as_ref().unwrap();
        assert_eq!(schema.required_names(), ["success".to_string(), "status".to_string()]);
        assert!(schema.properties.as_ref().unwrap().contains_key("error"));
    }
}
