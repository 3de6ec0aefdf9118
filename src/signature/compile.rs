use tracing::{debug, trace};

use super::types::{
    ArrayRules, Bound, CollectionFormat, Constraints, DataSignature, FieldSpec, NumberFormat,
    NumberRules, Pattern, StringFormat, StringRules, ITEMS_KEY,
};
use crate::spec::{truthy, Catalog, Location, Operation, SchemaError, SchemaFragment, SchemaType};
use crate::value::Value;

/// Which half of an operation a signature describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction<'a> {
    /// Request data in the given location
    Incoming(Location),
    /// Response body for the given response key (`"200"`, `"default"`, ...)
    Outgoing(&'a str),
}

/// Compiles schema fragments into [`DataSignature`]s.
///
/// Holds the catalog used for `$ref` resolution and the custom-key prefix.
#[derive(Debug, Clone, Copy)]
pub struct SignatureCompiler<'a> {
    catalog: &'a Catalog,
    prefix: &'a str,
}

impl<'a> SignatureCompiler<'a> {
    pub fn new(catalog: &'a Catalog, prefix: &'a str) -> Self {
        Self { catalog, prefix }
    }

    /// Compile the signature of `operation` for `direction`.
    pub fn compile(
        &self,
        operation: &Operation,
        direction: Direction<'_>,
    ) -> Result<DataSignature, SchemaError> {
        match direction {
            Direction::Incoming(location) => self.compile_incoming(operation, location),
            Direction::Outgoing(status) => self.compile_outgoing(operation, status),
        }
    }

    /// Signature of the parameters declared `in: <location>`.
    ///
    /// For `body` the single body parameter's schema is treated as an object and its
    /// properties become the top-level fields.
    pub fn compile_incoming(
        &self,
        operation: &Operation,
        location: Location,
    ) -> Result<DataSignature, SchemaError> {
        if !Location::INCOMING.contains(&location) {
            return Err(SchemaError::invalid(format!(
                "The incoming qualifier '{}' is not valid. Accepted values are \
                ['header', 'query', 'formData', 'body']",
                location
            )));
        }

        let mut signature = DataSignature::new();
        for declared in &operation.parameters {
            let param = self.catalog.deref_parameter(declared)?;
            let param_location = param.location.ok_or_else(|| {
                SchemaError::missing(format!(
                    "Every parameter must declare 'in'. Parameter given: '{}'",
                    param.name.as_deref().unwrap_or("<unnamed>")
                ))
            })?;
            if param_location != location {
                continue;
            }

            if location == Location::Body {
                trace!("Extracting incoming signature for body");
                let schema = match &param.schema {
                    Some(schema) => schema,
                    None => continue,
                };
                signature.extend(self.object_properties(schema, Location::Body, &mut Vec::new())?);
            } else {
                let name = param.name.as_ref().ok_or_else(|| {
                    SchemaError::missing(format!(
                        "Every '{}' parameter must have a name",
                        location
                    ))
                })?;
                debug!(parameter = %name, location = %location, "Extracting incoming signature");
                signature.insert(
                    name.clone(),
                    self.expand_field(&param.fragment, location, &mut Vec::new())?,
                );
            }
        }
        Ok(signature)
    }

    /// Signature of the JSON body returned for response key `status`.
    ///
    /// Operations that do not produce JSON, declare no responses, or declare a response
    /// without a schema yield an empty signature. A `string` top-level schema also yields an
    /// empty signature; any other non-object type is rejected.
    pub fn compile_outgoing(
        &self,
        operation: &Operation,
        status: &str,
    ) -> Result<DataSignature, SchemaError> {
        match &operation.produces {
            Some(produces) if !produces.is_empty() => {}
            _ => {
                return Err(SchemaError::invalid(
                    "You must specify what kind of data will be returned by the endpoint in \
                    the 'produces' key. Please provide a list of strings.",
                ))
            }
        }
        if !operation.produces_json() {
            debug!("Outgoing data is not JSON; nothing to validate");
            return Ok(DataSignature::new());
        }
        let responses = match &operation.responses {
            Some(responses) => responses,
            None => {
                debug!("No responses declared");
                return Ok(DataSignature::new());
            }
        };
        let declared = responses
            .get(status)
            .ok_or_else(|| SchemaError::UnknownResponse {
                status: status.to_string(),
            })?;
        let response = match &declared.reference {
            Some(reference) => self.catalog.resolve_response(reference)?,
            None => declared,
        };
        let declared_schema = match &response.schema {
            Some(schema) => schema,
            None => {
                debug!(status = %status, "No schema found for response");
                return Ok(DataSignature::new());
            }
        };

        let schema = self.catalog.deref_schema(declared_schema)?;
        match schema.kind.as_deref().unwrap_or("string") {
            "object" => self.object_properties(declared_schema, Location::Body, &mut Vec::new()),
            "string" => {
                debug!(status = %status, "Response declared as a plain string; not validated");
                Ok(DataSignature::new())
            }
            other => Err(SchemaError::UnsupportedResponseSchema {
                status: status.to_string(),
                kind: other.to_string(),
            }),
        }
    }

    /// Compile the properties of a possibly referenced object schema.
    fn object_properties(
        &self,
        schema: &SchemaFragment,
        location: Location,
        expanding: &mut Vec<String>,
    ) -> Result<DataSignature, SchemaError> {
        let entered = enter_reference(schema, expanding)?;
        let result = self
            .catalog
            .deref_schema(schema)
            .and_then(|schema| self.properties_of(schema, location, expanding));
        if entered {
            expanding.pop();
        }
        result
    }

    /// Compile `schema.properties`, with required-ness taken from the schema's `required` list.
    fn properties_of(
        &self,
        schema: &SchemaFragment,
        location: Location,
        expanding: &mut Vec<String>,
    ) -> Result<DataSignature, SchemaError> {
        let mut signature = DataSignature::new();
        if let Some(properties) = &schema.properties {
            let required = schema.required_names();
            for (name, property) in properties {
                let spec = self
                    .expand_field(property, location, expanding)?
                    .required(required.iter().any(|r| r == name));
                signature.insert(name.clone(), spec);
            }
        }
        Ok(signature)
    }

    /// Compile a single field.
    pub fn field_spec(
        &self,
        fragment: &SchemaFragment,
        location: Location,
    ) -> Result<FieldSpec, SchemaError> {
        self.expand_field(fragment, location, &mut Vec::new())
    }

    /// `expanding` holds the `$ref`s whose schemas are being compiled further up the stack.
    fn expand_field(
        &self,
        fragment: &SchemaFragment,
        location: Location,
        expanding: &mut Vec<String>,
    ) -> Result<FieldSpec, SchemaError> {
        let entered = enter_reference(fragment, expanding)?;
        let result = self
            .catalog
            .deref_schema(fragment)
            .and_then(|fragment| self.resolved_field(fragment, location, expanding));
        if entered {
            expanding.pop();
        }
        result
    }

    fn resolved_field(
        &self,
        fragment: &SchemaFragment,
        location: Location,
        expanding: &mut Vec<String>,
    ) -> Result<FieldSpec, SchemaError> {
        let declared = fragment
            .kind
            .as_deref()
            .ok_or_else(|| SchemaError::missing("Every parameter must have a type."))?;
        let not_allowed = || {
            SchemaError::invalid(format!(
                "Parameter of type '{}' not allowed as a 'in={}' parameter.",
                declared, location
            ))
        };
        let kind: SchemaType = declared.parse().map_err(|_| not_allowed())?;
        if !location.allowed_types().contains(&kind) {
            return Err(not_allowed());
        }

        let required = matches!(fragment.required, Some(crate::spec::Required::Flag(true)));
        let mut spec = FieldSpec::new(kind)
            .required(required)
            .nullable(fragment.nullable.unwrap_or(true))
            .obscure(fragment.extension(self.prefix, "obscure").is_some_and(truthy))
            .with_constraints(self.constraints(fragment, kind, location)?);
        spec.allow_empty_value = fragment.allow_empty_value;
        spec.default = fragment.default.clone().map(Value::from);
        spec.enum_values = fragment
            .enum_values
            .as_ref()
            .map(|values| values.iter().map(Value::from).collect());

        match kind {
            SchemaType::Object => {
                if fragment.properties.is_some() {
                    spec.child = Some(self.properties_of(fragment, location, expanding)?);
                }
            }
            SchemaType::Array => {
                if let Some(items) = &fragment.items {
                    let mut child = DataSignature::new();
                    child.insert(ITEMS_KEY, self.expand_field(items, location, expanding)?);
                    spec.child = Some(child);
                }
            }
            _ => {}
        }
        Ok(spec)
    }

    fn constraints(
        &self,
        fragment: &SchemaFragment,
        kind: SchemaType,
        location: Location,
    ) -> Result<Constraints, SchemaError> {
        let constraints = match kind {
            SchemaType::String => {
                let format = match fragment.format.as_deref() {
                    None => None,
                    Some("date") => Some(StringFormat::Date),
                    Some("datetime") => Some(StringFormat::DateTime),
                    Some("byte") => {
                        return Err(SchemaError::invalid(
                            "String format 'byte' is not supported",
                        ))
                    }
                    Some(_) => {
                        return Err(SchemaError::invalid(
                            "'format' key for parameter of type 'string' must be one of the \
                            following values: ['byte', 'date', 'datetime']",
                        ))
                    }
                };
                let pattern = fragment
                    .pattern
                    .as_deref()
                    .map(|p| {
                        Pattern::new(p).map_err(|e| {
                            SchemaError::invalid(format!("Invalid 'pattern' '{}': {}", p, e))
                        })
                    })
                    .transpose()?;
                Constraints::String(StringRules {
                    format,
                    pattern,
                    min_length: fragment.min_length,
                    max_length: fragment.max_length,
                })
            }
            SchemaType::Integer => {
                let bound = |name: &str, value: &Option<serde_json::Number>| match value {
                    None => Ok(None),
                    Some(n) if n.is_i64() || n.is_u64() => Ok(Bound::from_number(n)),
                    Some(_) => Err(SchemaError::invalid(format!(
                        "'{}' key for parameter of type 'integer' must be an integer",
                        name
                    ))),
                };
                Constraints::Number(NumberRules {
                    format: NumberFormat::Integer,
                    minimum: bound("minimum", &fragment.minimum)?,
                    maximum: bound("maximum", &fragment.maximum)?,
                    exclusive_minimum: fragment.exclusive_minimum.unwrap_or(false),
                    exclusive_maximum: fragment.exclusive_maximum.unwrap_or(false),
                })
            }
            SchemaType::Number => {
                let format = match fragment.format.as_deref() {
                    None => {
                        return Err(SchemaError::missing(
                            "Parameter of type 'number' must have key 'format' defined.",
                        ))
                    }
                    Some("float") => NumberFormat::Float,
                    Some("double") => NumberFormat::Double,
                    Some("long") => NumberFormat::Long,
                    Some(_) => {
                        return Err(SchemaError::invalid(
                            "'format' key for parameter of type 'number' must be one of the \
                            following values: ['float', 'long', 'double']",
                        ))
                    }
                };
                Constraints::Number(NumberRules {
                    format,
                    minimum: fragment.minimum.as_ref().and_then(Bound::from_number),
                    maximum: fragment.maximum.as_ref().and_then(Bound::from_number),
                    exclusive_minimum: fragment.exclusive_minimum.unwrap_or(false),
                    exclusive_maximum: fragment.exclusive_maximum.unwrap_or(false),
                })
            }
            SchemaType::Array => {
                let collection_format = if location == Location::Body {
                    None
                } else {
                    let name = fragment.collection_format.as_deref().ok_or_else(|| {
                        SchemaError::missing(
                            "Parameter of type 'array' must have key 'collectionFormat' defined.",
                        )
                    })?;
                    Some(CollectionFormat::parse(name).ok_or_else(|| {
                        SchemaError::invalid(format!(
                            "'collectionFormat' key for parameter of type 'array' must be one \
                            of the following values: {:?}",
                            CollectionFormat::NAMES
                        ))
                    })?)
                };
                Constraints::Array(ArrayRules {
                    collection_format,
                    min_items: fragment.min_items,
                    max_items: fragment.max_items,
                    unique_items: fragment.unique_items.unwrap_or(false),
                })
            }
            SchemaType::Boolean | SchemaType::Object => Constraints::None,
        };
        Ok(constraints)
    }
}

/// Push `fragment`'s `$ref` onto the expansion stack. Returns whether anything was pushed.
fn enter_reference(
    fragment: &SchemaFragment,
    expanding: &mut Vec<String>,
) -> Result<bool, SchemaError> {
    let Some(reference) = &fragment.reference else {
        return Ok(false);
    };
    if expanding.contains(reference) {
        return Err(SchemaError::bad_reference(format!(
            "Reference '{}' is circular: the schema contains itself",
            reference
        )));
    }
    expanding.push(reference.clone());
    Ok(true)
}
