use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::simple::{AllowAll, AllowNone, ApiKeyHeader};
use super::{AuthEntry, Authenticator};
use crate::spec::{Operation, SchemaError};
use crate::value::{Map, Value};

/// Authenticators addressable by name from an operation's `{prefix}auth` list.
#[derive(Clone, Default)]
pub struct AuthRegistry {
    authenticators: HashMap<String, Arc<dyn Authenticator>>,
}

impl AuthRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `allowAll`, `allowNone` and `allowWithApiKeyHeader`.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(AllowAll);
        registry.register(AllowNone);
        registry.register(ApiKeyHeader::new());
        registry
    }

    /// Register under the authenticator's own name.
    pub fn register(&mut self, authenticator: impl Authenticator + 'static) {
        let authenticator: Arc<dyn Authenticator> = Arc::new(authenticator);
        self.register_as(authenticator.name().to_string(), authenticator);
    }

    pub fn register_as(&mut self, name: impl Into<String>, authenticator: Arc<dyn Authenticator>) {
        let name = name.into();
        debug!(authenticator = %name, "Registered authenticator");
        self.authenticators.insert(name, authenticator);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Authenticator>> {
        self.authenticators.get(name)
    }

    /// Build the chain declared under `{prefix}auth`.
    ///
    /// The key must hold a non-empty list of `{method, extraArgs?}` objects whose `method` names
    /// a registered authenticator.
    pub fn resolve_chain(
        &self,
        operation: &Operation,
        prefix: &str,
    ) -> Result<Vec<AuthEntry>, SchemaError> {
        let declared = operation
            .extension(prefix, "auth")
            .and_then(|v| v.as_array())
            .ok_or_else(|| SchemaError::CustomPropertyMissing {
                reason: format!(
                    "The operation must contain a list in the custom '{}auth' key.",
                    prefix
                ),
            })?;
        if declared.is_empty() || declared.iter().any(|e| !e.is_object()) {
            return Err(invalid(format!(
                "The custom key '{}auth' must be a non-empty list of objects.",
                prefix
            )));
        }

        declared
            .iter()
            .map(|entry| {
                let name = entry
                    .get("method")
                    .and_then(|m| m.as_str())
                    .ok_or_else(|| {
                        invalid("Every 'auth' entry needs a 'method' naming an authenticator.")
                    })?;
                let authenticator = self
                    .get(name)
                    .ok_or_else(|| invalid(format!("Unknown authenticator '{}'.", name)))?;
                let extra_args: Map = match entry.get("extraArgs") {
                    None | Some(serde_json::Value::Null) => Map::new(),
                    Some(serde_json::Value::Object(args)) => args
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::from(v)))
                        .collect(),
                    Some(_) => {
                        return Err(invalid(format!(
                            "'extraArgs' of authenticator '{}' must be an object.",
                            name
                        )))
                    }
                };
                Ok(AuthEntry {
                    authenticator: Arc::clone(authenticator),
                    extra_args,
                })
            })
            .collect()
    }
}

fn invalid(reason: impl Into<String>) -> SchemaError {
    SchemaError::CustomPropertyInvalid {
        reason: reason.into(),
    }
}

impl std::fmt::Debug for AuthRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.authenticators.keys().collect();
        names.sort();
        f.debug_struct("AuthRegistry")
            .field("authenticators", &names)
            .finish()
    }
}
