use anyhow::Context;
use std::path::Path;

use super::catalog::Catalog;
use super::error::SchemaError;
use super::types::Operation;

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn read_document<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema document {}", path.display()))?;
    let parsed = if is_yaml(path) {
        serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML in {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON in {}", path.display()))?
    };
    Ok(parsed)
}

/// Load a definitions catalog from a `.yaml`/`.yml` or JSON file.
///
/// The generic success/failure responses are added unless the file defines its own.
pub fn load_catalog(path: impl AsRef<Path>) -> anyhow::Result<Catalog> {
    let mut catalog: Catalog = read_document(path.as_ref())?;
    catalog.add_generic_responses();
    Ok(catalog)
}

/// Load a single operation definition from a `.yaml`/`.yml` or JSON file.
pub fn load_operation(path: impl AsRef<Path>) -> anyhow::Result<Operation> {
    read_document(path.as_ref())
}

impl Catalog {
    /// Parse a catalog from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, SchemaError> {
        let mut catalog: Catalog = serde_yaml::from_str(text).map_err(|e| SchemaError::Parse {
            reason: e.to_string(),
        })?;
        catalog.add_generic_responses();
        Ok(catalog)
    }
}
