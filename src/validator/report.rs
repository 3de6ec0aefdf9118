use serde::Serialize;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use crate::spec::SchemaType;

/// Outcome for one field of a signature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldReport {
    pub valid: bool,
    /// Whether the key was present in the data at all
    pub found: bool,
    #[serde(rename = "type")]
    pub kind: SchemaType,
    /// Reports of the nested object, or one report per array element
    #[serde(rename = "items", skip_serializing_if = "Option::is_none")]
    pub nested: Option<NestedReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FieldReport {
    pub(crate) fn new(kind: SchemaType) -> Self {
        Self {
            valid: false,
            found: false,
            kind,
            nested: None,
            message: None,
        }
    }

    /// This entry and everything below it is valid.
    #[must_use]
    pub fn all_valid(&self) -> bool {
        self.valid
            && match &self.nested {
                None => true,
                Some(NestedReport::Object(report)) => report.all_valid(),
                Some(NestedReport::Array(reports)) => reports.iter().all(ValidationReport::all_valid),
            }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NestedReport {
    Object(ValidationReport),
    Array(Vec<ValidationReport>),
}

/// Result of validating a data mapping against a signature.
///
/// Mirrors the signature's keys. `Display` renders the client-facing summary:
///
/// ```text
/// The following errors were encountered ||   Missing value for 'id' in given data  ||  'age' in given data: Value must be greater than or equal to 0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    entries: BTreeMap<String, FieldReport>,
    #[serde(skip)]
    all_valid: bool,
}

impl ValidationReport {
    pub(crate) fn from_entries(entries: BTreeMap<String, FieldReport>) -> Self {
        let all_valid = entries.values().all(FieldReport::all_valid);
        Self { entries, all_valid }
    }

    /// Every entry, including nested reports, is valid.
    #[must_use]
    pub fn all_valid(&self) -> bool {
        self.all_valid
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldReport> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldReport> {
        self.entries.iter()
    }

    /// `Missing value for ...` lines, depth first.
    #[must_use]
    pub fn missing_keys(&self) -> Vec<String> {
        let mut issues = Vec::new();
        self.collect_missing(None, &mut issues);
        issues
    }

    /// `'<key>' in <parent>: <message>` lines, depth first.
    #[must_use]
    pub fn data_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        self.collect_issues(None, &mut issues);
        issues
    }

    fn collect_missing(&self, parent: Option<&str>, out: &mut Vec<String>) {
        for (key, entry) in &self.entries {
            if !entry.valid && !entry.found {
                out.push(format!(
                    "Missing value for '{}' in {}",
                    key,
                    parent.unwrap_or("given data")
                ));
            }
            match &entry.nested {
                Some(NestedReport::Array(reports)) => {
                    let name = nested_name("Array", key, false, parent);
                    for report in reports {
                        report.collect_missing(Some(&name), out);
                    }
                }
                Some(NestedReport::Object(report)) => {
                    let name = nested_name("Object", key, false, parent);
                    report.collect_missing(Some(&name), out);
                }
                None => {}
            }
        }
    }

    fn collect_issues(&self, parent: Option<&str>, out: &mut Vec<String>) {
        for (key, entry) in &self.entries {
            if let (false, true, Some(message)) = (entry.valid, entry.found, &entry.message) {
                out.push(format!(
                    "'{}' in {}: {}",
                    key,
                    parent.unwrap_or("given data"),
                    message
                ));
            }
            match &entry.nested {
                Some(NestedReport::Array(reports)) => {
                    let name = nested_name("Array", key, true, parent);
                    for report in reports {
                        report.collect_issues(Some(&name), out);
                    }
                }
                Some(NestedReport::Object(report)) => {
                    let name = nested_name("Object", key, true, parent);
                    report.collect_issues(Some(&name), out);
                }
                None => {}
            }
        }
    }
}

fn nested_name(kind: &str, key: &str, quoted: bool, parent: Option<&str>) -> String {
    let mut name = if quoted {
        format!("{} '{}'", kind, key)
    } else {
        format!("{} {}", kind, key)
    };
    if let Some(outer) = parent {
        name.push_str(" in ");
        name.push_str(outer);
    }
    name
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.all_valid {
            return f.write_str("No validation issues.");
        }
        let mut issues = self.missing_keys();
        issues.extend(self.data_issues());
        write!(
            f,
            "The following errors were encountered ||   {}",
            issues.join("  ||  ")
        )
    }
}

impl<'a> IntoIterator for &'a ValidationReport {
    type Item = (&'a String, &'a FieldReport);
    type IntoIter = btree_map::Iter<'a, String, FieldReport>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
