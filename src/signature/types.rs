use regex::Regex;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use crate::spec::SchemaType;
use crate::value::Value;

/// Key under which an array's item spec is stored in its child signature.
///
/// Array elements are validated by wrapping each one as `{"items": element}` and running the
/// ordinary record validator over it.
pub const ITEMS_KEY: &str = "items";

/// `format` values accepted on `string` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    Date,
    DateTime,
}

impl StringFormat {
    /// The format as written in schema-facing messages.
    #[must_use]
    pub fn pattern(&self) -> &'static str {
        match self {
            StringFormat::Date => "yyyy-MM-dd",
            StringFormat::DateTime => "yyyy-MM-dd'T'HH:mm:ss XXX",
        }
    }
}

/// Native numeric subtype required by a `number`/`integer` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    Integer,
    Long,
    Float,
    Double,
}

impl NumberFormat {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            NumberFormat::Integer => "integer",
            NumberFormat::Long => "long",
            NumberFormat::Float => "float",
            NumberFormat::Double => "double",
        }
    }

    /// Integral formats hold `Value::Integer`, the others `Value::Float`.
    #[must_use]
    pub fn is_integral(&self) -> bool {
        matches!(self, NumberFormat::Integer | NumberFormat::Long)
    }
}

/// How a non-body array is serialized into a single string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionFormat {
    Csv,
    Ssv,
    Pipes,
}

impl CollectionFormat {
    pub const NAMES: [&'static str; 3] = ["csv", "ssv", "pipes"];

    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "csv" => Some(CollectionFormat::Csv),
            "ssv" => Some(CollectionFormat::Ssv),
            "pipes" => Some(CollectionFormat::Pipes),
            _ => None,
        }
    }

    #[must_use]
    pub fn delimiter(&self) -> char {
        match self {
            CollectionFormat::Csv => ',',
            CollectionFormat::Ssv => ' ',
            CollectionFormat::Pipes => '|',
        }
    }
}

/// A compiled `pattern`, matched against the whole string.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{})$", source))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringRules {
    pub format: Option<StringFormat>,
    pub pattern: Option<Pattern>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
}

/// A `minimum`/`maximum` bound, kept integral when the schema wrote an integer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Integer(i64),
    Float(f64),
}

impl Bound {
    /// Bound as written in a schema document.
    #[must_use]
    pub fn from_number(n: &serde_json::Number) -> Option<Self> {
        match n.as_i64() {
            Some(i) => Some(Bound::Integer(i)),
            None => n.as_f64().map(Bound::Float),
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match *self {
            Bound::Integer(i) => i as f64,
            Bound::Float(f) => f,
        }
    }
}

impl From<i64> for Bound {
    fn from(i: i64) -> Self {
        Bound::Integer(i)
    }
}

impl From<f64> for Bound {
    fn from(f: f64) -> Self {
        Bound::Float(f)
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Integer(i) => write!(f, "{}", i),
            Bound::Float(x) => write!(f, "{}", x),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberRules {
    pub format: NumberFormat,
    pub minimum: Option<Bound>,
    pub maximum: Option<Bound>,
    pub exclusive_minimum: bool,
    pub exclusive_maximum: bool,
}

impl NumberRules {
    #[must_use]
    pub fn new(format: NumberFormat) -> Self {
        Self {
            format,
            minimum: None,
            maximum: None,
            exclusive_minimum: false,
            exclusive_maximum: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayRules {
    pub collection_format: Option<CollectionFormat>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
}

/// Type-dependent constraints of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraints {
    None,
    String(StringRules),
    Number(NumberRules),
    Array(ArrayRules),
}

impl Constraints {
    /// Unconstrained rules for a type.
    #[must_use]
    pub fn for_type(kind: SchemaType) -> Self {
        match kind {
            SchemaType::String => Constraints::String(StringRules::default()),
            SchemaType::Integer => Constraints::Number(NumberRules::new(NumberFormat::Integer)),
            SchemaType::Number => Constraints::Number(NumberRules::new(NumberFormat::Float)),
            SchemaType::Array => Constraints::Array(ArrayRules::default()),
            SchemaType::Boolean | SchemaType::Object => Constraints::None,
        }
    }
}

/// Compiled description of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub kind: SchemaType,
    pub required: bool,
    pub nullable: bool,
    pub default: Option<Value>,
    pub enum_values: Option<Vec<Value>>,
    /// Replace the value with the redaction sentinel before logging
    pub obscure: bool,
    pub allow_empty_value: Option<bool>,
    pub constraints: Constraints,
    /// Item spec (under [`ITEMS_KEY`]) for arrays, properties for objects
    pub child: Option<DataSignature>,
}

impl FieldSpec {
    /// Optional, nullable field of the given type with no constraints.
    #[must_use]
    pub fn new(kind: SchemaType) -> Self {
        Self {
            kind,
            required: false,
            nullable: true,
            default: None,
            enum_values: None,
            obscure: false,
            allow_empty_value: None,
            constraints: Constraints::for_type(kind),
            child: None,
        }
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    #[must_use]
    pub fn obscure(mut self, obscure: bool) -> Self {
        self.obscure = obscure;
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_enum(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }

    #[must_use]
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: DataSignature) -> Self {
        self.child = Some(child);
        self
    }

    /// Array field whose elements follow `item`.
    #[must_use]
    pub fn array_of(item: FieldSpec) -> Self {
        let mut child = DataSignature::new();
        child.insert(ITEMS_KEY, item);
        Self::new(SchemaType::Array).with_child(child)
    }

    #[must_use]
    pub fn string_rules(&self) -> Option<&StringRules> {
        match &self.constraints {
            Constraints::String(rules) => Some(rules),
            _ => None,
        }
    }

    #[must_use]
    pub fn number_rules(&self) -> Option<&NumberRules> {
        match &self.constraints {
            Constraints::Number(rules) => Some(rules),
            _ => None,
        }
    }

    #[must_use]
    pub fn array_rules(&self) -> Option<&ArrayRules> {
        match &self.constraints {
            Constraints::Array(rules) => Some(rules),
            _ => None,
        }
    }
}

/// Field name to [`FieldSpec`] mapping, iterated in key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSignature {
    fields: BTreeMap<String, FieldSpec>,
}

impl DataSignature {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, spec: FieldSpec) -> Option<FieldSpec> {
        self.fields.insert(name.into(), spec)
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.insert(name, spec);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldSpec> {
        self.fields.get_mut(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldSpec> {
        self.fields.iter()
    }

    /// Merge another signature in; fields of `other` win.
    pub fn extend(&mut self, other: DataSignature) {
        self.fields.extend(other.fields);
    }
}

impl<'a> IntoIterator for &'a DataSignature {
    type Item = (&'a String, &'a FieldSpec);
    type IntoIter = btree_map::Iter<'a, String, FieldSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl FromIterator<(String, FieldSpec)> for DataSignature {
    fn from_iter<I: IntoIterator<Item = (String, FieldSpec)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
