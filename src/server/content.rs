//! Content-type handling for request bodies.
//!
//! Each supported media type has a [`ContentParser`] that turns a [`RequestBody`] into request
//! data and names the schema location that data is validated against. [`ContentParsers`] is the
//! registry consulted by the content augmentation; it starts with the four built-in parsers and
//! accepts more through [`ContentParsers::register`].

use http::Method;
use std::collections::HashMap;
use std::sync::Arc;

use super::request::RequestBody;
use crate::spec::Location;
use crate::value::{Map, Value};

pub const APPLICATION_JSON: &str = "application/json";
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";
pub const TEXT_PLAIN: &str = "text/plain";

/// Content types accepted on methods that carry a body.
pub const BODY_CONTENT_TYPES: [&str; 4] = [
    APPLICATION_JSON,
    FORM_URLENCODED,
    MULTIPART_FORM_DATA,
    TEXT_PLAIN,
];

/// Content types a method allows; `None` means any registered type.
#[must_use]
pub fn allowed_content_types(method: &Method) -> Option<&'static [&'static str]> {
    if method == Method::POST
        || method == Method::PUT
        || method == Method::PATCH
        || method == Method::DELETE
    {
        Some(&BODY_CONTENT_TYPES)
    } else {
        None
    }
}

/// Result of parsing a body.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedContent {
    pub data: Value,
    /// Body text as received, when it arrived unparsed
    pub original_body: Option<String>,
}

/// Parser for one media type.
pub trait ContentParser: Send + Sync {
    /// Media type handled, lower case, without parameters.
    fn content_type(&self) -> &str;

    /// Schema location the parsed data is validated against.
    fn location(&self) -> Location;

    /// Decode the body. The error string is a short reason.
    fn parse(&self, body: &RequestBody) -> Result<ParsedContent, String>;
}

/// `application/json`: the body must decode to a JSON object.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonParser;

impl ContentParser for JsonParser {
    fn content_type(&self) -> &str {
        APPLICATION_JSON
    }

    fn location(&self) -> Location {
        Location::Body
    }

    fn parse(&self, body: &RequestBody) -> Result<ParsedContent, String> {
        match body {
            RequestBody::Empty => Err("request body is empty".to_string()),
            RequestBody::Parsed(map) => Ok(ParsedContent {
                data: Value::Object(map.clone()),
                original_body: None,
            }),
            RequestBody::Raw(text) => {
                let decoded: serde_json::Value =
                    serde_json::from_str(text).map_err(|e| e.to_string())?;
                if !decoded.is_object() {
                    return Err("JSON body is not an object".to_string());
                }
                Ok(ParsedContent {
                    data: Value::from(decoded),
                    original_body: Some(text.clone()),
                })
            }
        }
    }
}

/// Form encodings: either fields pre-parsed by the transport or urlencoded text.
#[derive(Debug, Clone)]
pub struct FormParser {
    content_type: &'static str,
}

impl FormParser {
    #[must_use]
    pub fn urlencoded() -> Self {
        Self {
            content_type: FORM_URLENCODED,
        }
    }

    #[must_use]
    pub fn multipart() -> Self {
        Self {
            content_type: MULTIPART_FORM_DATA,
        }
    }
}

impl ContentParser for FormParser {
    fn content_type(&self) -> &str {
        self.content_type
    }

    fn location(&self) -> Location {
        Location::FormData
    }

    fn parse(&self, body: &RequestBody) -> Result<ParsedContent, String> {
        match body {
            RequestBody::Empty => Ok(ParsedContent {
                data: Value::Object(Map::new()),
                original_body: None,
            }),
            RequestBody::Parsed(map) => Ok(ParsedContent {
                data: Value::Object(map.clone()),
                original_body: None,
            }),
            RequestBody::Raw(text) => Ok(ParsedContent {
                data: Value::Object(parse_urlencoded(text)),
                original_body: Some(text.clone()),
            }),
        }
    }
}

/// `text/plain`: the body is kept as a string.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextParser;

impl ContentParser for TextParser {
    fn content_type(&self) -> &str {
        TEXT_PLAIN
    }

    fn location(&self) -> Location {
        Location::Body
    }

    fn parse(&self, body: &RequestBody) -> Result<ParsedContent, String> {
        match body {
            RequestBody::Empty => Ok(ParsedContent {
                data: Value::String(String::new()),
                original_body: None,
            }),
            RequestBody::Raw(text) => Ok(ParsedContent {
                data: Value::String(text.clone()),
                original_body: Some(text.clone()),
            }),
            RequestBody::Parsed(_) => Err("expected a text body".to_string()),
        }
    }
}

/// Decode `a=1&b=x` into a mapping of strings. Later duplicates win.
#[must_use]
pub fn parse_urlencoded(input: &str) -> Map {
    url::form_urlencoded::parse(input.as_bytes())
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect()
}

/// Registry of content parsers keyed by media type.
#[derive(Clone)]
pub struct ContentParsers {
    parsers: HashMap<String, Arc<dyn ContentParser>>,
}

impl ContentParsers {
    /// Registry without any parser.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Registry with the JSON, urlencoded, multipart and text parsers.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut parsers = Self::empty();
        parsers.register(Arc::new(JsonParser));
        parsers.register(Arc::new(FormParser::urlencoded()));
        parsers.register(Arc::new(FormParser::multipart()));
        parsers.register(Arc::new(TextParser));
        parsers
    }

    /// Add or replace the parser for its media type.
    pub fn register(&mut self, parser: Arc<dyn ContentParser>) {
        self.parsers
            .insert(parser.content_type().to_ascii_lowercase(), parser);
    }

    #[must_use]
    pub fn get(&self, content_type: &str) -> Option<&Arc<dyn ContentParser>> {
        self.parsers.get(content_type)
    }

    #[must_use]
    pub fn location_for(&self, content_type: &str) -> Option<Location> {
        self.get(content_type).map(|p| p.location())
    }

    /// Registered media types, sorted.
    #[must_use]
    pub fn content_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl Default for ContentParsers {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for ContentParsers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentParsers")
            .field("content_types", &self.content_types())
            .finish()
    }
}

/// Media type of a `Content-Type` header value: lower case, parameters dropped.
#[must_use]
pub fn media_type(header_value: &str) -> String {
    header_value
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}
