use smallvec::SmallVec;
use std::sync::Arc;

use crate::value::{map_from_json, Map};

/// Headers stored inline before spilling to the heap.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header list, `(name, value)` in arrival order.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Request body as handed over by the transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Unparsed body text
    Raw(String),
    /// Body already decoded into a mapping (form fields, JSON object)
    Parsed(Map),
}

/// Inbound request descriptor supplied by the hosting transport.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    /// Method as received; normalized during context creation
    pub method: String,
    /// Request URI, optionally with a `?query` part
    pub uri: String,
    pub headers: HeaderVec,
    pub body: RequestBody,
    pub remote_addr: Option<String>,
}

impl RawRequest {
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Raw body text.
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_body(RequestBody::Raw(text.into()))
    }

    /// JSON body with a matching `Content-Type` header.
    #[must_use]
    pub fn with_json(self, body: &serde_json::Value) -> Self {
        self.with_header("Content-Type", "application/json")
            .with_text(body.to_string())
    }

    /// Form fields already decoded by the transport.
    #[must_use]
    pub fn with_form(self, fields: serde_json::Value) -> Self {
        self.with_header("Content-Type", "application/x-www-form-urlencoded")
            .with_body(RequestBody::Parsed(map_from_json(fields)))
    }

    #[must_use]
    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    /// URI without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.split('?').next().unwrap_or("")
    }

    /// Query string without the leading `?`; empty when absent.
    #[must_use]
    pub fn query(&self) -> &str {
        self.uri.split_once('?').map(|(_, q)| q).unwrap_or("")
    }
}
