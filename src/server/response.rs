use anyhow::Context;
use http::{HeaderName, HeaderValue, StatusCode};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::UnknownStatus;
use super::request::HeaderVec;
use crate::value::{Map, Value};

/// Primary content of a response. Exactly one kind per response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Html(String),
    Json(Map),
    /// Path of a file whose contents are sent
    File(PathBuf),
    Bytes(Vec<u8>),
    /// Plain text
    Text(String),
}

/// Response descriptor returned to the hosting transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub payload: Payload,
    /// Overrides the payload's default content type
    pub content_type: Option<String>,
    pub status: StatusCode,
    pub headers: HeaderVec,
}

/// Status given either as a numeric code or as its reason phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpStatus {
    Code(u16),
    Reason(String),
}

impl From<u16> for HttpStatus {
    fn from(code: u16) -> Self {
        HttpStatus::Code(code)
    }
}

impl From<StatusCode> for HttpStatus {
    fn from(code: StatusCode) -> Self {
        HttpStatus::Code(code.as_u16())
    }
}

impl From<&str> for HttpStatus {
    fn from(reason: &str) -> Self {
        HttpStatus::Reason(reason.to_string())
    }
}

/// Reason phrase for a code, including the two non-standard codes this crate answers with.
#[must_use]
pub fn reason_phrase(code: u16) -> Option<&'static str> {
    match code {
        418 => Some("I'm a Teapot"),
        218 => Some("Coffee Brewing"),
        _ => StatusCode::from_u16(code).ok()?.canonical_reason(),
    }
}

/// Code for a reason phrase, compared case-insensitively.
#[must_use]
pub fn code_for_reason(reason: &str) -> Option<u16> {
    (100..600).find(|code| reason_phrase(*code).is_some_and(|r| r.eq_ignore_ascii_case(reason)))
}

impl Response {
    fn with_payload(payload: Payload) -> Self {
        Self {
            payload,
            content_type: None,
            status: StatusCode::OK,
            headers: HeaderVec::new(),
        }
    }

    /// Standard JSON envelope: `{status, success, message?}` merged with `data`.
    ///
    /// `status` is upper-cased. Keys in `data` win over the envelope keys.
    #[must_use]
    pub fn json(status: &str, success: bool, message: Option<&str>, data: Map) -> Self {
        let mut body = Map::new();
        body.insert("status".to_string(), Value::String(status.to_uppercase()));
        body.insert("success".to_string(), Value::Bool(success));
        if let Some(message) = message {
            body.insert("message".to_string(), Value::String(message.to_string()));
        }
        body.extend(data);
        Self::with_payload(Payload::Json(body))
    }

    #[must_use]
    pub fn success(message: &str) -> Self {
        Self::json("success", true, Some(message), Map::new())
    }

    #[must_use]
    pub fn failure(message: &str) -> Self {
        Self::json("failure", false, Some(message), Map::new())
    }

    #[must_use]
    pub fn html(html: impl Into<String>) -> Self {
        Self::with_payload(Payload::Html(html.into()))
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::with_payload(Payload::Text(text.into()))
    }

    #[must_use]
    pub fn bytes(bytes: Vec<u8>) -> Self {
        Self::with_payload(Payload::Bytes(bytes))
    }

    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::with_payload(Payload::File(path.into()))
    }

    /// Set the status from a code or reason phrase and answer with `"<code> <reason>"`.
    pub fn http_status(status: impl Into<HttpStatus>) -> Result<Self, UnknownStatus> {
        let status = status.into();
        let (code, reason) = match &status {
            HttpStatus::Code(code) => (Some(*code), reason_phrase(*code)),
            HttpStatus::Reason(text) => {
                let code = code_for_reason(text);
                (code, code.and_then(reason_phrase))
            }
        };
        let unknown = || UnknownStatus {
            input: match &status {
                HttpStatus::Code(code) => code.to_string(),
                HttpStatus::Reason(text) => text.clone(),
            },
        };
        let (code, reason) = match (code, reason) {
            (Some(code), Some(reason)) => (code, reason),
            _ => return Err(unknown()),
        };
        let status_code = StatusCode::from_u16(code).map_err(|_| unknown())?;
        Ok(Self::text(format!("{} {}", code, reason)).with_status(status_code))
    }

    /// Plain `"<code> <reason>"` response for a known status.
    #[must_use]
    pub fn status_only(status: StatusCode) -> Self {
        let reason = reason_phrase(status.as_u16()).unwrap_or("");
        Self::text(format!("{} {}", status.as_u16(), reason)).with_status(status)
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Add or replace a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some(slot) => slot.1 = value,
            None => self.headers.push((Arc::from(name), value)),
        }
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn is_json(&self) -> bool {
        matches!(self.payload, Payload::Json(_))
    }

    #[must_use]
    pub fn json_body(&self) -> Option<&Map> {
        match &self.payload {
            Payload::Json(map) => Some(map),
            _ => None,
        }
    }

    pub fn json_body_mut(&mut self) -> Option<&mut Map> {
        match &mut self.payload {
            Payload::Json(map) => Some(map),
            _ => None,
        }
    }

    /// Whether the JSON envelope reports `success: true`.
    #[must_use]
    pub fn reports_success(&self) -> bool {
        self.json_body()
            .and_then(|body| body.get("success"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Content type sent when no override is set.
    #[must_use]
    pub fn default_content_type(&self) -> &'static str {
        match &self.payload {
            Payload::Html(_) => "text/html",
            Payload::Json(_) => "application/json",
            Payload::File(path) => file_content_type(path),
            Payload::Bytes(_) => "application/octet-stream",
            Payload::Text(_) => "text/plain",
        }
    }

    #[must_use]
    pub fn effective_content_type(&self) -> &str {
        self.content_type
            .as_deref()
            .unwrap_or_else(|| self.default_content_type())
    }

    /// Render into an `http::Response`, reading file payloads from disk.
    pub fn into_http(self) -> anyhow::Result<http::Response<Vec<u8>>> {
        let content_type = self.effective_content_type().to_string();
        let body = match self.payload {
            Payload::Html(s) | Payload::Text(s) => s.into_bytes(),
            Payload::Json(map) => serde_json::to_vec(&map).context("serializing JSON payload")?,
            Payload::File(path) => std::fs::read(&path)
                .with_context(|| format!("reading response file {}", path.display()))?,
            Payload::Bytes(bytes) => bytes,
        };

        let mut response = http::Response::builder()
            .status(self.status)
            .header(http::header::CONTENT_TYPE, content_type)
            .body(body)
            .context("building HTTP response")?;
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("invalid header name '{}'", name))?;
            let value = HeaderValue::from_str(value)
                .with_context(|| format!("invalid value for header '{}'", name))?;
            response.headers_mut().insert(name, value);
        }
        Ok(response)
    }
}

fn file_content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase()
        .as_str()
    {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "yaml" | "yml" => "application/yaml",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
