//! Per-request state shared by authentication, validation and handler logic.
//!
//! A [`RequestContext`] is built from a [`RawRequest`] in steps called augmentations. Each one
//! derives part of the context and may depend on others:
//!
//! | Augmentation | Depends on | Produces |
//! |---|---|---|
//! | headers | - | case-preserved and lower-cased header maps |
//! | uri | - | file extension, base segments, resource path |
//! | http-method | headers | original and effective method |
//! | content | headers, http-method | parsed request data |
//! | url-params | - | query parameters |
//!
//! Running an augmentation twice without `force`, or before its dependencies, is an error.

use http::Method;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

use super::content::{allowed_content_types, parse_urlencoded, ContentParsers};
use super::error::RequestError;
use super::request::{HeaderVec, RawRequest, RequestBody};
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::router::HTTP_METHODS;
use crate::security::AuthResult;
use crate::spec::Location;
use crate::value::{Map, Value};

/// Header that replaces the effective method of a POST request.
pub const METHOD_OVERRIDE_HEADER: &str = "x-http-method-override";

/// One step of context construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Augmentation {
    Headers,
    Uri,
    HttpMethod,
    Content,
    UrlParams,
}

impl Augmentation {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Augmentation::Headers => "headers",
            Augmentation::Uri => "uri",
            Augmentation::HttpMethod => "httpmethod",
            Augmentation::Content => "content",
            Augmentation::UrlParams => "urlparams",
        }
    }

    /// Augmentations that must have completed first.
    #[must_use]
    pub fn dependencies(&self) -> &'static [Augmentation] {
        match self {
            Augmentation::HttpMethod => &[Augmentation::Headers],
            Augmentation::Content => &[Augmentation::Headers, Augmentation::HttpMethod],
            Augmentation::Headers | Augmentation::Uri | Augmentation::UrlParams => &[],
        }
    }
}

impl fmt::Display for Augmentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything known about one request while it is being processed.
#[derive(Debug)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub remote_addr: Option<String>,
    pub uri: String,
    /// Headers with their names as received
    pub headers: Map,
    /// Headers keyed by lower-cased name
    pub headers_lc: Map,
    /// Method as received, upper case
    pub original_method: String,
    /// Method used for handler lookup, after the override header
    pub method: Method,
    /// Lower-cased extension stripped from the last path segment
    pub file_extension: Option<String>,
    pub uri_base: Vec<String>,
    /// Path segments below the base path
    pub resource_path: Vec<String>,
    /// Query string parameters
    pub params: Map,
    /// Parsed request data: query parameters for GET, the parsed body otherwise
    pub data: Value,
    /// Location the request data is validated against
    pub data_location: Option<Location>,
    /// Media type the body was parsed as
    pub content_type: Option<String>,
    pub original_body: Option<String>,
    pub path_params: Map,
    pub remaining_path: Vec<String>,
    /// Result of the successful authenticator
    pub auth: Option<AuthResult>,
    /// Headers to add to the outgoing response
    pub response_headers: HeaderVec,
    raw_headers: HeaderVec,
    query: String,
    body: RequestBody,
    completed: BTreeSet<Augmentation>,
}

impl RequestContext {
    /// Build a context and run the headers and http-method augmentations.
    pub fn new(raw: RawRequest) -> Result<Self, RequestError> {
        let mut ctx = Self::unaugmented(raw);
        ctx.augment_headers(false)?;
        ctx.augment_http_method(false)?;
        Ok(ctx)
    }

    /// Build a context without running any augmentation.
    #[must_use]
    pub fn unaugmented(raw: RawRequest) -> Self {
        let request_id = RequestId::from_header_or_new(
            raw.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(REQUEST_ID_HEADER))
                .map(|(_, v)| v.as_str()),
        );
        let query = raw.query().to_string();
        let uri = raw.path().to_string();
        Self {
            request_id,
            remote_addr: raw.remote_addr,
            uri,
            headers: Map::new(),
            headers_lc: Map::new(),
            original_method: raw.method.to_ascii_uppercase(),
            method: Method::GET,
            file_extension: None,
            uri_base: Vec::new(),
            resource_path: Vec::new(),
            params: Map::new(),
            data: Value::Null,
            data_location: None,
            content_type: None,
            original_body: None,
            path_params: Map::new(),
            remaining_path: Vec::new(),
            auth: None,
            response_headers: HeaderVec::new(),
            raw_headers: raw.headers,
            query,
            body: raw.body,
            completed: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn is_augmented(&self, aug: Augmentation) -> bool {
        self.completed.contains(&aug)
    }

    fn begin(&mut self, aug: Augmentation, force: bool) -> Result<(), RequestError> {
        let deps = aug.dependencies();
        if deps.iter().any(|d| !self.completed.contains(d)) {
            let names: Vec<&str> = deps.iter().map(Augmentation::as_str).collect();
            return Err(RequestError::Augmentation {
                reason: format!(
                    "Cannot generate Request Augmentation. Dependencies not yet met. Requires {:?}",
                    names
                ),
            });
        }
        if self.completed.contains(&aug) && !force {
            return Err(RequestError::Augmentation {
                reason: format!(
                    "You cannot trigger the augmentation of the request {} multiple times.",
                    aug
                ),
            });
        }
        self.completed.remove(&aug);
        Ok(())
    }

    fn finish(&mut self, aug: Augmentation) {
        trace!(request_id = %self.request_id, augmentation = %aug, "Augmentation complete");
        self.completed.insert(aug);
    }

    pub fn augment_headers(&mut self, force: bool) -> Result<(), RequestError> {
        self.begin(Augmentation::Headers, force)?;
        self.headers = self
            .raw_headers
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
            .collect();
        self.rebuild_lowercase_headers();
        self.finish(Augmentation::Headers);
        Ok(())
    }

    /// Recompute [`headers_lc`](Self::headers_lc) from [`headers`](Self::headers).
    pub fn rebuild_lowercase_headers(&mut self) {
        self.headers_lc = self
            .headers
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
            .collect();
    }

    pub fn augment_http_method(&mut self, force: bool) -> Result<(), RequestError> {
        self.begin(Augmentation::HttpMethod, force)?;
        let effective = match self.headers_lc.get(METHOD_OVERRIDE_HEADER) {
            Some(value) if self.original_method == "POST" => value.to_string().to_ascii_uppercase(),
            _ => self.original_method.clone(),
        };
        if !HTTP_METHODS.contains(&effective.as_str()) {
            return Err(RequestError::InvalidHttpMethod { method: effective });
        }
        self.method = Method::from_bytes(effective.as_bytes())
            .map_err(|_| RequestError::InvalidHttpMethod { method: effective })?;
        self.finish(Augmentation::HttpMethod);
        Ok(())
    }

    /// Split the URI into base segments and the resource path below `base_path`.
    pub fn augment_uri(&mut self, base_path: &str, force: bool) -> Result<(), RequestError> {
        self.begin(Augmentation::Uri, force)?;
        let mut segments: Vec<String> = self
            .uri
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        self.file_extension = None;
        if let Some(last) = segments.last_mut() {
            if let Some((stem, ext)) = last.rsplit_once('.') {
                self.file_extension = Some(ext.to_ascii_lowercase());
                *last = stem.to_string();
            }
        }

        self.uri_base = base_path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if segments.starts_with(&self.uri_base) {
            segments.drain(..self.uri_base.len());
        }
        self.resource_path = segments.into_iter().filter(|s| !s.is_empty()).collect();
        self.finish(Augmentation::Uri);
        Ok(())
    }

    pub fn augment_url_params(&mut self, force: bool) -> Result<(), RequestError> {
        self.begin(Augmentation::UrlParams, force)?;
        self.params = parse_urlencoded(&self.query);
        self.finish(Augmentation::UrlParams);
        Ok(())
    }

    /// Parse the request data as `content_type`.
    ///
    /// GET requests parse the query string. For other methods the `Content-Type` header must
    /// contain one of the types allowed for the method, and a parser for `content_type` must be
    /// registered.
    pub fn augment_content(
        &mut self,
        parsers: &ContentParsers,
        content_type: &str,
        force: bool,
    ) -> Result<(), RequestError> {
        self.begin(Augmentation::Content, force)?;
        let header = self
            .headers_lc
            .get("content-type")
            .map(|v| v.to_string())
            .unwrap_or_else(|| "UNKNOWN".to_string());

        if let Some(allowed) = allowed_content_types(&self.method) {
            if !allowed.iter().any(|t| header.to_ascii_lowercase().contains(t)) {
                return Err(RequestError::InvalidContentType {
                    reason: format!(
                        "Value in 'Content-Type' is not allowed for HTTP Method '{}'. Allowed types are '{:?}'.",
                        self.method, allowed
                    ),
                });
            }
        }

        let parser = parsers.get(content_type).ok_or_else(|| {
            RequestError::InvalidContentType {
                reason: format!(
                    "The Content-Type '{}' is not a valid type at this time. Allowed types are '{:?}'.",
                    content_type,
                    parsers.content_types()
                ),
            }
        })?;

        let body = if self.method == Method::GET {
            RequestBody::Raw(self.query.clone())
        } else {
            self.body.clone()
        };
        let parsed = parser.parse(&body).map_err(|reason| {
            trace!(request_id = %self.request_id, reason = %reason, "Body parsing failed");
            RequestError::InvalidRequestBody {
                reason: format!(
                    "Unable to parse HTTP Request Body as '{}'. Given Content Type of '{}'",
                    content_type, header
                ),
            }
        })?;

        self.data = parsed.data;
        self.original_body = parsed.original_body;
        self.content_type = Some(content_type.to_string());
        self.data_location = Some(if self.method == Method::GET {
            Location::Query
        } else {
            parser.location()
        });
        self.finish(Augmentation::Content);
        Ok(())
    }

    /// Header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&Value> {
        self.headers_lc.get(&name.to_ascii_lowercase())
    }

    /// Caller address, preferring `X-Real-IP` over the transport's remote address.
    #[must_use]
    pub fn client_ip(&self) -> Option<String> {
        self.header("x-real-ip")
            .map(|v| v.to_string())
            .or_else(|| self.remote_addr.clone())
    }

    /// Queue a header for the outgoing response.
    pub fn set_response_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(slot) = self
            .response_headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            slot.1 = value;
        } else {
            self.response_headers.push((Arc::from(name), value));
        }
    }

    /// The request as a single value, as handed to demo and diagnostic endpoints.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        let strings = |items: &[String]| {
            Value::Array(items.iter().map(|s| Value::String(s.clone())).collect())
        };
        let mut out = Map::new();
        out.insert("requestId".into(), Value::String(self.request_id.to_string()));
        out.insert("headers".into(), Value::Object(self.headers.clone()));
        out.insert(
            "originalHttpMethod".into(),
            Value::String(self.original_method.clone()),
        );
        out.insert("httpMethod".into(), Value::String(self.method.to_string()));
        out.insert(
            "fileExtension".into(),
            self.file_extension.clone().map(Value::String).unwrap_or_default(),
        );
        out.insert("resourcePath".into(), strings(&self.resource_path));
        out.insert("params".into(), Value::Object(self.params.clone()));
        out.insert("pathParams".into(), Value::Object(self.path_params.clone()));
        out.insert("remainingPath".into(), strings(&self.remaining_path));
        out.insert("data".into(), self.data.clone());
        out.insert(
            "auth".into(),
            self.auth.as_ref().map(AuthResult::to_value).unwrap_or_default(),
        );
        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::content::FORM_URLENCODED;

    fn post(uri: &str) -> RawRequest {
        RawRequest::new("post", uri)
    }

    #[test]
    fn override_header_only_applies_to_post() {
        let ctx = RequestContext::new(post("/x").with_header("X-HTTP-Method-Override", "put"))
            .unwrap();
        assert_eq!(ctx.method, Method::PUT);
        assert_eq!(ctx.original_method, "POST");

        let ctx = RequestContext::new(
            RawRequest::new("GET", "/x").with_header("X-HTTP-Method-Override", "DELETE"),
        )
        .unwrap();
        assert_eq!(ctx.method, Method::GET);
    }

    #[test]
    fn unknown_effective_method_is_rejected() {
        let err = RequestContext::new(post("/x").with_header("X-HTTP-Method-Override", "BREW"))
            .unwrap_err();
        assert_eq!(
            err,
            RequestError::InvalidHttpMethod {
                method: "BREW".to_string()
            }
        );
        assert_eq!(err.status(), http::StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn augmentations_enforce_dependencies_and_run_once() {
        let mut ctx = RequestContext::unaugmented(post("/x"));
        assert!(matches!(
            ctx.augment_http_method(false),
            Err(RequestError::Augmentation { .. })
        ));
        ctx.augment_headers(false).unwrap();
        assert!(ctx.augment_headers(false).is_err());
        ctx.augment_headers(true).unwrap();
        ctx.augment_http_method(false).unwrap();
        assert!(ctx.is_augmented(Augmentation::HttpMethod));
    }

    #[test]
    fn uri_strips_base_path_and_extension() {
        let mut ctx = RequestContext::new(RawRequest::new("GET", "/api/v1/docs/index.HTML?x=1"))
            .unwrap();
        ctx.augment_uri("/api/v1", false).unwrap();
        assert_eq!(ctx.file_extension.as_deref(), Some("html"));
        assert_eq!(ctx.uri_base, vec!["api", "v1"]);
        assert_eq!(ctx.resource_path, vec!["docs", "index"]);
    }

    #[test]
    fn get_content_comes_from_the_query_string() {
        let mut ctx = RequestContext::new(RawRequest::new("GET", "/t?arg1=5&arg2=abc")).unwrap();
        ctx.augment_content(&ContentParsers::with_defaults(), FORM_URLENCODED, false)
            .unwrap();
        assert_eq!(ctx.data.get("arg1"), Some(&Value::from("5")));
        assert_eq!(ctx.data_location, Some(Location::Query));
    }

    #[test]
    fn post_content_type_must_be_allowed_for_method() {
        let mut ctx = RequestContext::new(
            post("/t")
                .with_header("Content-Type", "application/xml")
                .with_text("<a/>"),
        )
        .unwrap();
        let err = ctx
            .augment_content(&ContentParsers::with_defaults(), "application/xml", false)
            .unwrap_err();
        assert!(matches!(err, RequestError::InvalidContentType { .. }));
    }

    #[test]
    fn unparseable_json_is_a_bad_request() {
        let mut ctx = RequestContext::new(
            post("/t")
                .with_header("Content-Type", "application/json")
                .with_text("{nope"),
        )
        .unwrap();
        let err = ctx
            .augment_content(&ContentParsers::with_defaults(), "application/json", false)
            .unwrap_err();
        assert_eq!(err.status(), http::StatusCode::BAD_REQUEST);
        assert!(err
            .to_string()
            .starts_with("Unable to parse HTTP Request Body as 'application/json'"));
    }

    #[test]
    fn response_headers_are_replaced_case_insensitively() {
        let mut ctx = RequestContext::new(RawRequest::new("GET", "/")).unwrap();
        ctx.set_response_header("X-Version", "1");
        ctx.set_response_header("x-version", "2");
        assert_eq!(ctx.response_headers.len(), 1);
        assert_eq!(ctx.response_headers[0].1, "2");
    }
}
