use http::Method;
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::error::EndpointError;
use super::handler::MethodHandler;
use crate::redact::redact;
use crate::runtime_config::RuntimeConfig;
use crate::security::{authenticate, AuthOutcome};
use crate::server::{
    allowed_content_types, media_type, Augmentation, ContentParsers, RequestContext,
    RequestError, Response, FORM_URLENCODED,
};
use crate::signature::{DataSignature, Direction, SignatureCompiler};
use crate::signature_cache::SignatureCache;
use crate::spec::{Catalog, Location};
use crate::validator::validate;
use crate::value::{Map, Value};

static DEFAULT_PARSERS: Lazy<ContentParsers> = Lazy::new(ContentParsers::with_defaults);

/// Augmentations the caller must have run before [`Endpoint::execute`].
const REQUIRED_AUGMENTATIONS: [Augmentation; 3] = [
    Augmentation::Headers,
    Augmentation::HttpMethod,
    Augmentation::Uri,
];

/// Progress of one endpoint execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EndpointState {
    Resolved,
    Authenticated,
    RequestValidated,
    LogicExecuted,
    ResponseValidated,
    Done,
}

impl fmt::Display for EndpointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EndpointState::Resolved => "resolved",
            EndpointState::Authenticated => "authenticated",
            EndpointState::RequestValidated => "request-validated",
            EndpointState::LogicExecuted => "logic-executed",
            EndpointState::ResponseValidated => "response-validated",
            EndpointState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Signatures compiled for one handler.
struct Signatures {
    incoming: BTreeMap<Location, Arc<DataSignature>>,
    /// `None` when the operation declares no responses at all
    outgoing: Option<BTreeMap<String, Arc<DataSignature>>>,
}

/// Runs one request through the handler set of a resolved route.
///
/// Steps, in order: handler lookup for the effective method, content negotiation, signature
/// compilation, `includeHeaders`, authentication, request validation, logic and response
/// validation. Client-facing failures (unimplemented method, denied authentication, invalid
/// request data) come back as `Ok` responses; everything else is an [`EndpointError`].
pub struct Endpoint<'a> {
    handlers: &'a HashMap<Method, Arc<MethodHandler>>,
    catalog: &'a Catalog,
    config: &'a RuntimeConfig,
    parsers: Option<&'a ContentParsers>,
    cache: Option<&'a SignatureCache>,
    state: EndpointState,
}

impl<'a> Endpoint<'a> {
    pub fn new(
        handlers: &'a HashMap<Method, Arc<MethodHandler>>,
        catalog: &'a Catalog,
        config: &'a RuntimeConfig,
    ) -> Self {
        Self {
            handlers,
            catalog,
            config,
            parsers: None,
            cache: None,
            state: EndpointState::Resolved,
        }
    }

    /// Use these parsers instead of the built-in set.
    #[must_use]
    pub fn with_parsers(mut self, parsers: &'a ContentParsers) -> Self {
        self.parsers = Some(parsers);
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: &'a SignatureCache) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn state(&self) -> EndpointState {
        self.state
    }

    /// Execute the request. The endpoint is always [`EndpointState::Done`] afterwards.
    pub fn execute(&mut self, ctx: &mut RequestContext) -> Result<Response, EndpointError> {
        let result = self.run(ctx);
        self.transition(ctx, EndpointState::Done);
        result
    }

    fn transition(&mut self, ctx: &RequestContext, next: EndpointState) {
        trace!(request_id = %ctx.request_id, from = %self.state, to = %next, "Endpoint state");
        self.state = next;
    }

    fn run(&mut self, ctx: &mut RequestContext) -> Result<Response, EndpointError> {
        if let Some(missing) = REQUIRED_AUGMENTATIONS
            .iter()
            .find(|aug| !ctx.is_augmented(**aug))
        {
            return Err(EndpointError::initialization(format!(
                "The request has not been augmented with '{}'",
                missing
            )));
        }

        let handler = match self.handlers.get(&ctx.method) {
            Some(handler) => Arc::clone(handler),
            None => {
                debug!(
                    request_id = %ctx.request_id,
                    method = %ctx.method,
                    "No handler registered for method"
                );
                return Response::http_status("Not Implemented")
                    .map_err(|e| EndpointError::initialization(e.to_string()));
            }
        };
        let operation = handler.operation();
        let flags = operation.flags(&self.config.custom_prefix);

        self.negotiate_content(ctx, &operation.consumes)?;
        let signatures = self.compile_signatures(&handler)?;

        for (name, value) in &flags.include_headers {
            ctx.set_response_header(name, value.clone());
        }

        let outcome = authenticate(handler.auth(), ctx)?;
        match outcome {
            AuthOutcome::Granted(result) => ctx.auth = Some(result),
            AuthOutcome::Denied { messages } => {
                let message = messages.join(crate::security::MESSAGE_SEPARATOR);
                return Ok(Response::json("failure", false, Some(&message), Map::new()));
            }
        }
        self.transition(ctx, EndpointState::Authenticated);

        if flags.validate_request {
            if let Some(rejection) = self.validate_request(ctx, &signatures)? {
                return Ok(rejection);
            }
        } else {
            trace!(request_id = %ctx.request_id, "Request validation disabled");
        }
        self.transition(ctx, EndpointState::RequestValidated);

        let mut response = run_logic(&handler, ctx)?;
        self.transition(ctx, EndpointState::LogicExecuted);

        if flags.validate_response && response.is_json() {
            self.validate_response(ctx, &mut response, &signatures)?;
        }
        self.transition(ctx, EndpointState::ResponseValidated);
        Ok(response)
    }

    /// Parse the request data with the parser selected by the `Content-Type` header.
    fn negotiate_content(
        &self,
        ctx: &mut RequestContext,
        consumes: &[String],
    ) -> Result<(), EndpointError> {
        if ctx.is_augmented(Augmentation::Content) {
            return Ok(());
        }
        let parsers = self.parsers.unwrap_or(&*DEFAULT_PARSERS);

        if ctx.method == Method::GET {
            ctx.augment_content(parsers, FORM_URLENCODED, false)?;
            return Ok(());
        }

        let header = ctx
            .header("content-type")
            .map(Value::to_string)
            .ok_or(RequestError::MissingContentType)?;
        let media = media_type(&header);

        if parsers.get(&media).is_none() {
            return Err(RequestError::InvalidContentType {
                reason: format!("The Content-Type '{}' is not supported.", media),
            }
            .into());
        }
        if let Some(allowed) = allowed_content_types(&ctx.method) {
            if !allowed.contains(&media.as_str()) {
                return Err(RequestError::InvalidContentType {
                    reason: format!(
                        "The Content-Type '{}' is not allowed for the HTTP Method {}.",
                        media, ctx.method
                    ),
                }
                .into());
            }
        }
        if !consumes.iter().any(|c| media_type(c) == media) {
            return Err(RequestError::InvalidContentType {
                reason: format!(
                    "The Content-Type '{}' is not supported by this endpoint.",
                    media
                ),
            }
            .into());
        }

        ctx.augment_content(parsers, &media, false)?;
        Ok(())
    }

    fn compile_signatures(&self, handler: &MethodHandler) -> Result<Signatures, EndpointError> {
        let compiler = SignatureCompiler::new(self.catalog, &self.config.custom_prefix);

        let mut incoming = BTreeMap::new();
        for location in Location::INCOMING {
            let signature = self.signature(handler, &compiler, Direction::Incoming(location))?;
            incoming.insert(location, signature);
        }

        let outgoing = match &handler.operation().responses {
            Some(responses) => {
                let mut compiled = BTreeMap::new();
                for status in responses.keys() {
                    let signature =
                        self.signature(handler, &compiler, Direction::Outgoing(status))?;
                    compiled.insert(status.clone(), signature);
                }
                Some(compiled)
            }
            None => None,
        };

        Ok(Signatures { incoming, outgoing })
    }

    fn signature(
        &self,
        handler: &MethodHandler,
        compiler: &SignatureCompiler<'_>,
        direction: Direction<'_>,
    ) -> Result<Arc<DataSignature>, EndpointError> {
        let compiled = match self.cache {
            Some(cache) => cache.get_or_compile(handler.id(), compiler, handler.operation(), direction),
            None => compiler.compile(handler.operation(), direction).map(Arc::new),
        };
        Ok(compiled?)
    }

    /// `Ok(Some(response))` when the request is rejected.
    fn validate_request(
        &self,
        ctx: &mut RequestContext,
        signatures: &Signatures,
    ) -> Result<Option<Response>, EndpointError> {
        if let Some(header_signature) = signatures.incoming.get(&Location::Header) {
            align_header_names(&mut ctx.headers, header_signature);
            let report = validate(&mut ctx.headers, header_signature, true, false);
            ctx.rebuild_lowercase_headers();
            if !report.all_valid() {
                debug!(request_id = %ctx.request_id, report = %report, "Header validation failed");
                return Ok(Some(Response::failure(&format!("Error in Headers. {}", report))));
            }
        }

        let location = if ctx.method == Method::GET {
            Location::Query
        } else {
            ctx.data_location.ok_or_else(|| {
                EndpointError::initialization("The request data location is unknown")
            })?
        };
        let Some(signature) = signatures.incoming.get(&location) else {
            return Ok(None);
        };

        let coerce = location != Location::Body;
        let report = match &mut ctx.data {
            Value::Object(data) => validate(data, signature, coerce, false),
            _ => validate(&mut Map::new(), signature, coerce, false),
        };

        if self.config.log_incoming_data {
            if let Value::Object(data) = &ctx.data {
                let redacted = Value::Object(redact(data, signature));
                debug!(
                    request_id = %ctx.request_id,
                    location = %location,
                    data = %redacted,
                    "Incoming request data"
                );
            }
        }

        if !report.all_valid() {
            debug!(
                request_id = %ctx.request_id,
                location = %location,
                report = %report,
                "Request validation failed"
            );
            return Ok(Some(Response::failure(&format!(
                "Error in {} area of request. {}",
                location, report
            ))));
        }
        Ok(None)
    }

    fn validate_response(
        &self,
        ctx: &RequestContext,
        response: &mut Response,
        signatures: &Signatures,
    ) -> Result<(), EndpointError> {
        let Some(outgoing) = &signatures.outgoing else {
            trace!(request_id = %ctx.request_id, "No responses declared; response not validated");
            return Ok(());
        };

        let code = response.status.as_u16();
        let mut key = code.to_string();
        let claims_success = (200..=203).contains(&code);
        if !outgoing.contains_key(&key) || (claims_success && !response.reports_success()) {
            key = "default".to_string();
        }
        let signature = outgoing.get(&key).ok_or_else(|| {
            EndpointError::execution(format!("Cannot validate response for status '{}'", key))
        })?;

        let Some(body) = response.json_body_mut() else {
            return Ok(());
        };
        let report = validate(body, signature, true, true);
        let redacted = Value::Object(redact(body, signature));
        debug!(
            request_id = %ctx.request_id,
            status = code,
            response_key = %key,
            payload = %redacted,
            "Outgoing response payload"
        );
        if !report.all_valid() {
            return Err(EndpointError::execution(format!(
                "Response Validation ERROR \"{}\"",
                report
            )));
        }
        Ok(())
    }
}

/// Invoke the handler logic, turning a panic into [`EndpointError::Logic`].
fn run_logic(handler: &MethodHandler, ctx: &mut RequestContext) -> Result<Response, EndpointError> {
    let request_id = ctx.request_id;
    match catch_unwind(AssertUnwindSafe(|| handler.call(ctx))) {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(e)) => Err(EndpointError::Logic(e)),
        Err(panic) => {
            let detail = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            warn!(request_id = %request_id, handler = %handler.id(), detail = %detail, "Handler panicked");
            Err(EndpointError::Logic(anyhow::anyhow!(
                "handler panicked: {}",
                detail
            )))
        }
    }
}

/// Rename request headers to the spelling used in the header signature.
///
/// Header names are case-insensitive on the wire; the signature is keyed by the declared name.
fn align_header_names(headers: &mut Map, signature: &DataSignature) {
    for (declared, _) in signature {
        if headers.contains_key(declared) {
            continue;
        }
        let found = headers
            .keys()
            .find(|k| k.eq_ignore_ascii_case(declared))
            .cloned();
        if let Some(actual) = found {
            if let Some(value) = headers.remove(&actual) {
                headers.insert(declared.clone(), value);
            }
        }
    }
}
