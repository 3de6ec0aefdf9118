//! # Server Module
//!
//! The boundary between a hosting HTTP transport and the routing core.
//!
//! - [`RawRequest`] is what the transport hands in: method, URI, headers, body, remote address.
//! - [`RequestContext`] is built from it step by step (see [`Augmentation`]) and is what
//!   authenticators, validators and handler logic work with.
//! - [`ContentParsers`] decode request bodies per media type.
//! - [`Response`] is what goes back out: one [`Payload`], an optional content-type override, a
//!   status and extra headers.
//!
//! No socket handling lives here; see [`crate::service::ApiService`] for the entry point a
//! transport calls.

mod content;
mod context;
mod error;
mod request;
mod response;

pub use content::{
    allowed_content_types, media_type, parse_urlencoded, ContentParser, ContentParsers,
    FormParser, JsonParser, ParsedContent, TextParser, APPLICATION_JSON, BODY_CONTENT_TYPES,
    FORM_URLENCODED, MULTIPART_FORM_DATA, TEXT_PLAIN,
};
pub use context::{Augmentation, RequestContext, METHOD_OVERRIDE_HEADER};
pub use error::{RequestError, UnknownStatus};
pub use request::{HeaderVec, RawRequest, RequestBody, MAX_INLINE_HEADERS};
pub use response::{code_for_reason, reason_phrase, HttpStatus, Payload, Response};
