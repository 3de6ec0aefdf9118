//! # swagrouter
//!
//! **swagrouter** resolves HTTP requests against a tree of typed path segments and runs them
//! through a schema-driven pipeline: content negotiation, authentication, request validation
//! with type coercion, handler logic and response validation. Every step is driven by a
//! declarative, Swagger 2.0 style schema attached to each handler.
//!
//! ## Overview
//!
//! The crate is a library core. It owns no sockets: a hosting transport converts its request
//! into a [`server::RawRequest`], calls [`service::ApiService::process_request`] and writes the
//! returned [`server::Response`] back.
//!
//! ## Architecture
//!
//! - **[`value`]** - native data model, including date values produced by coercion
//! - **[`spec`]** - typed schema fragments, the `$ref` catalog and YAML/JSON loaders
//! - **[`signature`]** - compiles schemas into flat, validated field signatures
//! - **[`validator`]** - validates and coerces data in place, producing a report
//! - **[`redact`]** - masks fields flagged `obscure` before data reaches the logs
//! - **[`router`]** - arena routing tree with typed placeholder segments
//! - **[`security`]** - authenticator contract, chain evaluation and built-ins
//! - **[`server`]** - request context, content parsers and the response descriptor
//! - **[`endpoint`]** - per-request orchestration state machine
//! - **[`service`]** - the entry point a transport calls
//! - **[`signature_cache`]** - optional read-through cache of compiled signatures
//! - **[`runtime_config`]** / **[`logging`]** - configuration and `tracing` setup
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant T as Transport
//!     participant S as ApiService
//!     participant R as RouteTree
//!     participant E as Endpoint
//!     participant A as Auth chain
//!     participant V as Validator
//!     participant H as Handler logic
//!
//!     T->>S: process_request(RawRequest)
//!     S->>S: RequestContext (headers, method, uri)
//!     S->>R: resolve(resource_path)
//!     R-->>S: RouteMatch (handlers, path params)
//!     S->>E: execute(ctx)
//!     E->>E: content negotiation + signatures
//!     E->>A: authenticate(chain, ctx)
//!     A-->>E: Granted / Denied
//!     E->>V: validate(headers, data)
//!     V-->>E: ValidationReport
//!     E->>H: logic(ctx)
//!     H-->>E: Response
//!     E->>V: validate(response body)
//!     E-->>S: Response / EndpointError
//!     S-->>T: Response
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use http::Method;
//! use std::sync::Arc;
//! use swagrouter::endpoint::MethodHandler;
//! use swagrouter::runtime_config::RuntimeConfig;
//! use swagrouter::security::{AllowAll, AuthEntry};
//! use swagrouter::server::{RawRequest, Response};
//! use swagrouter::service::{ApiService, ApiTree};
//! use swagrouter::spec::{Catalog, Operation};
//!
//! let operation = Operation::from_yaml_str(r#"
//! produces: [application/json]
//! parameters:
//!   - {in: query, name: limit, type: integer, default: 20}
//! responses:
//!   '200': {schema: {type: object, properties: {count: {type: integer}}}}
//! "#)?;
//!
//! let mut tree = ApiTree::new("is-x-");
//! tree.insert(
//!     "pets/is-x-integer-petId",
//!     Method::GET,
//!     MethodHandler::new(operation, vec![AuthEntry::new(AllowAll)], |_ctx| {
//!         Ok(Response::success("found"))
//!     }),
//! )?;
//!
//! let service = ApiService::new(tree, Arc::new(Catalog::default()), RuntimeConfig::from_env());
//! let response = service.process_request(RawRequest::new("GET", "/pets/42?limit=5"));
//! ```
//!
//! ## Configuration
//!
//! See [`runtime_config`] for the `SWAGR_*` variables that set the custom-key prefix, the
//! base path, placeholder type priority and the signature cache, and [`logging`] for the
//! subscriber setup.

pub mod endpoint;
pub mod ids;
pub mod logging;
pub mod redact;
pub mod router;
pub mod runtime_config;
pub mod security;
pub mod server;
pub mod service;
pub mod signature;
pub mod signature_cache;
pub mod spec;
pub mod validator;
pub mod value;

pub use endpoint::{Endpoint, EndpointError, MethodHandler};
pub use router::{RouteError, RouteTree};
pub use server::{RawRequest, RequestContext, Response};
pub use service::{ApiService, ApiTree};
pub use spec::{Catalog, Operation, SchemaError};
pub use value::{Map, Value};
