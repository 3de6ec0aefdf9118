//! # Service Module
//!
//! [`ApiService`] is the single call a hosting transport makes per request:
//! [`process_request`](ApiService::process_request) takes a [`RawRequest`] and always returns a
//! [`Response`]. Errors never escape; they are mapped to status codes here and logged with
//! their full detail.
//!
//! | Condition | Response |
//! |---|---|
//! | invalid effective HTTP method | 405 plain |
//! | no route matches | 404 plain |
//! | ambiguous route | 500 plain |
//! | content negotiation failure | 415 / 400 JSON failure envelope |
//! | schema, initialization, logic or response-validation error | 500 plain |
//!
//! The routing tree sits behind an [`ArcSwap`] so [`replace_tree`](ApiService::replace_tree)
//! can install a new tree atomically; requests already running keep the tree they loaded.

use arc_swap::ArcSwap;
use http::StatusCode;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn};

use crate::endpoint::{Endpoint, EndpointError, MethodHandler};
use crate::runtime_config::RuntimeConfig;
use crate::server::{ContentParsers, RawRequest, RequestContext, Response};
use crate::signature_cache::SignatureCache;
use crate::spec::Catalog;

/// Routing tree specialised to endpoint handlers.
pub type ApiTree = crate::router::RouteTree<MethodHandler>;

pub struct ApiService {
    tree: ArcSwap<ApiTree>,
    catalog: Arc<Catalog>,
    config: RuntimeConfig,
    parsers: ContentParsers,
    cache: SignatureCache,
}

impl ApiService {
    pub fn new(tree: ApiTree, catalog: Arc<Catalog>, config: RuntimeConfig) -> Self {
        let cache = SignatureCache::new(config.signature_cache);
        info!(
            base_path = %config.base_path,
            custom_prefix = %config.custom_prefix,
            signature_cache = config.signature_cache,
            "API service created"
        );
        Self {
            tree: ArcSwap::from_pointee(tree),
            catalog,
            config,
            parsers: ContentParsers::with_defaults(),
            cache,
        }
    }

    /// Replace the built-in content parsers.
    #[must_use]
    pub fn with_parsers(mut self, parsers: ContentParsers) -> Self {
        self.parsers = parsers;
        self
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    #[must_use]
    pub fn cache(&self) -> &SignatureCache {
        &self.cache
    }

    /// Install a new routing tree; cached signatures of the old handlers are dropped.
    pub fn replace_tree(&self, tree: ApiTree) {
        self.tree.store(Arc::new(tree));
        self.cache.clear();
        info!("Routing tree replaced");
    }

    /// Run one request end to end.
    pub fn process_request(&self, raw: RawRequest) -> Response {
        let span = info_span!(
            "request",
            request_id = tracing::field::Empty,
            method = %raw.method,
            path = %raw.path()
        );
        let _guard = span.enter();

        let mut ctx = match RequestContext::new(raw) {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!(error = %e, "Rejected request");
                return Response::status_only(e.status());
            }
        };
        span.record("request_id", tracing::field::display(ctx.request_id));

        let mut response = self.route(&mut ctx);
        for (name, value) in &ctx.response_headers {
            response.set_header(name, value.clone());
        }
        response.set_header(crate::ids::REQUEST_ID_HEADER, ctx.request_id.to_string());
        info!(status = response.status.as_u16(), "Request complete");
        response
    }

    fn route(&self, ctx: &mut RequestContext) -> Response {
        let prepared = ctx
            .augment_uri(&self.config.base_path, false)
            .and_then(|()| ctx.augment_url_params(false));
        if let Err(e) = prepared {
            error!(error = %e, "Request augmentation failed");
            return Response::status_only(StatusCode::INTERNAL_SERVER_ERROR);
        }

        let tree = self.tree.load();
        let matched = match tree.resolve(&ctx.resource_path) {
            Ok(Some(matched)) => matched,
            Ok(None) => {
                debug!(resource_path = ?ctx.resource_path, "No route matched");
                return Response::status_only(StatusCode::NOT_FOUND);
            }
            Err(e) => {
                error!(error = %e, resource_path = ?ctx.resource_path, "Route resolution failed");
                return Response::status_only(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };
        debug!(
            route = %matched.full_name,
            path_params = %crate::value::Value::Object(matched.path_params.clone()),
            remaining = ?matched.remaining_path,
            "Route resolved"
        );
        ctx.path_params = matched.path_params;
        ctx.remaining_path = matched.remaining_path;

        let mut endpoint = Endpoint::new(matched.handlers, &self.catalog, &self.config)
            .with_parsers(&self.parsers)
            .with_cache(&self.cache);
        match endpoint.execute(ctx) {
            Ok(response) => response,
            Err(EndpointError::Request(e)) if e.is_client_error() => {
                debug!(error = %e, "Content negotiation failed");
                Response::failure(&e.to_string()).with_status(e.status())
            }
            Err(e) => {
                error!(error = %e, details = ?e, "Endpoint execution failed");
                Response::status_only(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl std::fmt::Debug for ApiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiService")
            .field("config", &self.config)
            .field("parsers", &self.parsers)
            .field("cached_signatures", &self.cache.size())
            .finish()
    }
}
