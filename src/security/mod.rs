//! # Security Module
//!
//! Authentication for endpoints, expressed as an ordered chain of authenticators.
//!
//! ## Overview
//!
//! Every operation declares a non-empty list under its `{prefix}auth` key. Each entry names an
//! [`Authenticator`] and may carry extra named arguments:
//!
//! ```yaml
//! is-x-auth:
//!   - method: allowWithApiKeyHeader
//!     extraArgs:
//!       headerName: IS-API-KEY
//!       keyValue: abcd1234
//!   - method: allowAll
//! ```
//!
//! [`AuthRegistry::resolve_chain`] turns that list into [`AuthEntry`] values and
//! [`authenticate`] runs them:
//!
//! 1. Entries are tried in declared order.
//! 2. The first success stops the chain; its [`AuthResult`] is kept in the request context.
//! 3. Failure messages are collected, de-duplicated in first-seen order.
//! 4. If nothing succeeds the request is denied with all messages joined by `" | "`.
//!
//! An empty chain is a schema error. It never means "allow everyone".
//!
//! ## Custom authenticators
//!
//! Any closure `Fn(&RequestContext, &Map) -> AuthResult` is an authenticator. Wrap it in
//! [`FnAuthenticator`] to give it a name for failure messages:
//!
//! ```rust,ignore
//! use swagrouter::security::{AuthRegistry, AuthResult, FnAuthenticator};
//!
//! let mut registry = AuthRegistry::with_builtins();
//! registry.register(FnAuthenticator::new("internalOnly", |ctx, _args| {
//!     match ctx.client_ip().as_deref() {
//!         Some(ip) if ip.starts_with("10.") => AuthResult::granted("internal caller"),
//!         _ => AuthResult::denied("external callers are not allowed"),
//!     }
//! }));
//! ```

mod registry;
mod simple;

pub use registry::AuthRegistry;
pub use simple::{AllowAll, AllowNone, ApiKeyHeader};

use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

use crate::server::RequestContext;
use crate::spec::SchemaError;
use crate::value::{Map, Value};

/// Separator between the failure messages of a denied chain.
pub const MESSAGE_SEPARATOR: &str = " | ";

/// Outcome of one authenticator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthResult {
    pub success: bool,
    pub message: Option<String>,
    /// Any further data the authenticator wants handlers to see (user, scopes, ...)
    pub extra: Map,
}

impl AuthResult {
    #[must_use]
    pub fn granted(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn denied(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// `{success, message?, ...extra}`
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut out = self.extra.clone();
        out.insert("success".to_string(), Value::Bool(self.success));
        if let Some(message) = &self.message {
            out.insert("message".to_string(), Value::String(message.clone()));
        }
        Value::Object(out)
    }
}

/// Decides whether a request may reach an endpoint.
pub trait Authenticator: Send + Sync {
    /// Name used in the default failure message.
    fn name(&self) -> &str;

    /// Check the request. `extra_args` are the entry's `extraArgs`.
    fn authenticate(&self, ctx: &RequestContext, extra_args: &Map) -> AuthResult;
}

impl<F> Authenticator for F
where
    F: Fn(&RequestContext, &Map) -> AuthResult + Send + Sync,
{
    fn name(&self) -> &str {
        std::any::type_name::<F>()
    }

    fn authenticate(&self, ctx: &RequestContext, extra_args: &Map) -> AuthResult {
        self(ctx, extra_args)
    }
}

/// A closure with a name.
pub struct FnAuthenticator<F> {
    name: String,
    func: F,
}

impl<F> FnAuthenticator<F>
where
    F: Fn(&RequestContext, &Map) -> AuthResult + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Authenticator for FnAuthenticator<F>
where
    F: Fn(&RequestContext, &Map) -> AuthResult + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn authenticate(&self, ctx: &RequestContext, extra_args: &Map) -> AuthResult {
        (self.func)(ctx, extra_args)
    }
}

impl<F> fmt::Debug for FnAuthenticator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAuthenticator")
            .field("name", &self.name)
            .finish()
    }
}

/// One link of an authentication chain.
#[derive(Clone)]
pub struct AuthEntry {
    pub authenticator: Arc<dyn Authenticator>,
    pub extra_args: Map,
}

impl AuthEntry {
    pub fn new(authenticator: impl Authenticator + 'static) -> Self {
        Self::from_arc(Arc::new(authenticator))
    }

    #[must_use]
    pub fn from_arc(authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            authenticator,
            extra_args: Map::new(),
        }
    }

    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_args.insert(key.into(), value.into());
        self
    }
}

impl fmt::Debug for AuthEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthEntry")
            .field("authenticator", &self.authenticator.name())
            .field("extra_args", &self.extra_args)
            .finish()
    }
}

/// Result of running a whole chain.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Granted(AuthResult),
    /// Distinct failure messages in first-seen order
    Denied { messages: Vec<String> },
}

impl AuthOutcome {
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, AuthOutcome::Granted(_))
    }

    /// All failure messages joined for the client; `None` when granted.
    #[must_use]
    pub fn denied_message(&self) -> Option<String> {
        match self {
            AuthOutcome::Granted(_) => None,
            AuthOutcome::Denied { messages } => Some(messages.join(MESSAGE_SEPARATOR)),
        }
    }
}

/// Run an authentication chain against a request.
pub fn authenticate(chain: &[AuthEntry], ctx: &RequestContext) -> Result<AuthOutcome, SchemaError> {
    if chain.is_empty() {
        return Err(SchemaError::CustomPropertyInvalid {
            reason: "The authentication chain must contain at least one authenticator.".to_string(),
        });
    }

    let mut messages: Vec<String> = Vec::new();
    for entry in chain {
        let name = entry.authenticator.name();
        trace!(request_id = %ctx.request_id, authenticator = %name, "Attempting authentication");
        let result = entry.authenticator.authenticate(ctx, &entry.extra_args);
        if result.success {
            trace!(request_id = %ctx.request_id, authenticator = %name, "Authentication succeeded");
            return Ok(AuthOutcome::Granted(result));
        }
        let message = result
            .message
            .unwrap_or_else(|| format!("Failure to pass '{}'", name));
        if !messages.contains(&message) {
            messages.push(message);
        }
    }

    warn!(
        request_id = %ctx.request_id,
        failures = ?messages,
        "Failed to authenticate"
    );
    Ok(AuthOutcome::Denied { messages })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::RawRequest;

    fn ctx() -> RequestContext {
        RequestContext::new(RawRequest::new("GET", "/x").with_header("IS-API-KEY", "abcd1234"))
            .unwrap()
    }

    #[test]
    fn empty_chain_is_a_schema_error() {
        assert!(matches!(
            authenticate(&[], &ctx()),
            Err(SchemaError::CustomPropertyInvalid { .. })
        ));
    }

    #[test]
    fn first_success_stops_the_chain() {
        let chain = vec![
            AuthEntry::new(AllowNone),
            AuthEntry::new(AllowAll),
            AuthEntry::new(|_: &RequestContext, _: &Map| -> AuthResult {
                panic!("chain should have stopped")
            }),
        ];
        let outcome = authenticate(&chain, &ctx()).unwrap();
        match outcome {
            AuthOutcome::Granted(result) => {
                assert_eq!(result.message.as_deref(), Some("I do absolutely nothing!"))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn failure_messages_are_distinct_and_ordered() {
        let chain = vec![
            AuthEntry::new(AllowNone),
            AuthEntry::new(FnAuthenticator::new("quiet", |_, _| AuthResult::default())),
            AuthEntry::new(AllowNone),
        ];
        let outcome = authenticate(&chain, &ctx()).unwrap();
        assert_eq!(
            outcome.denied_message().as_deref(),
            Some("I prevent ANYONE from doing anything! | Failure to pass 'quiet'")
        );
    }

    #[test]
    fn auth_result_value_includes_extra() {
        let value = AuthResult::granted("ok").with_extra("user", "alice").to_value();
        assert_eq!(value.get("user"), Some(&Value::from("alice")));
        assert_eq!(value.get("success"), Some(&Value::Bool(true)));
    }
}
