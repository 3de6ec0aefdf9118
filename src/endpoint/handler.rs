use std::fmt;
use std::sync::Arc;

use crate::ids::HandlerId;
use crate::security::{AuthEntry, AuthRegistry};
use crate::server::{RequestContext, Response};
use crate::spec::{Operation, SchemaError};

/// Handler logic: reads the validated context, produces a response.
pub type LogicFn = dyn Fn(&mut RequestContext) -> anyhow::Result<Response> + Send + Sync;

/// Everything registered for one HTTP method on one path.
#[derive(Clone)]
pub struct MethodHandler {
    id: HandlerId,
    operation: Arc<Operation>,
    auth: Vec<AuthEntry>,
    logic: Arc<LogicFn>,
}

impl MethodHandler {
    /// Handler with an explicit authentication chain.
    pub fn new<F>(operation: Operation, auth: Vec<AuthEntry>, logic: F) -> Self
    where
        F: Fn(&mut RequestContext) -> anyhow::Result<Response> + Send + Sync + 'static,
    {
        Self {
            id: HandlerId::new(),
            operation: Arc::new(operation),
            auth,
            logic: Arc::new(logic),
        }
    }

    /// Handler whose chain is read from the operation's `{prefix}auth` key.
    pub fn from_registry<F>(
        operation: Operation,
        registry: &AuthRegistry,
        prefix: &str,
        logic: F,
    ) -> Result<Self, SchemaError>
    where
        F: Fn(&mut RequestContext) -> anyhow::Result<Response> + Send + Sync + 'static,
    {
        let auth = registry.resolve_chain(&operation, prefix)?;
        Ok(Self::new(operation, auth, logic))
    }

    #[must_use]
    pub fn id(&self) -> HandlerId {
        self.id
    }

    #[must_use]
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    #[must_use]
    pub fn auth(&self) -> &[AuthEntry] {
        &self.auth
    }

    pub(crate) fn call(&self, ctx: &mut RequestContext) -> anyhow::Result<Response> {
        (self.logic)(ctx)
    }
}

impl fmt::Debug for MethodHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodHandler")
            .field("id", &self.id)
            .field("operation_id", &self.operation.operation_id)
            .field("auth", &self.auth)
            .finish()
    }
}
