//! # Signature Cache Module
//!
//! Read-through cache of compiled [`DataSignature`]s.
//!
//! ## Overview
//!
//! Schemas are immutable once a handler is registered, so the signature compiled for a given
//! handler, direction and qualifier never changes. The cache stores each compiled signature
//! behind an `Arc` and hands out clones on later requests.
//!
//! Entries are keyed by `(handler id, direction, qualifier)`:
//!
//! - `handler id` - the [`HandlerId`] fixed when the handler was built
//! - `direction` - `incoming` or `outgoing`
//! - `qualifier` - the parameter location or the response key
//!
//! Compilation errors are returned to the caller and never cached, so a broken schema fails
//! the same way on every request, exactly as without the cache.
//!
//! ## Thread Safety
//!
//! `Arc<RwLock<HashMap>>`: lookups share the read lock, insertions take the write lock and
//! re-check for an entry compiled concurrently. A poisoned lock degrades to uncached
//! compilation.
//!
//! ## Configuration
//!
//! Disabled with `SWAGR_SIGNATURE_CACHE=off` (see
//! [`RuntimeConfig`](crate::runtime_config::RuntimeConfig)).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

use crate::ids::HandlerId;
use crate::signature::{DataSignature, Direction, SignatureCompiler};
use crate::spec::{Operation, SchemaError};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    generation: u64,
    handler: HandlerId,
    outgoing: bool,
    qualifier: String,
}

#[derive(Debug, Default)]
struct Inner {
    generation: u64,
    entries: HashMap<CacheKey, Arc<DataSignature>>,
}

/// Thread-safe cache of compiled signatures.
#[derive(Debug, Clone)]
pub struct SignatureCache {
    inner: Arc<RwLock<Inner>>,
    enabled: bool,
}

impl SignatureCache {
    pub fn new(enabled: bool) -> Self {
        info!(enabled, "Initializing signature cache");
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            enabled,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Return the cached signature or compile, store and return it.
    pub fn get_or_compile(
        &self,
        handler: HandlerId,
        compiler: &SignatureCompiler<'_>,
        operation: &Operation,
        direction: Direction<'_>,
    ) -> Result<Arc<DataSignature>, SchemaError> {
        if !self.enabled {
            return compiler.compile(operation, direction).map(Arc::new);
        }

        let (outgoing, qualifier) = match direction {
            Direction::Incoming(location) => (false, location.as_str().to_string()),
            Direction::Outgoing(status) => (true, status.to_string()),
        };

        let generation = match self.inner.read() {
            Ok(inner) => {
                let key = CacheKey {
                    generation: inner.generation,
                    handler,
                    outgoing,
                    qualifier: qualifier.clone(),
                };
                if let Some(found) = inner.entries.get(&key) {
                    debug!(handler = %handler, outgoing, qualifier = %qualifier, "Signature cache hit");
                    return Ok(Arc::clone(found));
                }
                inner.generation
            }
            Err(_) => return compiler.compile(operation, direction).map(Arc::new),
        };

        let compiled = Arc::new(compiler.compile(operation, direction)?);
        let key = CacheKey {
            generation,
            handler,
            outgoing,
            qualifier,
        };

        let Ok(mut inner) = self.inner.write() else {
            return Ok(compiled);
        };
        if inner.generation != generation {
            // Cleared while compiling; do not resurrect the old generation.
            return Ok(compiled);
        }
        if let Some(existing) = inner.entries.get(&key) {
            debug!(handler = %handler, "Signature compiled concurrently by another request");
            return Ok(Arc::clone(existing));
        }
        inner.entries.insert(key.clone(), Arc::clone(&compiled));
        debug!(
            handler = %handler,
            outgoing = key.outgoing,
            qualifier = %key.qualifier,
            fields = compiled.len(),
            cache_size = inner.entries.len(),
            "Signature compiled and cached"
        );
        Ok(compiled)
    }

    /// Number of cached signatures.
    #[must_use]
    pub fn size(&self) -> usize {
        self.inner.read().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.write() {
            let dropped = inner.entries.len();
            inner.entries.clear();
            inner.generation += 1;
            info!(dropped, generation = inner.generation, "Signature cache cleared");
        }
    }
}

impl Default for SignatureCache {
    fn default() -> Self {
        Self::new(true)
    }
}
