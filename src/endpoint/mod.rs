//! # Endpoint Module
//!
//! Per-request orchestration of a resolved route.
//!
//! A route node carries one [`MethodHandler`] per HTTP method: the declarative
//! [`Operation`](crate::spec::Operation), its authentication chain and the logic closure.
//! [`Endpoint`] drives a single request through that handler:
//!
//! ```text
//! Resolved ─► Authenticated ─► RequestValidated ─► LogicExecuted ─► ResponseValidated ─► Done
//! ```
//!
//! Any step may jump straight to `Done`. Denied authentication and invalid request data are
//! answered with a JSON failure envelope; schema problems, a handler error or panic, and a
//! response that breaks its declared schema surface as [`EndpointError`] for the caller to map
//! to a 500.
//!
//! ## Example
//!
//! ```rust,ignore
//! use swagrouter::endpoint::{Endpoint, MethodHandler};
//! use swagrouter::security::{AllowAll, AuthEntry};
//! use swagrouter::server::Response;
//!
//! let handler = MethodHandler::new(operation, vec![AuthEntry::new(AllowAll)], |ctx| {
//!     Ok(Response::success("done"))
//! });
//! ```

mod core;
mod error;
mod handler;

pub use self::core::{Endpoint, EndpointState};
pub use error::EndpointError;
pub use handler::{LogicFn, MethodHandler};
