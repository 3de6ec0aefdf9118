//! # Router Module
//!
//! Resolves request paths against a tree of literal and typed-placeholder segments.
//!
//! ## Overview
//!
//! Routes are registered into a [`RouteTree`], an arena of [`PathNode`]s addressed by
//! [`NodeId`]. A node is terminal when it carries a handler set keyed by [`http::Method`];
//! terminal nodes may still have children, so `/users` and `/users/{id}` coexist.
//!
//! Placeholder segments are declared in the path itself as `{prefix}{type}-{name}`:
//!
//! ```text
//! tests/validation/is-x-integer-paramName/is-x-string-otherParam
//! ```
//!
//! ## Resolution
//!
//! Resolution never stops at the first hit. Every literal child matching the next segment and
//! every placeholder child whose type accepts it (checked with
//! [`simple_validate`](crate::validator::simple_validate)) is explored, and each terminal node
//! reached becomes a candidate carrying its unconsumed segments. The winner is then picked by:
//!
//! 1. fewest remaining segments,
//! 2. a literal final segment over a placeholder,
//! 3. the placeholder type priority (`integer` before `string` by default).
//!
//! If a tie survives the rule that should settle it, resolution fails with
//! [`RouteError::Ambiguous`] instead of guessing.
//!
//! ## Example
//!
//! ```rust,ignore
//! use http::Method;
//! use swagrouter::router::RouteTree;
//!
//! let mut tree = RouteTree::new("is-x-");
//! tree.insert("users/is-x-integer-id", Method::GET, "by id")?;
//! tree.insert("users/me", Method::GET, "current user")?;
//!
//! let found = tree.resolve(&["users", "42"])?.expect("route");
//! assert_eq!(found.path_params["id"], 42.into());
//! ```

mod error;
mod resolve;
mod tree;

pub use error::RouteError;
pub use resolve::RouteMatch;
pub use tree::{NodeId, PathNode, RouteTree, SegmentKind, HTTP_METHODS};
