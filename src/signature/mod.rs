//! # Signature Module
//!
//! Turns declarative schema fragments into normalized [`DataSignature`]s, the form the
//! [`validator`](crate::validator) and [`redact`](crate::redact) modules work from.
//!
//! ## Directions and qualifiers
//!
//! A signature is always compiled for one half of an operation:
//!
//! - **incoming**, qualified by a parameter location (`header`, `query`, `formData`, `body`).
//!   Parameters declared in that location become fields. The body parameter's `schema` is read
//!   as an object whose properties become the top-level fields.
//! - **outgoing**, qualified by a response key (`"200"`, `"default"`). Only compiled when the
//!   operation `produces` JSON.
//!
//! ## Example
//!
//! ```rust,ignore
//! use swagrouter::signature::{Direction, SignatureCompiler};
//! use swagrouter::spec::{Catalog, Location};
//!
//! let catalog = Catalog::with_generic_responses();
//! let compiler = SignatureCompiler::new(&catalog, "is-x-");
//! let query = compiler.compile(&operation, Direction::Incoming(Location::Query))?;
//! let ok = compiler.compile(&operation, Direction::Outgoing("200"))?;
//! ```
//!
//! ## Errors
//!
//! Compilation fails with a [`SchemaError`](crate::spec::SchemaError) when a fragment has no
//! `type`, declares a type its location does not allow (an `object` in `query`), carries a
//! malformed `$ref`, or misses an auxiliary key its type requires (`format` on `number`,
//! `collectionFormat` on non-body arrays).

mod compile;
mod types;

pub use compile::{Direction, SignatureCompiler};
pub use types::{
    ArrayRules, Bound, CollectionFormat, Constraints, DataSignature, FieldSpec, NumberFormat,
    NumberRules, Pattern, StringFormat, StringRules, ITEMS_KEY,
};
