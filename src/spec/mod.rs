//! # Spec Module
//!
//! Strongly typed form of the declarative, Swagger 2.0 style schema that drives routing,
//! validation and redaction.
//!
//! ## Overview
//!
//! Every HTTP method registered on a path carries an [`Operation`]: its `consumes`/`produces`
//! lists, `parameters`, `responses` and a handful of custom keys. Custom keys are written with
//! a configurable prefix (default `is-x-`), for example `is-x-validateResponse: false` or
//! `is-x-obscure: true` on a field that must never reach the logs.
//!
//! Shared fragments live in a [`Catalog`] and are referenced with `$ref`:
//!
//! - `#/definitions/<name>` for schemas
//! - `#/parameters/<name>` for parameters
//! - `#/responses/<name>` for responses
//!
//! ## Loading
//!
//! ```rust,ignore
//! use swagrouter::spec::{load_catalog, Operation};
//!
//! let catalog = load_catalog("api/catalog.yaml")?;
//! let op = Operation::from_yaml_str(include_str!("get_pet.yaml"))?;
//! ```
//!
//! Parsing happens once, at registration. Structural checks that need the catalog (type
//! tables, `$ref` targets, required auxiliary keys) happen when a signature is compiled; see
//! [`crate::signature`].

mod catalog;
mod error;
mod load;
mod types;

pub use catalog::{
    generic_failure_response, generic_success_response, parse_ref, Catalog, RefGroup,
};
pub use error::SchemaError;
pub use load::{load_catalog, load_operation};
pub use types::{
    extension, Extensions, Location, Operation, OperationFlags, Parameter, Required, ResponseDef,
    SchemaFragment, SchemaType,
};
pub(crate) use types::truthy;
