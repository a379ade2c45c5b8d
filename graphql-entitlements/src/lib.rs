//! Entitlement based authorization for GraphQL requests.
//!
//! An entitlement names the part of the graph a caller may access, as a dot separated path
//! starting with the operation kind: `query.listener.playback`. Wildcards grant whole regions at
//! once, `*` for one level and `**` for every level below (see [`pattern`]).
//!
//! ## Authorizing a request
//!
//! [`authorize`] lists every field path of a request that none of the granted entitlements
//! cover. An empty list means the request is authorized.
//!
//! ## Deriving entitlements from a schema
//!
//! Instead of writing entitlement lists by hand, a schema can declare which scope grants what
//! with the `@scope` directive. [`derive_entitlements`] turns such a schema into the list of
//! entitlements of every scope (see [`schema`]).
//!
//! ## Host integration
//!
//! The [`policy`] module runs an authorization against properties and variables provided by a
//! host, and records the outcome into its variables.

#![warn(
    rustdoc::broken_intra_doc_links,
    unreachable_pub,
    unreachable_patterns,
    unused,
    unused_qualifications,
    dead_code,
    while_true,
    unconditional_panic,
    clippy::all
)]

pub mod authorization;
pub mod configuration;
pub mod document;
pub mod error;
pub mod paths;
pub mod pattern;
pub mod policy;
pub mod schema;

pub use crate::authorization::GrantedEntitlements;
pub use crate::authorization::authorize;
pub use crate::document::ParserLimits;
pub use crate::document::Source;
pub use crate::error::EntitlementError;
pub use crate::error::SyntaxError;
pub use crate::pattern::EntitlementPattern;
pub use crate::schema::EntitlementCatalogue;

/// Parse `request` and extract the access paths of its operations.
pub fn extract_paths<'a>(request: impl Into<Source<'a>>) -> Result<Vec<String>, SyntaxError> {
    let document = document::parse(request, &ParserLimits::default())?;
    Ok(paths::extract_paths(&document))
}

/// Parse `schema` and derive the entitlements of every scope it declares.
///
/// Paths are explored up to `max_depth` nodes, the root counting as one. `None` or `Some(0)`
/// selects [`schema::DEFAULT_MAX_DEPTH`].
pub fn derive_entitlements<'a>(
    schema: impl Into<Source<'a>>,
    max_depth: Option<usize>,
) -> Result<EntitlementCatalogue, EntitlementError> {
    derive_entitlements_with_limits(schema, max_depth, &ParserLimits::default())
}

/// [`derive_entitlements`], with custom parser limits.
pub fn derive_entitlements_with_limits<'a>(
    schema: impl Into<Source<'a>>,
    max_depth: Option<usize>,
    limits: &ParserLimits,
) -> Result<EntitlementCatalogue, EntitlementError> {
    let document = document::parse(schema, limits)?;
    let graph = schema::SchemaGraph::build(&document)?;
    Ok(schema::derive(&graph, max_depth))
}
