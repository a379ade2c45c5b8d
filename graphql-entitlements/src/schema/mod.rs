//! Entitlements derived from a schema annotated with `@scope` directives.
//!
//! The schema is first turned into a [`SchemaGraph`] of the fields reachable from the `Query`
//! and `Mutation` root types, then walked depth first to list, for each scope, the entitlements
//! granting what the scope covers.
mod entitlements;
mod graph;
mod scope;

pub use entitlements::DEFAULT_MAX_DEPTH;
pub use entitlements::EntitlementCatalogue;
pub use entitlements::derive;
pub use graph::SchemaGraph;
pub use graph::SchemaNode;
pub use scope::Scope;
pub use scope::ScopeAttachment;
pub use scope::scopes_of;
