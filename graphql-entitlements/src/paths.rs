//! Access paths touched by a request.
//!
//! Every leaf selection of an operation becomes one dot separated path, prefixed by the
//! operation kind:
//!
//! ```graphql
//! {
//!   listener {
//!     name
//!     ... on Premium { tier }
//!   }
//! }
//! ```
//!
//! yields `query.listener.name` and `query.listener.Premium.tier`.
use apollo_compiler::ast;

/// Extract the access paths of every operation in `document`, depth first, in the order the
/// selections appear.
pub fn extract_paths(document: &ast::Document) -> Vec<String> {
    document
        .definitions
        .iter()
        .flat_map(definition_paths)
        .collect()
}

fn definition_paths(definition: &ast::Definition) -> Vec<String> {
    match definition {
        ast::Definition::OperationDefinition(operation) => operation_paths(operation),
        ast::Definition::FragmentDefinition(fragment) => {
            tracing::debug!(
                fragment = %fragment.name,
                "fragment definitions contribute no access paths"
            );
            Vec::new()
        }
        // type system definitions carry no selections
        _ => Vec::new(),
    }
}

fn operation_paths(operation: &ast::OperationDefinition) -> Vec<String> {
    let prefix = match operation.operation_type {
        ast::OperationType::Query => "query",
        ast::OperationType::Mutation => "mutation",
        ast::OperationType::Subscription => {
            tracing::debug!("subscription operations contribute no access paths");
            return Vec::new();
        }
    };

    prefixed(prefix, selection_set_paths(&operation.selection_set))
}

fn selection_set_paths(selection_set: &[ast::Selection]) -> Vec<String> {
    selection_set.iter().flat_map(selection_paths).collect()
}

fn selection_paths(selection: &ast::Selection) -> Vec<String> {
    match selection {
        ast::Selection::Field(field) => {
            nested_paths(field.name.as_str(), &field.selection_set)
        }
        ast::Selection::InlineFragment(fragment) => match &fragment.type_condition {
            Some(type_condition) => {
                nested_paths(type_condition.as_str(), &fragment.selection_set)
            }
            None => Vec::new(),
        },
        ast::Selection::FragmentSpread(spread) => {
            tracing::debug!(
                fragment = %spread.fragment_name,
                "fragment spreads are not expanded, they contribute no access paths"
            );
            Vec::new()
        }
    }
}

/// A field, or a type condition, with its own name as the first segment.
///
/// When nothing below contributes a path, the name alone is the path.
fn nested_paths(name: &str, selection_set: &[ast::Selection]) -> Vec<String> {
    let paths = selection_set_paths(selection_set);
    if paths.is_empty() {
        vec![name.to_string()]
    } else {
        prefixed(name, paths)
    }
}

fn prefixed(prefix: &str, paths: Vec<String>) -> Vec<String> {
    paths
        .into_iter()
        .map(|path| format!("{prefix}.{path}"))
        .collect()
}
