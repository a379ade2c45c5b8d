//! The `@scope` directive:
//!
//! ```graphql
//! directive @scope(name: String!, query: Boolean, mutation: Boolean, cascade: Boolean) on OBJECT | FIELD_DEFINITION
//! ```
//!
//! * `name`: the scope the entitlements are derived for
//! * `query` (default: false): whether the scope applies below the query root
//! * `mutation` (default: false): whether the scope applies below the mutation root
//! * `cascade` (default: true): whether the scope also grants every descendant
use apollo_compiler::ast;
use serde::Serialize;

use crate::error::EntitlementError;

pub(crate) const SCOPE_DIRECTIVE_NAME: &str = "scope";

/// Where a `@scope` directive was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeAttachment {
    /// On a field definition: the scope grants the field itself.
    Field,
    /// On a type definition: the scope grants the fields of any field returning the type.
    Type,
}

/// A scope declared with `@scope`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scope {
    pub name: String,
    pub query: bool,
    pub mutation: bool,
    pub cascade: bool,
    pub attachment: ScopeAttachment,
}

impl Scope {
    /// Grants the exact path it is reached at.
    pub fn is_self(&self) -> bool {
        self.attachment == ScopeAttachment::Field
    }

    /// Grants one level below the path it is reached at.
    pub fn is_children(&self) -> bool {
        self.attachment == ScopeAttachment::Type
    }

    /// Entitlements granted when the scope is reached at `base`.
    pub(crate) fn entitlements(&self, base: &str) -> Vec<String> {
        let mut entitlements = Vec::with_capacity(2);
        if self.is_self() {
            entitlements.push(base.to_string());
        }
        if self.is_children() {
            entitlements.push(format!("{base}.*"));
        }
        if self.cascade {
            entitlements.push(format!("{base}.**"));
        }
        entitlements
    }
}

/// Collect the `@scope` directives of `directives`, in declaration order.
pub fn scopes_of(
    directives: &ast::DirectiveList,
    attachment: ScopeAttachment,
) -> Result<Vec<Scope>, EntitlementError> {
    directives
        .iter()
        .filter(|directive| directive.name.as_str() == SCOPE_DIRECTIVE_NAME)
        .map(|directive| scope_from_directive(directive, attachment))
        .collect()
}

fn scope_from_directive(
    directive: &ast::Directive,
    attachment: ScopeAttachment,
) -> Result<Scope, EntitlementError> {
    let name = match argument(directive, "name") {
        Some(ast::Value::Enum(name)) => Some(name.as_str()),
        Some(value) => value.as_str(),
        None => None,
    }
    .filter(|name| !name.is_empty())
    .ok_or_else(|| EntitlementError::InvalidScope {
        message: "the `name` argument must be a non-empty string".to_string(),
    })?;

    let boolean = |name: &str, default: bool| match argument(directive, name) {
        Some(ast::Value::Boolean(value)) => *value,
        _ => default,
    };

    Ok(Scope {
        name: name.to_string(),
        query: boolean("query", false),
        mutation: boolean("mutation", false),
        cascade: boolean("cascade", true),
        attachment,
    })
}

fn argument<'a>(directive: &'a ast::Directive, name: &str) -> Option<&'a ast::Value> {
    directive
        .arguments
        .iter()
        .find(|argument| argument.name.as_str() == name)
        .map(|argument| &*argument.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object_directives(sdl: &str) -> ast::DirectiveList {
        let document = ast::Document::parse(sdl, "schema.graphql").unwrap();
        document
            .definitions
            .iter()
            .find_map(|definition| match definition {
                ast::Definition::ObjectTypeDefinition(object) => Some(object.directives.clone()),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn arguments_default_when_missing() {
        let directives = object_directives(r#"type T @scope(name: "a") { f: Int }"#);
        let scopes = scopes_of(&directives, ScopeAttachment::Type).unwrap();
        assert_eq!(
            scopes,
            vec![Scope {
                name: "a".to_string(),
                query: false,
                mutation: false,
                cascade: true,
                attachment: ScopeAttachment::Type,
            }]
        );
    }

    #[test]
    fn other_directives_are_ignored() {
        let directives = object_directives(
            r#"type T @key(fields: "id") @scope(name: "a", query: true, cascade: false) @scope(name: b, mutation: true) { f: Int }"#,
        );
        let scopes = scopes_of(&directives, ScopeAttachment::Field).unwrap();
        assert_eq!(scopes.len(), 2);
        assert_eq!(scopes[0].name, "a");
        assert!(scopes[0].query && !scopes[0].mutation && !scopes[0].cascade);
        assert_eq!(scopes[1].name, "b");
        assert!(!scopes[1].query && scopes[1].mutation && scopes[1].cascade);
    }

    #[test]
    fn non_boolean_flags_fall_back_to_defaults() {
        let directives =
            object_directives(r#"type T @scope(name: "a", query: "true", cascade: 0) { f: Int }"#);
        let scope = &scopes_of(&directives, ScopeAttachment::Type).unwrap()[0];
        assert!(!scope.query);
        assert!(scope.cascade);
    }

    #[test]
    fn missing_name_is_rejected() {
        for sdl in [
            r#"type T @scope(query: true) { f: Int }"#,
            r#"type T @scope(name: "") { f: Int }"#,
            r#"type T @scope(name: 3) { f: Int }"#,
        ] {
            let error = scopes_of(&object_directives(sdl), ScopeAttachment::Type).unwrap_err();
            assert!(matches!(error, EntitlementError::InvalidScope { .. }), "{sdl}");
        }
    }

    #[test]
    fn entitlements_depend_on_attachment_and_cascade() {
        let mut scope = Scope {
            name: "a".to_string(),
            query: true,
            mutation: false,
            cascade: true,
            attachment: ScopeAttachment::Field,
        };
        assert_eq!(scope.entitlements("query.posts"), vec!["query.posts", "query.posts.**"]);

        scope.attachment = ScopeAttachment::Type;
        assert_eq!(scope.entitlements("query.posts"), vec!["query.posts.*", "query.posts.**"]);

        scope.cascade = false;
        assert_eq!(scope.entitlements("query.posts"), vec!["query.posts.*"]);
    }
}
