//! Running an authorization on behalf of a host, such as an API gateway policy.
//!
//! The host provides the request and the granted entitlements as properties, which may refer to
//! its variables with `{variable.name}`. The outcome is recorded into the host variables:
//!
//! * `graphql.authz.authorized`: whether the request is fully authorized
//! * `graphql.authz.unauthorized_paths`: the paths that no entitlement covers
//! * `graphql.authz.error_message`: why the request was rejected
use std::sync::LazyLock;

use regex::Captures;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::authorization::authorize_with_limits;
use crate::document::ParserLimits;
use crate::error::SyntaxError;

mod context;

pub use context::Context;

pub const INPUT_PROPERTY: &str = "input";
pub const ENTITLEMENTS_PROPERTY: &str = "entitlements";
pub const DEBUG_PROPERTY: &str = "debug";

pub const AUTHORIZED_VARIABLE: &str = "graphql.authz.authorized";
pub const UNAUTHORIZED_PATHS_VARIABLE: &str = "graphql.authz.unauthorized_paths";
pub const ERROR_MESSAGE_VARIABLE: &str = "graphql.authz.error_message";

static VARIABLE_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\{([a-z0-9_.]+)\}").expect("Invalid regex pattern"));

/// Properties and variables of the environment a policy runs in.
pub trait Host {
    /// A configured property, before variable references are resolved.
    fn property(&self, name: &str) -> Option<String>;

    fn variable(&self, name: &str) -> Option<Value>;

    fn set_variable(&self, name: &str, value: Value);
}

/// Policy failures.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PolicyError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("GraphQL: Unauthorized access to: {}", paths.join(","))]
    Unauthorized { paths: Vec<String> },

    #[error("missing required property `{name}`")]
    MissingProperty { name: String },
}

/// Replace every `{name}` reference in `text` with the value of the host variable `name`.
///
/// Strings are inserted as is, other values as JSON. References to unknown, null or empty
/// variables are left untouched.
pub fn resolve_variables(host: &impl Host, text: &str) -> String {
    VARIABLE_REFERENCE
        .replace_all(text, |captures: &Captures| {
            let reference = &captures[0];
            match host.variable(&captures[1]) {
                Some(Value::String(value)) if !value.is_empty() => value,
                None | Some(Value::Null) | Some(Value::String(_)) => reference.to_string(),
                Some(value) => value.to_string(),
            }
        })
        .into_owned()
}

/// A property with its variable references resolved. Empty properties count as missing.
pub fn resolve_property(host: &impl Host, name: &str) -> Option<String> {
    host.property(name)
        .map(|property| resolve_variables(host, &property))
        .filter(|property| !property.is_empty())
}

/// Authorize the `input` property against the `entitlements` property, and record the outcome
/// into the host variables.
///
/// Succeeds only when the request is fully authorized.
pub fn authz(host: &impl Host, limits: &ParserLimits) -> Result<(), PolicyError> {
    let result = run(host, limits, debug_enabled(host));
    if let Err(error) = &result {
        if !matches!(error, PolicyError::Unauthorized { .. }) {
            host.set_variable(ERROR_MESSAGE_VARIABLE, Value::String(error.to_string()));
        }
        tracing::debug!(%error, "request rejected");
    }
    result
}

/// Only `true` enables debug logging, any other value leaves it off.
fn debug_enabled(host: &impl Host) -> bool {
    resolve_property(host, DEBUG_PROPERTY)
        .is_some_and(|debug| debug.trim().eq_ignore_ascii_case("true"))
}

fn run(host: &impl Host, limits: &ParserLimits, debug: bool) -> Result<(), PolicyError> {
    let input = resolve_property(host, INPUT_PROPERTY).ok_or_else(|| {
        PolicyError::MissingProperty {
            name: INPUT_PROPERTY.to_string(),
        }
    })?;
    let entitlements = resolve_property(host, ENTITLEMENTS_PROPERTY).unwrap_or_default();
    if debug {
        tracing::info!("graphql.authz.input: {input}");
        tracing::info!("graphql.authz.entitlements: {entitlements}");
    }

    let unauthorized_paths = authorize_with_limits(input.as_str(), entitlements.as_str(), limits)?;
    let authorized = unauthorized_paths.is_empty();
    if debug {
        tracing::info!(
            "graphql.authz.unauthorized_paths: {}",
            unauthorized_paths.join(",")
        );
        tracing::info!("graphql.authz.authorized: {authorized}");
    }

    host.set_variable(AUTHORIZED_VARIABLE, Value::Bool(authorized));
    if authorized {
        return Ok(());
    }

    let paths = Value::from(unauthorized_paths.clone());
    let error = PolicyError::Unauthorized {
        paths: unauthorized_paths,
    };
    let error_message = error.to_string();
    if debug {
        tracing::info!("graphql.authz.error_message: {error_message}");
    }

    host.set_variable(UNAUTHORIZED_PATHS_VARIABLE, paths);
    host.set_variable(ERROR_MESSAGE_VARIABLE, Value::String(error_message));
    Err(error)
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn host(properties: &[(&str, &str)]) -> Context {
        Context::with_properties(
            properties
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect::<IndexMap<_, _>>(),
        )
    }

    #[test]
    fn variable_references_are_resolved() {
        let host = host(&[]);
        host.set_variable("request.content", json!("{ a }"));
        host.set_variable("client.tier", json!(3));
        host.set_variable("empty", json!(""));
        host.set_variable("nothing", Value::Null);
        host.set_variable("disabled", json!(false));
        host.set_variable("zero", json!(0));

        assert_eq!(
            resolve_variables(&host, "{request.content} {Client.Tier} {client.tier}"),
            "{ a } {Client.Tier} 3"
        );
        assert_eq!(
            resolve_variables(&host, "{empty}{nothing}{unknown}{not a reference}"),
            "{empty}{nothing}{unknown}{not a reference}"
        );
        assert_eq!(resolve_variables(&host, "{disabled}/{zero}"), "false/0");
    }

    #[test]
    fn debug_accepts_only_true() {
        assert!(debug_enabled(&host(&[("debug", "true")])));
        assert!(debug_enabled(&host(&[("debug", " TRUE ")])));
        assert!(!debug_enabled(&host(&[("debug", "false")])));
        assert!(!debug_enabled(&host(&[("debug", "1")])));
        assert!(!debug_enabled(&host(&[])));

        let host = host(&[("debug", "{flags.debug}")]);
        host.set_variable("flags.debug", json!(true));
        assert!(debug_enabled(&host));
    }

    #[test]
    fn empty_properties_are_missing() {
        let host = host(&[("blank", ""), ("set", "value")]);
        assert_eq!(resolve_property(&host, "blank"), None);
        assert_eq!(resolve_property(&host, "unset"), None);
        assert_eq!(resolve_property(&host, "set").as_deref(), Some("value"));
    }

    #[test]
    fn authorized_requests_set_the_flag_only() {
        let host = host(&[
            ("input", "{request.content}"),
            ("entitlements", "query.listener.** query.stations.*"),
            ("debug", "true"),
        ]);
        host.set_variable("request.content", json!("{ listener { name } stations { id } }"));

        authz(&host, &ParserLimits::default()).unwrap();

        assert_eq!(host.variable(AUTHORIZED_VARIABLE), Some(json!(true)));
        assert_eq!(host.variable(UNAUTHORIZED_PATHS_VARIABLE), None);
        assert_eq!(host.variable(ERROR_MESSAGE_VARIABLE), None);
    }

    #[test]
    fn unauthorized_requests_record_the_paths() {
        let host = host(&[("input", "{ a b { c } }"), ("entitlements", "query.a")]);

        let error = authz(&host, &ParserLimits::default()).unwrap_err();

        assert_eq!(error.to_string(), "GraphQL: Unauthorized access to: query.b.c");
        assert_eq!(host.variable(AUTHORIZED_VARIABLE), Some(json!(false)));
        assert_eq!(
            host.variable(UNAUTHORIZED_PATHS_VARIABLE),
            Some(json!(["query.b.c"]))
        );
        assert_eq!(
            host.variable(ERROR_MESSAGE_VARIABLE),
            Some(json!("GraphQL: Unauthorized access to: query.b.c"))
        );
    }

    #[test]
    fn missing_entitlements_authorize_nothing() {
        let host = host(&[("input", "{ a b }")]);
        let error = authz(&host, &ParserLimits::default()).unwrap_err();
        assert_eq!(error.to_string(), "GraphQL: Unauthorized access to: query.a,query.b");
    }

    #[test]
    fn syntax_errors_record_the_message() {
        let host = host(&[("input", "{"), ("entitlements", "**")]);

        let error = authz(&host, &ParserLimits::default()).unwrap_err();

        assert!(matches!(error, PolicyError::Syntax(_)));
        assert_eq!(host.variable(AUTHORIZED_VARIABLE), None);
        let message = host.variable(ERROR_MESSAGE_VARIABLE).unwrap();
        assert!(message.as_str().unwrap().starts_with("Syntax Error: "));
    }

    #[test]
    fn missing_input_is_rejected() {
        let host = host(&[("entitlements", "**")]);
        let error = authz(&host, &ParserLimits::default()).unwrap_err();
        assert_eq!(error.to_string(), "missing required property `input`");
        assert_eq!(
            host.variable(ERROR_MESSAGE_VARIABLE),
            Some(json!("missing required property `input`"))
        );
    }
}
