//! Configuration of the engine and of the policy host.
//!
//! ```yaml
//! limits:
//!   parser_recursion_limit: 500
//!   parser_token_limit: 15000
//!   max_depth: 5
//! properties:
//!   input: "{request.content}"
//!   entitlements: "query.listener.**"
//! variables:
//!   request.content: "{ listener { name } }"
//! ```
use std::str::FromStr;

use indexmap::IndexMap;
use schemars::JsonSchema;
use schemars::schema::RootSchema;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::document::ParserLimits;
use crate::policy::Context;
use crate::schema::DEFAULT_MAX_DEPTH;

/// The configuration of the engine.
///
/// Can be created through `serde::Deserialize` from various formats, parsed from YAML with
/// [`FromStr`], or built in Rust code with [`Configuration::builder`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    /// Limits bounding the work done for a single document.
    #[serde(default)]
    pub limits: Limits,

    /// Properties of the policy host, such as `input`, `entitlements` and `debug`.
    #[serde(default)]
    pub properties: IndexMap<String, String>,

    /// Variables the policy host starts with.
    #[serde(default)]
    pub variables: IndexMap<String, Value>,
}

#[buildstructor::buildstructor]
impl Configuration {
    #[builder]
    pub fn new(
        limits: Option<Limits>,
        properties: Option<IndexMap<String, String>>,
        variables: Option<IndexMap<String, Value>>,
    ) -> Self {
        Self {
            limits: limits.unwrap_or_default(),
            properties: properties.unwrap_or_default(),
            variables: variables.unwrap_or_default(),
        }
    }

    pub fn parser_limits(&self) -> ParserLimits {
        ParserLimits {
            parser_recursion_limit: self.limits.parser_recursion_limit,
            parser_token_limit: self.limits.parser_token_limit,
        }
    }

    /// A policy host holding the configured properties and variables.
    pub fn context(&self) -> Context {
        let context = Context::with_properties(self.properties.clone());
        for (name, value) in &self.variables {
            context.insert_json_value(name.clone(), value.clone());
        }
        context
    }
}

impl FromStr for Configuration {
    type Err = serde_yaml::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_yaml::from_str(s)
    }
}

/// Configuration for operation limits, parser limits, and the like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Limits {
    /// Limit recursion in the GraphQL parser to protect against stack overflow.
    /// default: 500
    pub parser_recursion_limit: usize,

    /// Limit the number of tokens the GraphQL parser processes before aborting.
    /// default: 15000
    pub parser_token_limit: usize,

    /// Number of nodes, the root included, explored on each path when deriving entitlements.
    /// `0` selects the default.
    /// default: 5
    pub max_depth: usize,
}

#[buildstructor::buildstructor]
impl Limits {
    #[builder]
    pub fn new(
        parser_recursion_limit: Option<usize>,
        parser_token_limit: Option<usize>,
        max_depth: Option<usize>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            parser_recursion_limit: parser_recursion_limit
                .unwrap_or(defaults.parser_recursion_limit),
            parser_token_limit: parser_token_limit.unwrap_or(defaults.parser_token_limit),
            max_depth: max_depth.unwrap_or(defaults.max_depth),
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        let parser = ParserLimits::default();
        Self {
            parser_recursion_limit: parser.parser_recursion_limit,
            parser_token_limit: parser.parser_token_limit,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Generate a JSON schema for the configuration.
pub fn generate_config_schema() -> RootSchema {
    schemars::schema_for!(Configuration)
}
