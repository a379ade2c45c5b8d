//! Turning request or schema input into an [`ast::Document`].
use std::borrow::Cow;

use apollo_compiler::ast;
use apollo_compiler::parser::Parser;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

use crate::error::SyntaxError;

/// Input accepted by the engine: either raw GraphQL text or a document that was already parsed.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    Text(&'a str),
    Document(&'a ast::Document),
}

impl<'a> From<&'a str> for Source<'a> {
    fn from(text: &'a str) -> Self {
        Source::Text(text)
    }
}

impl<'a> From<&'a String> for Source<'a> {
    fn from(text: &'a String) -> Self {
        Source::Text(text.as_str())
    }
}

impl<'a> From<&'a ast::Document> for Source<'a> {
    fn from(document: &'a ast::Document) -> Self {
        Source::Document(document)
    }
}

/// Limits applied by the GraphQL parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ParserLimits {
    /// Maximum nesting of selection sets and values.
    /// default: 500
    #[serde(default = "default_parser_recursion_limit")]
    pub parser_recursion_limit: usize,

    /// Maximum number of tokens in a single document.
    /// default: 15000
    #[serde(default = "default_parser_token_limit")]
    pub parser_token_limit: usize,
}

fn default_parser_recursion_limit() -> usize {
    500
}

fn default_parser_token_limit() -> usize {
    15_000
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self {
            parser_recursion_limit: default_parser_recursion_limit(),
            parser_token_limit: default_parser_token_limit(),
        }
    }
}

/// Parse `source` into an AST document.
///
/// Documents are passed through untouched. Text is handed to the GraphQL parser; empty text
/// and any syntax error are reported as a [`SyntaxError`]. No validation happens beyond syntax.
pub fn parse<'a>(
    source: impl Into<Source<'a>>,
    limits: &ParserLimits,
) -> Result<Cow<'a, ast::Document>, SyntaxError> {
    match source.into() {
        Source::Document(document) => Ok(Cow::Borrowed(document)),
        Source::Text(text) => {
            if text.trim().is_empty() {
                return Err(SyntaxError::empty_source());
            }

            let mut parser = Parser::new()
                .recursion_limit(limits.parser_recursion_limit)
                .token_limit(limits.parser_token_limit);
            let result = parser.parse_ast(text, "document.graphql");

            let recursion_limit = parser.recursion_reached();
            tracing::trace!(?recursion_limit, "recursion limit data");

            Ok(Cow::Owned(result?))
        }
    }
}
