//! Entitlement errors.
use apollo_compiler::ast;
use apollo_compiler::validation::DiagnosticList;
use apollo_compiler::validation::WithErrors;
use displaydoc::Display;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// A request or schema could not be parsed.
///
/// Holds one entry per diagnostic reported by the GraphQL parser, in the order they were
/// reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxError {
    pub errors: Vec<SyntaxErrorDetail>,
}

/// A single parser diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxErrorDetail {
    pub message: String,
    /// Position of the offending token, when the parser knows it.
    pub location: Option<Location>,
}

/// 1-based line and column in the parsed source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl SyntaxError {
    pub(crate) fn empty_source() -> Self {
        Self {
            errors: vec![SyntaxErrorDetail {
                message: "Null or empty string".to_string(),
                location: None,
            }],
        }
    }
}

impl From<DiagnosticList> for SyntaxError {
    fn from(errors: DiagnosticList) -> Self {
        Self {
            errors: errors
                .iter()
                .map(|diagnostic| {
                    let error = diagnostic.unstable_to_json_compat();
                    SyntaxErrorDetail {
                        message: error.message,
                        location: error.locations.first().map(|location| Location {
                            line: location.line,
                            column: location.column,
                        }),
                    }
                })
                .collect(),
        }
    }
}

impl From<WithErrors<ast::Document>> for SyntaxError {
    fn from(WithErrors { errors, .. }: WithErrors<ast::Document>) -> Self {
        errors.into()
    }
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Syntax Error: ")?;
        for (index, error) in self.errors.iter().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            if let Some(location) = error.location {
                write!(
                    f,
                    "[{}:{}] {}",
                    location.line, location.column, error.message
                )?;
            } else {
                write!(f, "{}", error.message)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for SyntaxError {}

/// Error types for entitlement derivation.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EntitlementError {
    /// {0}
    Syntax(#[from] SyntaxError),

    /// invalid @scope directive: {message}
    InvalidScope {
        /// Why the directive was rejected.
        message: String,
    },
}
