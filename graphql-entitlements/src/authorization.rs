//! Checking a request against granted entitlements.
use serde::Deserialize;
use serde::Serialize;

use crate::document::ParserLimits;
use crate::document::Source;
use crate::error::SyntaxError;
use crate::paths::extract_paths;
use crate::pattern::EntitlementPattern;

/// The entitlements granted to a caller, in the order they were given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantedEntitlements(Vec<EntitlementPattern>);

impl GrantedEntitlements {
    /// Split a list of entitlements separated by whitespace, commas or semicolons.
    pub fn parse(list: &str) -> Self {
        list.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
            .filter(|entitlement| !entitlement.is_empty())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntitlementPattern> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for GrantedEntitlements {
    fn from(list: &str) -> Self {
        Self::parse(list)
    }
}

impl From<&String> for GrantedEntitlements {
    fn from(list: &String) -> Self {
        Self::parse(list)
    }
}

impl From<Vec<String>> for GrantedEntitlements {
    fn from(entitlements: Vec<String>) -> Self {
        entitlements.into_iter().collect()
    }
}

impl From<&[&str]> for GrantedEntitlements {
    fn from(entitlements: &[&str]) -> Self {
        entitlements.iter().copied().collect()
    }
}

impl<const N: usize> From<[&str; N]> for GrantedEntitlements {
    fn from(entitlements: [&str; N]) -> Self {
        entitlements.into_iter().collect()
    }
}

impl<P: Into<EntitlementPattern>> FromIterator<P> for GrantedEntitlements {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Remove from `required` every path covered by one of the `granted` entitlements.
///
/// The surviving paths keep their relative order. An empty result means every path is
/// authorized.
pub fn unauthorized_paths(
    mut required: Vec<String>,
    granted: &GrantedEntitlements,
) -> Vec<String> {
    for entitlement in granted.iter() {
        if required.is_empty() {
            break;
        }
        let before = required.len();
        required.retain(|path| !entitlement.matches(path));
        tracing::trace!(
            %entitlement,
            matched = before - required.len(),
            remaining = required.len(),
            "applied entitlement"
        );
    }
    required
}

/// Find the paths of `request` that none of the `granted` entitlements cover.
///
/// Returns an empty list when the request is fully authorized. Being unauthorized is not an
/// error: the caller decides what to do with the returned paths.
pub fn authorize<'a>(
    request: impl Into<Source<'a>>,
    granted: impl Into<GrantedEntitlements>,
) -> Result<Vec<String>, SyntaxError> {
    authorize_with_limits(request, granted, &ParserLimits::default())
}

pub(crate) fn authorize_with_limits<'a>(
    request: impl Into<Source<'a>>,
    granted: impl Into<GrantedEntitlements>,
    limits: &ParserLimits,
) -> Result<Vec<String>, SyntaxError> {
    let document = crate::document::parse(request, limits)?;
    let required = extract_paths(&document);
    tracing::debug!(required = required.len(), "extracted access paths");

    Ok(unauthorized_paths(required, &granted.into()))
}
