//! Deriving the entitlements each scope grants from a [`SchemaGraph`].
use std::fmt;

use indexmap::IndexMap;
use itertools::Itertools;
use petgraph::graph::NodeIndex;
use serde::Deserialize;
use serde::Serialize;

use super::graph::MUTATION_ORIGIN;
use super::graph::QUERY_ORIGIN;
use super::graph::SchemaGraph;
use super::scope::Scope;

/// Depth used when none, or zero, is requested. The origin counts as the first level.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Entitlements per scope name.
///
/// Scopes are listed in the order the traversal first reached them. A scope that was reached
/// only below an origin it does not apply to is listed with no entitlements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntitlementCatalogue(IndexMap<String, Vec<String>>);

impl EntitlementCatalogue {
    pub fn get(&self, scope: &str) -> Option<&[String]> {
        self.0.get(scope).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(scope, entitlements)| (scope.as_str(), entitlements.as_slice()))
    }

    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<IndexMap<String, Vec<String>>> for EntitlementCatalogue {
    fn from(entitlements: IndexMap<String, Vec<String>>) -> Self {
        Self(entitlements)
    }
}

impl<S, E> FromIterator<(S, Vec<E>)> for EntitlementCatalogue
where
    S: Into<String>,
    E: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (S, Vec<E>)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(scope, entitlements)| {
                    (
                        scope.into(),
                        entitlements.into_iter().map(Into::into).collect(),
                    )
                })
                .collect(),
        )
    }
}

impl fmt::Display for EntitlementCatalogue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, (scope, entitlements)) in self.0.iter().enumerate() {
            if position > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{scope}:")?;
            if !entitlements.is_empty() {
                write!(f, " {}", entitlements.join(", "))?;
            }
        }
        Ok(())
    }
}

/// Walk every path of `graph` from its origins, depth first, and collect the entitlements
/// granted by the scopes found along the way.
///
/// A path never goes through the same node twice and is at most `max_depth` nodes long.
pub fn derive(graph: &SchemaGraph, max_depth: Option<usize>) -> EntitlementCatalogue {
    let max_depth = max_depth
        .filter(|depth| *depth > 0)
        .unwrap_or(DEFAULT_MAX_DEPTH);

    let mut catalogue = IndexMap::<String, Vec<String>>::new();
    let mut stack: Vec<Vec<NodeIndex>> = graph
        .origins()
        .iter()
        .map(|origin| vec![*origin])
        .collect();
    let mut explored = 0usize;

    while let Some(path) = stack.pop() {
        if path.len() > max_depth {
            continue;
        }
        let (Some(first), Some(last)) = (path.first(), path.last()) else {
            continue;
        };
        explored += 1;

        let origin = graph.node(*first).name.as_str();
        let scopes = &graph.node(*last).scopes;
        if !scopes.is_empty() {
            let base = path
                .iter()
                .map(|index| graph.node(*index).name.as_str())
                .join(".");
            for scope in scopes {
                let entitlements = catalogue.entry(scope.name.clone()).or_default();
                if !applies_below(scope, origin) {
                    continue;
                }
                entitlements.extend(scope.entitlements(&base));
            }
        }

        for child in graph.children(*last) {
            if path.contains(&child) {
                continue;
            }
            let mut extended = Vec::with_capacity(path.len() + 1);
            extended.extend_from_slice(&path);
            extended.push(child);
            stack.push(extended);
        }
    }

    tracing::debug!(
        max_depth,
        explored,
        scopes = catalogue.len(),
        "derived entitlements"
    );
    EntitlementCatalogue(catalogue)
}

fn applies_below(scope: &Scope, origin: &str) -> bool {
    match origin {
        QUERY_ORIGIN => scope.query,
        MUTATION_ORIGIN => scope.mutation,
        _ => true,
    }
}
