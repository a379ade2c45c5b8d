//! Entitlement patterns.
//!
//! An entitlement is a dot separated hierarchy of field names, for example
//! `query.listener.playback`. Two wildcards are supported:
//!
//! * `*` stands for exactly one segment: `query.*.playback` matches `query.listener.playback`
//!   but not `query.a.b.playback`.
//! * `**` stands for one or more segments: `query.listener.**` matches every path below
//!   `query.listener`.
//!
//! Wildcards may also appear inside a segment, where they match a run of characters: `*`
//! never crosses a `.`, `**` does.
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

const SEPARATOR: u8 = b'.';

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    /// `*`: one or more characters, the separator excluded.
    Wildcard,
    /// `**`: one or more characters of any kind.
    DoubleWildcard,
}

/// A granted entitlement, possibly containing wildcards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementPattern {
    source: String,
    tokens: Vec<Token>,
}

impl EntitlementPattern {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let tokens = tokenize(&source);
        Self { source, tokens }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether this pattern grants access to `path`.
    ///
    /// The whole path must be covered by the pattern, a pattern never matches a mere prefix.
    pub fn matches(&self, path: &str) -> bool {
        if self.source == path {
            return true;
        }

        let path = path.as_bytes();

        // reachable[i] is true when the tokens consumed so far can match path[..i]
        let mut reachable = vec![false; path.len() + 1];
        reachable[0] = true;

        for token in &self.tokens {
            let mut next = vec![false; path.len() + 1];
            match token {
                Token::Literal(literal) => {
                    let literal = literal.as_bytes();
                    for start in 0..=path.len() {
                        if reachable[start] && path[start..].starts_with(literal) {
                            next[start + literal.len()] = true;
                        }
                    }
                }
                Token::Wildcard => {
                    for start in 0..path.len() {
                        if !reachable[start] {
                            continue;
                        }
                        for end in start + 1..=path.len() {
                            if path[end - 1] == SEPARATOR {
                                break;
                            }
                            next[end] = true;
                        }
                    }
                }
                Token::DoubleWildcard => {
                    if let Some(first) = reachable.iter().position(|r| *r) {
                        next.iter_mut().skip(first + 1).for_each(|n| *n = true);
                    }
                }
            }

            if !next.contains(&true) {
                return false;
            }
            reachable = next;
        }

        reachable[path.len()]
    }
}

fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '*' {
            literal.push(c);
            continue;
        }

        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(&mut literal)));
        }
        if chars.next_if_eq(&'*').is_some() {
            tokens.push(Token::DoubleWildcard);
        } else {
            tokens.push(Token::Wildcard);
        }
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    tokens
}

/// Whether `pattern` grants access to `path`.
pub fn matches(pattern: &str, path: &str) -> bool {
    EntitlementPattern::new(pattern).matches(path)
}

impl FromStr for EntitlementPattern {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for EntitlementPattern {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<String> for EntitlementPattern {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

impl fmt::Display for EntitlementPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for EntitlementPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for EntitlementPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}
