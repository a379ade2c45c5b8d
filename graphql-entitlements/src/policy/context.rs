//! An in-memory [`Host`].
//!
//! Properties are fixed when the context is created. Variables live in a DashMap shared by
//! every clone of the context, so the outcome of a policy run can be read back by whoever
//! holds another handle.
use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::Host;

type Entries = Arc<DashMap<String, Value>>;

#[derive(Clone, Debug, Default)]
pub struct Context {
    properties: Arc<IndexMap<String, String>>,
    entries: Entries,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_properties(properties: IndexMap<String, String>) -> Self {
        Self {
            properties: Arc::new(properties),
            entries: Default::default(),
        }
    }

    pub fn get<K, V>(&self, key: K) -> Result<Option<V>, serde_json::Error>
    where
        K: Into<String>,
        V: DeserializeOwned,
    {
        self.entries
            .get(&key.into())
            .map(|value| serde_json::from_value(value.value().clone()))
            .transpose()
    }

    /// Insert a variable, returning the value it replaced.
    pub fn insert<K, V>(&self, key: K, value: V) -> Result<Option<V>, serde_json::Error>
    where
        K: Into<String>,
        V: DeserializeOwned + Serialize,
    {
        let value = serde_json::to_value(value)?;
        self.entries
            .insert(key.into(), value)
            .map(serde_json::from_value)
            .transpose()
    }

    pub fn insert_json_value(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    pub fn get_json_value(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|value| value.value().clone())
    }

    /// A copy of every variable, sorted by name.
    pub fn variables(&self) -> BTreeMap<String, Value> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

impl Host for Context {
    fn property(&self, name: &str) -> Option<String> {
        self.properties.get(name).cloned()
    }

    fn variable(&self, name: &str) -> Option<Value> {
        self.get_json_value(name)
    }

    fn set_variable(&self, name: &str, value: Value) {
        self.insert_json_value(name, value);
    }
}
