//! Key/value resolution shared by the loaders of one load call.
//!
//! Keys are flag names compared case-insensitively. For every key the store
//! knows a seeded default, the environment variable bound to it, a value
//! passed on the command line and a value merged from a document. Lookups
//! resolve in that reverse order: flag, environment, document, default.

use crate::environment::{EnvSource, ProcessEnv};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
struct Entry {
    default: Option<String>,
    env_var: Option<String>,
    url: Option<String>,
    flag: Option<String>,
}

pub struct ValueStore {
    entries: HashMap<String, Entry>,
    document: HashMap<String, String>,
    env: Arc<dyn EnvSource>,
}

impl ValueStore {
    /// Store backed by the process environment
    pub fn new() -> Self {
        Self::with_env(Arc::new(ProcessEnv))
    }

    pub fn with_env(env: Arc<dyn EnvSource>) -> Self {
        Self {
            entries: HashMap::new(),
            document: HashMap::new(),
            env,
        }
    }

    fn entry(&mut self, key: &str) -> &mut Entry {
        self.entries.entry(key.to_lowercase()).or_default()
    }

    pub fn set_default(&mut self, key: &str, value: impl Into<String>) {
        self.entry(key).default = Some(value.into());
    }

    pub fn bind_env(&mut self, key: &str, env_var: impl Into<String>) {
        self.entry(key).env_var = Some(env_var.into());
    }

    /// Associate `key` with a name in an external source namespace
    pub fn bind_url(&mut self, key: &str, url: impl Into<String>) {
        self.entry(key).url = Some(url.into());
    }

    /// Record a value given explicitly on the command line
    pub fn set_flag(&mut self, key: &str, value: impl Into<String>) {
        self.entry(key).flag = Some(value.into());
    }

    /// Merge document values; later merges overwrite earlier ones per key
    pub fn merge_document(&mut self, values: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in values {
            self.document.insert(key.to_lowercase(), value);
        }
    }

    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.entries.get(&key.to_lowercase())?.env_var.as_deref()
    }

    pub fn url(&self, key: &str) -> Option<&str> {
        self.entries.get(&key.to_lowercase())?.url.as_deref()
    }

    pub fn document_value(&self, key: &str) -> Option<&str> {
        self.document.get(&key.to_lowercase()).map(String::as_str)
    }

    /// Resolve `key` to its raw string value
    ///
    /// Empty environment values count as unset.
    pub fn get(&self, key: &str) -> Option<String> {
        let key = key.to_lowercase();
        let entry = self.entries.get(&key);

        if let Some(flag) = entry.and_then(|e| e.flag.clone()) {
            return Some(flag);
        }
        let from_env = entry
            .and_then(|e| e.env_var.as_deref())
            .and_then(|var| self.env.var(var))
            .filter(|value| !value.is_empty());
        if from_env.is_some() {
            return from_env;
        }
        if let Some(value) = self.document.get(&key) {
            return Some(value.clone());
        }
        entry.and_then(|e| e.default.clone())
    }

    pub fn get_string(&self, key: &str) -> String {
        self.get(key).unwrap_or_default()
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key)?.trim().parse().ok()
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key)?.trim().parse().ok()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key)?.trim().parse().ok()
    }
}

impl Default for ValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ValueStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueStore")
            .field("entries", &self.entries)
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}
