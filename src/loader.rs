//! Pluggable loaders that write values into an already allocated config.
//!
//! A [`Manager`](crate::Manager) runs its loaders in the order they were
//! given. Each one may overwrite fields written by the loaders before it, so
//! the last loader to touch a field decides its value.

use crate::error::ConfigError;
use crate::field::{FieldDescriptor, FieldKind};
use crate::schema::{Bindable, Schema};
use crate::store::ValueStore;
use serde_yaml::Value;
use std::io::{self, IsTerminal, Read};

/// Populates a config from one source
pub trait Loader {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn load(&self, config: &mut dyn Bindable, store: &mut ValueStore) -> Result<(), ConfigError>;
}

fn apply_logged(field: &mut FieldDescriptor<'_>, raw: &str, source: &'static str) -> Result<(), ConfigError> {
    field.apply(raw)?;
    tracing::debug!(field = field.name(), value = %field.render(), source, "resolved field");
    Ok(())
}

/// Resolves every field through the value store: flag, then environment,
/// then merged document values, then the declared default.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandLineLoader;

impl Loader for CommandLineLoader {
    fn name(&self) -> &'static str {
        "command line"
    }

    fn load(&self, config: &mut dyn Bindable, store: &mut ValueStore) -> Result<(), ConfigError> {
        let mut schema = Schema::walk(config)?;
        for field in schema.iter_mut() {
            let Some(raw) = store.get(&field.key()) else {
                continue;
            };
            // An empty value leaves a string field untouched
            if raw.is_empty() && field.kind() == FieldKind::String {
                continue;
            }
            apply_logged(field, &raw, self.name())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum DocumentSource {
    Stdin,
    Text(String),
}

/// Reads a YAML (or JSON) document and applies its top-level keys.
///
/// Keys are matched case-insensitively against flag names. Scalars are used
/// as-is, lists of scalars are joined with commas and anything more deeply
/// nested is passed on as compact JSON. Matching fields are written
/// immediately and the values are also merged into the store, so later
/// loaders that resolve through it see them.
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    source: DocumentSource,
}

impl DocumentLoader {
    /// Read the document piped to standard input
    ///
    /// Nothing is read when standard input is an interactive terminal.
    pub fn stdin() -> Self {
        Self {
            source: DocumentSource::Stdin,
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            source: DocumentSource::Text(text.into()),
        }
    }

    /// Read the whole of `reader` up front
    pub fn from_reader(mut reader: impl Read) -> io::Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(Self::from_text(text))
    }

    fn read(&self) -> Result<Option<String>, ConfigError> {
        match &self.source {
            DocumentSource::Text(text) => Ok(Some(text.clone())),
            DocumentSource::Stdin => {
                let stdin = io::stdin();
                if stdin.is_terminal() {
                    return Ok(None);
                }
                let mut text = String::new();
                stdin
                    .lock()
                    .read_to_string(&mut text)
                    .map_err(|e| ConfigError::Loader {
                        loader: self.name().to_string(),
                        message: format!("failed to read standard input: {e}"),
                    })?;
                Ok(Some(text))
            }
        }
    }
}

impl Loader for DocumentLoader {
    fn name(&self) -> &'static str {
        "document"
    }

    fn load(&self, config: &mut dyn Bindable, store: &mut ValueStore) -> Result<(), ConfigError> {
        let Some(text) = self.read()? else {
            return Ok(());
        };
        let values = parse_document(&text)?;
        if values.is_empty() {
            return Ok(());
        }
        tracing::debug!(keys = values.len(), "merging document");
        store.merge_document(values);

        let mut schema = Schema::walk(config)?;
        for field in schema.iter_mut() {
            if let Some(raw) = store.document_value(&field.key()) {
                let raw = raw.to_string();
                apply_logged(field, &raw, self.name())?;
            }
        }
        Ok(())
    }
}

/// Flatten a document's top level into `(key, raw value)` pairs
pub fn parse_document(text: &str) -> Result<Vec<(String, String)>, ConfigError> {
    let document: Value = serde_yaml::from_str(text).map_err(|e| ConfigError::Document {
        message: e.to_string(),
    })?;

    let mapping = match document {
        Value::Null => return Ok(Vec::new()),
        Value::Mapping(mapping) => mapping,
        other => {
            return Err(ConfigError::Document {
                message: format!("expected a mapping at the top level, found {}", kind_of(&other)),
            });
        }
    };

    let mut values = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let Some(key) = scalar_text(&key) else {
            return Err(ConfigError::Document {
                message: format!("keys must be scalars, found {}", kind_of(&key)),
            });
        };
        if let Some(raw) = raw_value(&value)? {
            values.push((key, raw));
        }
    }
    Ok(values)
}

fn raw_value(value: &Value) -> Result<Option<String>, ConfigError> {
    if let Some(text) = scalar_text(value) {
        return Ok(Some(text));
    }
    match value {
        Value::Null => Ok(None),
        Value::Tagged(tagged) => raw_value(&tagged.value),
        Value::Sequence(items) if items.iter().all(|item| scalar_text(item).is_some()) => {
            let joined = items
                .iter()
                .filter_map(scalar_text)
                .collect::<Vec<_>>()
                .join(",");
            Ok(Some(joined))
        }
        nested => serde_json::to_string(nested)
            .map(Some)
            .map_err(|e| ConfigError::Document {
                message: e.to_string(),
            }),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
