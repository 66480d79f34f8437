//! Bind a declared configuration struct to defaults, environment variables,
//! command-line flags and piped documents.
//!
//! Fields carry a tag describing their default, help text and overrides:
//!
//! ```text
//! #[config("env=TIMEOUT;default=100ms;usage=Timeout for service;short=t")]
//! timeout: Duration,
//! ```
//!
//! Within the command-line resolution a flag beats an environment variable,
//! which beats a piped document value, which beats the declared default.
//! Loaders then run in the order given to the [`Manager`]; the last one to
//! write a field wins.

extern crate self as config_bindr;

pub mod duration;
pub mod environment;
pub mod error;
pub mod field;
pub mod flags;
pub mod loader;
pub mod macros;
pub mod manager;
pub mod naming;
pub mod schema;
pub mod store;
pub mod tag;
pub mod types;

// Re-export main types
pub use environment::{EnvSource, ProcessEnv};
pub use error::{ConfigError, format_config_errors};
pub use field::{BoxError, CustomValue, FieldDescriptor, FieldKind, Slot};
pub use loader::{CommandLineLoader, DocumentLoader, Loader};
pub use manager::Manager;
pub use schema::{Bindable, FieldDecl, Schema};
pub use store::ValueStore;
pub use tag::{FieldMeta, parse_tag};
pub use types::MapObject;

// Re-export derive
pub use config_bindr_macros::Bindable;

/// Contract every top-level configuration type implements
pub trait Config: Bindable + serde::Serialize {
    /// Check cross-field rules, including fields tagged `required`
    fn validate(&self) -> Result<(), ConfigError>;

    /// Pretty printed JSON of the current values
    fn dump_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialization {
            format: "json",
            message: e.to_string(),
        })
    }

    /// YAML of the current values
    fn dump_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Serialization {
            format: "yaml",
            message: e.to_string(),
        })
    }
}
