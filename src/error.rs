use colored::Colorize;
use std::fmt;

/// Errors that can occur while binding configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The value handed to the walker is not a struct
    InvalidRoot { type_name: String },
    /// A field's type cannot be bound and has no custom string parsing
    UnsupportedType { field: String, type_name: String },
    /// A field tag segment could not be understood
    MalformedTag {
        field: String,
        segment: String,
        reason: String,
    },
    /// A declared default does not parse for its field; this is a schema bug
    InvalidDefault {
        field: String,
        value: String,
        kind: String,
        reason: String,
    },
    /// Two fields (or a field and the built-in help/version flags) claim the same flag
    FlagConflict { field: String, flag: String },
    /// A value from a flag, environment variable or document does not parse
    InvalidValue {
        field: String,
        value: String,
        kind: String,
        reason: String,
    },
    /// Command-line arguments were rejected
    CommandLine { message: String },
    /// A piped document could not be read or parsed
    Document { message: String },
    /// Failure reported by a pluggable loader
    Loader { loader: String, message: String },
    /// A loaded config failed its own validation
    Validation { message: String },
    /// A config could not be rendered
    Serialization { format: &'static str, message: String },
}

impl ConfigError {
    /// True for errors that indicate a defect in the declared schema itself
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            ConfigError::InvalidRoot { .. }
                | ConfigError::UnsupportedType { .. }
                | ConfigError::MalformedTag { .. }
                | ConfigError::InvalidDefault { .. }
                | ConfigError::FlagConflict { .. }
        )
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidRoot { type_name } => {
                write!(
                    f,
                    "{}: Cannot bind configuration to a non-struct root",
                    type_name.magenta().bold()
                )
            }
            ConfigError::UnsupportedType { field, type_name } => {
                write!(
                    f,
                    "{}: Unsupported type {}",
                    field.magenta().bold(),
                    type_name.red()
                )
            }
            ConfigError::MalformedTag {
                field,
                segment,
                reason,
            } => {
                write!(
                    f,
                    "{}: Malformed tag segment {} ({})",
                    field.magenta().bold(),
                    format!("'{}'", segment).red(),
                    reason
                )
            }
            ConfigError::InvalidDefault {
                field,
                value,
                kind,
                reason,
            } => {
                writeln!(
                    f,
                    "{}: Default {} is not a valid {}",
                    field.magenta().bold(),
                    format!("'{}'", value).red(),
                    kind.cyan()
                )?;
                write!(f, "\tReason: {}", reason)
            }
            ConfigError::FlagConflict { field, flag } => {
                write!(
                    f,
                    "{}: Flag {} is already taken",
                    field.magenta().bold(),
                    flag.red()
                )
            }
            ConfigError::InvalidValue {
                field,
                value,
                kind,
                reason,
            } => {
                writeln!(
                    f,
                    "{}: Invalid value {} for {}",
                    field.magenta().bold(),
                    format!("'{}'", value).red(),
                    kind.cyan()
                )?;
                write!(f, "\tReason: {}", reason)
            }
            ConfigError::CommandLine { message } => {
                write!(f, "{}: {}", "command line".magenta().bold(), message.trim_end())
            }
            ConfigError::Document { message } => {
                write!(f, "{}: {}", "document".magenta().bold(), message)
            }
            ConfigError::Loader { loader, message } => {
                write!(f, "{}: {}", loader.magenta().bold(), message)
            }
            ConfigError::Validation { message } => {
                write!(f, "{}: {}", "validation".magenta().bold(), message)
            }
            ConfigError::Serialization { format, message } => {
                write!(f, "{}: {}", format.magenta().bold(), message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Helper to format multiple configuration errors into a panic message
pub fn format_config_errors(errors: &[ConfigError]) -> String {
    let error_summary = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Configuration failed with {} error(s):\n{}",
        errors.len().to_string().yellow().bold(),
        error_summary
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_display() {
        colored::control::set_override(false);

        let error = ConfigError::InvalidValue {
            field: "Port".to_string(),
            value: "not-a-number".to_string(),
            kind: "uint16".to_string(),
            reason: "invalid digit found in string".to_string(),
        };

        let output = error.to_string();
        assert!(output.contains("Port"));
        assert!(output.contains("Invalid value 'not-a-number' for uint16"));
        assert!(output.contains("Reason: invalid digit found in string"));
    }

    #[test]
    fn test_invalid_default_display() {
        colored::control::set_override(false);

        let error = ConfigError::InvalidDefault {
            field: "Retries".to_string(),
            value: "many".to_string(),
            kind: "int8".to_string(),
            reason: "invalid digit found in string".to_string(),
        };

        let output = error.to_string();
        assert!(output.contains("Retries: Default 'many' is not a valid int8"));
    }

    #[test]
    fn test_malformed_tag_display() {
        colored::control::set_override(false);

        let error = ConfigError::MalformedTag {
            field: "Name".to_string(),
            segment: "usage".to_string(),
            reason: "expected key=value".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Name: Malformed tag segment 'usage' (expected key=value)"
        );
    }

    #[test]
    fn test_unsupported_type_display() {
        colored::control::set_override(false);

        let error = ConfigError::UnsupportedType {
            field: "Labels".to_string(),
            type_name: "HashMap<String, String>".to_string(),
        };

        assert!(error.to_string().contains("Unsupported type HashMap<String, String>"));
    }

    #[test]
    fn test_flag_conflict_display() {
        colored::control::set_override(false);

        let error = ConfigError::FlagConflict {
            field: "Host".to_string(),
            flag: "-h".to_string(),
        };

        assert_eq!(error.to_string(), "Host: Flag -h is already taken");
        assert!(error.is_schema_error());
    }

    #[test]
    fn test_schema_error_classification() {
        assert!(
            ConfigError::InvalidRoot {
                type_name: "u8".to_string()
            }
            .is_schema_error()
        );
        assert!(
            !ConfigError::CommandLine {
                message: "unexpected argument".to_string()
            }
            .is_schema_error()
        );
    }

    #[test]
    fn test_format_config_errors_multiple() {
        colored::control::set_override(false);

        let errors = vec![
            ConfigError::Validation {
                message: "name can't be empty".to_string(),
            },
            ConfigError::Document {
                message: "expected a mapping".to_string(),
            },
        ];

        let formatted = format_config_errors(&errors);
        assert!(formatted.contains("Configuration failed with 2 error(s)"));
        assert!(formatted.contains("name can't be empty"));
        assert!(formatted.contains("expected a mapping"));
    }

    #[test]
    fn test_clone() {
        let error1 = ConfigError::Loader {
            loader: "registry".to_string(),
            message: "unreachable".to_string(),
        };
        let error2 = error1.clone();

        assert_eq!(error1, error2);
    }
}
