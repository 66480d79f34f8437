//! Command-line flag registry built on a dynamically assembled `clap::Command`.

use crate::error::ConfigError;
use crate::field::{FieldDescriptor, FieldKind};
use clap::error::ErrorKind;
use clap::{Arg, ArgAction, Command, value_parser};
use std::collections::HashSet;
use std::ffi::OsString;

/// Result of parsing command-line arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagOutcome {
    /// Explicitly passed flags as `(store key, raw value)` pairs
    Values(Vec<(String, String)>),
    /// `--help` or `--version` was requested; the rendered text to print
    Exit(String),
}

/// Flags registered for one load call
#[derive(Debug)]
pub struct FlagRegistry {
    command: Command,
    flags: Vec<(String, String)>,
    // Lowercased long names and short aliases already in use
    taken_long: HashSet<String>,
    taken_short: HashSet<char>,
}

impl FlagRegistry {
    pub fn new(app_name: &str, about: &str, version: Option<&str>) -> Self {
        let mut command = Command::new(app_name.to_string())
            .about(about.to_string())
            .args_override_self(true);
        let mut taken_long = HashSet::from(["help".to_string()]);
        let mut taken_short = HashSet::from(['h']);
        if let Some(version) = version {
            command = command.version(version.to_string());
            taken_long.insert("version".to_string());
            taken_short.insert('V');
        }
        Self {
            command,
            flags: Vec::new(),
            taken_long,
            taken_short,
        }
    }

    /// Add a flag accepting values of the field's kind
    ///
    /// Fails with [`ConfigError::FlagConflict`] when the long name (compared
    /// case-insensitively) or the short alias is already in use, including
    /// by the built-in `--help` and `--version` flags.
    pub fn register(&mut self, field: &FieldDescriptor<'_>) -> Result<(), ConfigError> {
        let name = field.flag_name();
        let key = field.key();
        if self.taken_long.contains(&key) {
            return Err(ConfigError::FlagConflict {
                field: field.name().to_string(),
                flag: format!("--{name}"),
            });
        }
        if let Some(short) = field.meta().short.filter(|c| self.taken_short.contains(c)) {
            return Err(ConfigError::FlagConflict {
                field: field.name().to_string(),
                flag: format!("-{short}"),
            });
        }
        let mut arg = Arg::new(name.clone())
            .long(name.clone())
            .help(field.usage().to_string())
            .value_name(field.type_name())
            .action(ArgAction::Set);

        if let Some(short) = field.meta().short {
            arg = arg.short(short);
        }

        if matches!(field.kind(), FieldKind::Int(_) | FieldKind::Float(_)) {
            arg = arg.allow_negative_numbers(true);
        }

        arg = match field.kind() {
            FieldKind::Bool => arg
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
                .value_parser(value_parser!(bool)),
            FieldKind::Int(8) => arg.value_parser(value_parser!(i8)),
            FieldKind::Int(16) => arg.value_parser(value_parser!(i16)),
            FieldKind::Int(32) => arg.value_parser(value_parser!(i32)),
            FieldKind::Int(_) => arg.value_parser(value_parser!(i64)),
            FieldKind::Uint(8) => arg.value_parser(value_parser!(u8)),
            FieldKind::Uint(16) => arg.value_parser(value_parser!(u16)),
            FieldKind::Uint(32) => arg.value_parser(value_parser!(u32)),
            FieldKind::Uint(_) => arg.value_parser(value_parser!(u64)),
            FieldKind::Float(32) => arg.value_parser(value_parser!(f32)),
            FieldKind::Float(_) => arg.value_parser(value_parser!(f64)),
            FieldKind::String
            | FieldKind::StringList
            | FieldKind::Duration
            | FieldKind::Custom => arg,
        };

        self.command = std::mem::take(&mut self.command).arg(arg);
        self.taken_long.insert(key.clone());
        if let Some(short) = field.meta().short {
            self.taken_short.insert(short);
        }
        self.flags.push((name, key));
        Ok(())
    }

    /// Rendered help text, as `--help` would print it
    pub fn render_help(&mut self) -> String {
        self.command.render_help().to_string()
    }

    /// Parse `args`; the first item is the program name
    pub fn parse<I, T>(self, args: I) -> Result<FlagOutcome, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = match self.command.try_get_matches_from(args) {
            Ok(matches) => matches,
            Err(err) => {
                return match err.kind() {
                    ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                        Ok(FlagOutcome::Exit(err.render().to_string()))
                    }
                    _ => Err(ConfigError::CommandLine {
                        message: err.render().to_string(),
                    }),
                };
            }
        };

        let values = self
            .flags
            .into_iter()
            .filter_map(|(name, key)| {
                let raw = matches.get_raw(&name)?.last()?;
                Some((key, raw.to_string_lossy().into_owned()))
            })
            .collect();
        Ok(FlagOutcome::Values(values))
    }
}
