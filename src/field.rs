use crate::duration::{format_duration, parse_duration};
use crate::error::ConfigError;
use crate::naming::{to_env_name, to_flag_name};
use crate::schema::{Bindable, FieldDecl, Schema};
use crate::tag::FieldMeta;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::{fmt, str::FromStr, time::Duration};

/// Error type returned by [`CustomValue::parse_str`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A field type that renders and parses itself from a single string.
///
/// Implementing this trait (and registering the type with
/// [`custom_value!`](crate::custom_value) or `#[bind(opaque)]`) makes the type
/// one opaque leaf, even when it is a struct with fields of its own.
pub trait CustomValue {
    /// Current value in the same form `parse_str` accepts
    fn render(&self) -> String;

    /// Replace the current value with one parsed from `raw`
    fn parse_str(&mut self, raw: &str) -> Result<(), BoxError>;

    /// Short name of the type shown in help and error output
    fn type_tag(&self) -> &'static str;
}

/// The closed set of value kinds the binder knows how to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    /// Signed integer of the given bit width
    Int(u32),
    /// Unsigned integer of the given bit width
    Uint(u32),
    /// Float of the given bit width
    Float(u32),
    Bool,
    StringList,
    Duration,
    Custom,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::String => write!(f, "string"),
            FieldKind::Int(bits) => write!(f, "int{bits}"),
            FieldKind::Uint(bits) => write!(f, "uint{bits}"),
            FieldKind::Float(bits) => write!(f, "float{bits}"),
            FieldKind::Bool => write!(f, "bool"),
            FieldKind::StringList => write!(f, "stringList"),
            FieldKind::Duration => write!(f, "duration"),
            FieldKind::Custom => write!(f, "custom"),
        }
    }
}

/// Borrowed storage of one leaf field inside the config being loaded
pub enum Slot<'a> {
    Str(&'a mut String),
    I8(&'a mut i8),
    I16(&'a mut i16),
    I32(&'a mut i32),
    I64(&'a mut i64),
    Isize(&'a mut isize),
    U8(&'a mut u8),
    U16(&'a mut u16),
    U32(&'a mut u32),
    U64(&'a mut u64),
    Usize(&'a mut usize),
    F32(&'a mut f32),
    F64(&'a mut f64),
    Bool(&'a mut bool),
    StringList(&'a mut Vec<String>),
    Duration(&'a mut Duration),
    Custom(&'a mut dyn CustomValue),
}

impl Slot<'_> {
    pub fn kind(&self) -> FieldKind {
        match self {
            Slot::Str(_) => FieldKind::String,
            Slot::I8(_) => FieldKind::Int(8),
            Slot::I16(_) => FieldKind::Int(16),
            Slot::I32(_) => FieldKind::Int(32),
            Slot::I64(_) => FieldKind::Int(64),
            Slot::Isize(_) => FieldKind::Int(isize::BITS),
            Slot::U8(_) => FieldKind::Uint(8),
            Slot::U16(_) => FieldKind::Uint(16),
            Slot::U32(_) => FieldKind::Uint(32),
            Slot::U64(_) => FieldKind::Uint(64),
            Slot::Usize(_) => FieldKind::Uint(usize::BITS),
            Slot::F32(_) => FieldKind::Float(32),
            Slot::F64(_) => FieldKind::Float(64),
            Slot::Bool(_) => FieldKind::Bool,
            Slot::StringList(_) => FieldKind::StringList,
            Slot::Duration(_) => FieldKind::Duration,
            Slot::Custom(_) => FieldKind::Custom,
        }
    }

    /// Kind name, or the type tag for custom values
    pub fn type_name(&self) -> String {
        match self {
            Slot::Custom(value) => value.type_tag().to_string(),
            other => other.kind().to_string(),
        }
    }

    /// Parse `raw` for this slot's kind and overwrite the stored value
    pub fn set(&mut self, raw: &str) -> Result<(), String> {
        match self {
            Slot::Str(v) => **v = raw.to_string(),
            Slot::I8(v) => **v = parse_scalar(raw)?,
            Slot::I16(v) => **v = parse_scalar(raw)?,
            Slot::I32(v) => **v = parse_scalar(raw)?,
            Slot::I64(v) => **v = parse_scalar(raw)?,
            Slot::Isize(v) => **v = parse_scalar(raw)?,
            Slot::U8(v) => **v = parse_scalar(raw)?,
            Slot::U16(v) => **v = parse_scalar(raw)?,
            Slot::U32(v) => **v = parse_scalar(raw)?,
            Slot::U64(v) => **v = parse_scalar(raw)?,
            Slot::Usize(v) => **v = parse_scalar(raw)?,
            Slot::F32(v) => **v = parse_scalar(raw)?,
            Slot::F64(v) => **v = parse_scalar(raw)?,
            Slot::Bool(v) => **v = parse_scalar(raw)?,
            Slot::StringList(v) => {
                if let Some(list) = split_list(raw) {
                    **v = list;
                }
            }
            Slot::Duration(v) => **v = parse_duration(raw)?,
            Slot::Custom(v) => v.parse_str(raw).map_err(|e| e.to_string())?,
        }
        Ok(())
    }

    /// Current value in the textual form `set` accepts
    pub fn render(&self) -> String {
        match self {
            Slot::Str(v) => (**v).clone(),
            Slot::I8(v) => v.to_string(),
            Slot::I16(v) => v.to_string(),
            Slot::I32(v) => v.to_string(),
            Slot::I64(v) => v.to_string(),
            Slot::Isize(v) => v.to_string(),
            Slot::U8(v) => v.to_string(),
            Slot::U16(v) => v.to_string(),
            Slot::U32(v) => v.to_string(),
            Slot::U64(v) => v.to_string(),
            Slot::Usize(v) => v.to_string(),
            Slot::F32(v) => v.to_string(),
            Slot::F64(v) => v.to_string(),
            Slot::Bool(v) => v.to_string(),
            Slot::StringList(v) => v.join(","),
            Slot::Duration(v) => format_duration(**v),
            Slot::Custom(v) => v.render(),
        }
    }
}

impl fmt::Debug for Slot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.type_name(), self.render())
    }
}

fn parse_scalar<T>(raw: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.parse().map_err(|e: T::Err| e.to_string())
}

/// Split a comma separated list, trimming one pair of surrounding quotes and
/// whitespace around each element. An empty input yields `None`.
pub fn split_list(raw: &str) -> Option<Vec<String>> {
    if raw.is_empty() {
        return None;
    }
    let unquoted = raw.strip_prefix('"').unwrap_or(raw);
    let unquoted = unquoted.strip_suffix('"').unwrap_or(unquoted);
    Some(
        unquoted
            .split(',')
            .map(|item| item.trim().to_string())
            .collect(),
    )
}

/// One bindable leaf of a configuration: where it lives and how it is declared
#[derive(Debug)]
pub struct FieldDescriptor<'a> {
    name: &'static str,
    meta: FieldMeta,
    usage: String,
    storage: Slot<'a>,
}

impl<'a> FieldDescriptor<'a> {
    pub(crate) fn new(name: &'static str, meta: FieldMeta, storage: Slot<'a>) -> Self {
        let usage = format!(
            "{} [default: {}]",
            meta.usage,
            meta.default.as_deref().unwrap_or_default()
        );
        Self {
            name,
            meta,
            usage,
            storage,
        }
    }

    /// Declared field name
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn meta(&self) -> &FieldMeta {
        &self.meta
    }

    /// Help text with the default value appended
    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn kind(&self) -> FieldKind {
        self.storage.kind()
    }

    pub fn type_name(&self) -> String {
        self.storage.type_name()
    }

    pub fn flag_name(&self) -> String {
        to_flag_name(self.name)
    }

    /// Case-insensitive key used in the value store and documents
    pub fn key(&self) -> String {
        self.flag_name().to_lowercase()
    }

    /// The tag's `env` override, otherwise the name derived from the field
    pub fn env_name(&self) -> String {
        match &self.meta.env {
            Some(env) => env.to_uppercase(),
            None => to_env_name(self.name),
        }
    }

    /// Current value of the field
    pub fn render(&self) -> String {
        self.storage.render()
    }

    /// Write a user supplied value into the field
    pub fn apply(&mut self, raw: &str) -> Result<(), ConfigError> {
        self.storage
            .set(raw)
            .map_err(|reason| ConfigError::InvalidValue {
                field: self.name.to_string(),
                value: raw.to_string(),
                kind: self.storage.type_name(),
                reason,
            })
    }

    /// Write the declared default into the field, if there is one
    pub fn apply_default(&mut self) -> Result<Option<&str>, ConfigError> {
        let Some(default) = self.meta.default.as_deref() else {
            return Ok(None);
        };
        self.storage
            .set(default)
            .map_err(|reason| ConfigError::InvalidDefault {
                field: self.name.to_string(),
                value: default.to_string(),
                kind: self.storage.type_name(),
                reason,
            })?;
        Ok(Some(default))
    }
}

macro_rules! leaf {
    ($($ty:ty => $variant:ident),+ $(,)?) => {$(
        impl Bindable for $ty {
            fn bind<'a>(&'a mut self, decl: FieldDecl, schema: &mut Schema<'a>) -> Result<(), ConfigError> {
                schema.leaf(decl, Slot::$variant(self))
            }
        }
    )+};
}

leaf! {
    String => Str,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    bool => Bool,
    Vec<String> => StringList,
    Duration => Duration,
}

// Containers that have no single-string form; binding one is a schema error.

impl<K, V, S> Bindable for HashMap<K, V, S> {
    fn bind<'a>(&'a mut self, decl: FieldDecl, schema: &mut Schema<'a>) -> Result<(), ConfigError> {
        schema.unsupported::<Self>(decl)
    }
}

impl<K, V> Bindable for BTreeMap<K, V> {
    fn bind<'a>(&'a mut self, decl: FieldDecl, schema: &mut Schema<'a>) -> Result<(), ConfigError> {
        schema.unsupported::<Self>(decl)
    }
}

impl<T, S> Bindable for HashSet<T, S> {
    fn bind<'a>(&'a mut self, decl: FieldDecl, schema: &mut Schema<'a>) -> Result<(), ConfigError> {
        schema.unsupported::<Self>(decl)
    }
}

impl<T> Bindable for BTreeSet<T> {
    fn bind<'a>(&'a mut self, decl: FieldDecl, schema: &mut Schema<'a>) -> Result<(), ConfigError> {
        schema.unsupported::<Self>(decl)
    }
}

impl<T> Bindable for Option<T> {
    fn bind<'a>(&'a mut self, decl: FieldDecl, schema: &mut Schema<'a>) -> Result<(), ConfigError> {
        schema.unsupported::<Self>(decl)
    }
}
