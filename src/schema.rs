//! Schema walking: turning a config value into an ordered list of leaf fields.
//!
//! Types describe themselves through [`Bindable`]. Structs deriving it hand
//! each of their fields to the schema in declaration order; nested structs do
//! the same, so their leaves land directly in the parent's namespace with no
//! prefix. Leaf types and custom values register exactly one
//! [`FieldDescriptor`].
//!
//! Two leaves with the same declared name collide. The one walked last
//! replaces the earlier descriptor and the earlier field is never written.

use crate::error::ConfigError;
use crate::field::{CustomValue, FieldDescriptor, Slot};
use crate::tag::parse_tag;
use std::collections::HashMap;

/// Name and raw tag a parent declared for one of its fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDecl {
    name: &'static str,
    tag: &'static str,
}

impl FieldDecl {
    /// Declaration used for the value a walk starts from
    pub const ROOT: FieldDecl = FieldDecl { name: "", tag: "" };

    pub const fn new(name: &'static str, tag: &'static str) -> Self {
        Self { name, tag }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn is_root(&self) -> bool {
        self.name.is_empty()
    }
}

/// A value that can describe its fields to a [`Schema`].
///
/// Usually implemented with `#[derive(Bindable)]`. Leaf implementations call
/// [`Schema::leaf`], aggregates forward `schema` to each of their fields.
pub trait Bindable {
    fn bind<'a>(&'a mut self, decl: FieldDecl, schema: &mut Schema<'a>) -> Result<(), ConfigError>;
}

/// Ordered leaf fields of one configuration value
///
/// The schema mutably borrows the config it was walked from, so it is built
/// fresh for every load and dropped before the config is used again.
#[derive(Debug, Default)]
pub struct Schema<'a> {
    fields: Vec<FieldDescriptor<'a>>,
    index: HashMap<&'static str, usize>,
}

impl<'a> Schema<'a> {
    /// Walk `config` and collect its leaves
    ///
    /// Fails with [`ConfigError::InvalidRoot`] when `config` is itself a leaf
    /// rather than a struct, and with the first schema error any field raises.
    pub fn walk<B: Bindable + ?Sized>(config: &'a mut B) -> Result<Self, ConfigError> {
        let mut schema = Schema::default();
        config.bind(FieldDecl::ROOT, &mut schema)?;
        tracing::trace!(fields = schema.len(), "walked configuration schema");
        Ok(schema)
    }

    /// Register one leaf field
    pub fn leaf(&mut self, decl: FieldDecl, storage: Slot<'a>) -> Result<(), ConfigError> {
        if decl.is_root() {
            return Err(ConfigError::InvalidRoot {
                type_name: storage.type_name(),
            });
        }

        let meta = parse_tag(decl.tag).map_err(|e| ConfigError::MalformedTag {
            field: decl.name.to_string(),
            segment: e.segment,
            reason: e.reason.to_string(),
        })?;
        let descriptor = FieldDescriptor::new(decl.name, meta, storage);

        match self.index.get(decl.name) {
            Some(&position) => {
                tracing::warn!(
                    field = decl.name,
                    "field declared more than once, the last declaration wins"
                );
                self.fields[position] = descriptor;
            }
            None => {
                self.index.insert(decl.name, self.fields.len());
                self.fields.push(descriptor);
            }
        }
        Ok(())
    }

    /// Register a value that parses itself as one opaque leaf
    pub fn custom(&mut self, decl: FieldDecl, value: &'a mut dyn CustomValue) -> Result<(), ConfigError> {
        self.leaf(decl, Slot::Custom(value))
    }

    /// Reject a field whose type has no bindable representation
    pub fn unsupported<T: ?Sized>(&self, decl: FieldDecl) -> Result<(), ConfigError> {
        let type_name = std::any::type_name::<T>().to_string();
        if decl.is_root() {
            return Err(ConfigError::InvalidRoot { type_name });
        }
        Err(ConfigError::UnsupportedType {
            field: decl.name.to_string(),
            type_name,
        })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor<'a>> {
        self.index.get(name).map(|&position| &self.fields[position])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldDescriptor<'a>> {
        self.index
            .get(name)
            .map(|&position| &mut self.fields[position])
    }

    /// Declared names in walk order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(FieldDescriptor::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor<'a>> {
        self.fields.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut FieldDescriptor<'a>> {
        self.fields.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{BoxError, FieldKind};
    use std::collections::HashMap;
    use std::time::Duration;

    // Hand-written impls mirroring what the derive generates.

    #[derive(Default)]
    struct Inner {
        host: String,
        port: u16,
    }

    impl Bindable for Inner {
        fn bind<'a>(&'a mut self, _decl: FieldDecl, schema: &mut Schema<'a>) -> Result<(), ConfigError> {
            self.host.bind(FieldDecl::new("Host", "default=localhost"), schema)?;
            self.port.bind(FieldDecl::new("Port", "default=8080"), schema)?;
            Ok(())
        }
    }

    #[derive(Default)]
    struct Outer {
        name: String,
        inner: Inner,
        timeout: Duration,
    }

    impl Bindable for Outer {
        fn bind<'a>(&'a mut self, _decl: FieldDecl, schema: &mut Schema<'a>) -> Result<(), ConfigError> {
            self.name.bind(FieldDecl::new("Name", "usage=Service name"), schema)?;
            self.inner.bind(FieldDecl::new("Inner", ""), schema)?;
            self.timeout.bind(FieldDecl::new("Timeout", "default=100ms"), schema)?;
            Ok(())
        }
    }

    #[derive(Default)]
    struct Level(u8);

    impl CustomValue for Level {
        fn render(&self) -> String {
            self.0.to_string()
        }

        fn parse_str(&mut self, raw: &str) -> Result<(), BoxError> {
            self.0 = raw.trim_start_matches('L').parse()?;
            Ok(())
        }

        fn type_tag(&self) -> &'static str {
            "level"
        }
    }

    impl Bindable for Level {
        fn bind<'a>(&'a mut self, decl: FieldDecl, schema: &mut Schema<'a>) -> Result<(), ConfigError> {
            schema.custom(decl, self)
        }
    }

    #[test]
    fn test_walk_flattens_nested_struct_in_order() {
        let mut config = Outer::default();
        let schema = Schema::walk(&mut config).unwrap();

        let names: Vec<_> = schema.names().collect();
        assert_eq!(names, vec!["Name", "Host", "Port", "Timeout"]);
        assert_eq!(schema.get("Port").unwrap().kind(), FieldKind::Uint(16));
        assert_eq!(schema.get("Timeout").unwrap().kind(), FieldKind::Duration);
    }

    #[test]
    fn test_walk_leaf_root_is_invalid() {
        let mut value = 5u8;
        assert!(matches!(
            Schema::walk(&mut value),
            Err(ConfigError::InvalidRoot { .. })
        ));
    }

    #[test]
    fn test_walk_map_root_is_invalid() {
        let mut value: HashMap<String, String> = HashMap::new();
        assert!(matches!(
            Schema::walk(&mut value),
            Err(ConfigError::InvalidRoot { .. })
        ));
    }

    #[test]
    fn test_custom_value_is_single_leaf() {
        struct WithLevel {
            level: Level,
        }
        impl Bindable for WithLevel {
            fn bind<'a>(&'a mut self, _decl: FieldDecl, schema: &mut Schema<'a>) -> Result<(), ConfigError> {
                self.level.bind(FieldDecl::new("LogLevel", "default=L3"), schema)
            }
        }

        let mut config = WithLevel {
            level: Level::default(),
        };
        let mut schema = Schema::walk(&mut config).unwrap();
        assert_eq!(schema.len(), 1);

        let field = schema.get_mut("LogLevel").unwrap();
        assert_eq!(field.kind(), FieldKind::Custom);
        assert_eq!(field.type_name(), "level");
        field.apply("L7").unwrap();
        drop(schema);
        assert_eq!(config.level.0, 7);
    }

    #[test]
    fn test_malformed_tag_surfaces_field_name() {
        struct Broken {
            name: String,
        }
        impl Bindable for Broken {
            fn bind<'a>(&'a mut self, _decl: FieldDecl, schema: &mut Schema<'a>) -> Result<(), ConfigError> {
                self.name.bind(FieldDecl::new("Name", "default"), schema)
            }
        }

        let mut config = Broken {
            name: String::new(),
        };
        match Schema::walk(&mut config) {
            Err(ConfigError::MalformedTag { field, segment, .. }) => {
                assert_eq!(field, "Name");
                assert_eq!(segment, "default");
            }
            other => panic!("expected MalformedTag, got {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_field_type() {
        struct WithMap {
            labels: HashMap<String, String>,
        }
        impl Bindable for WithMap {
            fn bind<'a>(&'a mut self, _decl: FieldDecl, schema: &mut Schema<'a>) -> Result<(), ConfigError> {
                self.labels.bind(FieldDecl::new("Labels", ""), schema)
            }
        }

        let mut config = WithMap {
            labels: HashMap::new(),
        };
        match Schema::walk(&mut config) {
            Err(ConfigError::UnsupportedType { field, type_name }) => {
                assert_eq!(field, "Labels");
                assert!(type_name.contains("HashMap"));
            }
            other => panic!("expected UnsupportedType, got {other:?}"),
        }
    }

    #[test]
    fn test_same_name_collision_last_walked_wins() {
        struct Twice {
            first: String,
            second: String,
        }
        impl Bindable for Twice {
            fn bind<'a>(&'a mut self, _decl: FieldDecl, schema: &mut Schema<'a>) -> Result<(), ConfigError> {
                self.first.bind(FieldDecl::new("Name", "usage=first"), schema)?;
                self.second.bind(FieldDecl::new("Name", "usage=second"), schema)
            }
        }

        let mut config = Twice {
            first: String::new(),
            second: String::new(),
        };
        let mut schema = Schema::walk(&mut config).unwrap();
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.get("Name").unwrap().meta().usage, "second");

        schema.get_mut("Name").unwrap().apply("x").unwrap();
        drop(schema);
        assert_eq!(config.first, "");
        assert_eq!(config.second, "x");
    }
}
