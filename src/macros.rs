// Declarative helpers exported for user code.

/// Register types implementing [`CustomValue`](crate::CustomValue) as opaque leaves
///
/// ```
/// use config_bindr::{BoxError, CustomValue, custom_value};
///
/// #[derive(Default)]
/// struct Level(u8);
///
/// impl CustomValue for Level {
///     fn render(&self) -> String {
///         self.0.to_string()
///     }
///
///     fn parse_str(&mut self, raw: &str) -> Result<(), BoxError> {
///         self.0 = raw.parse()?;
///         Ok(())
///     }
///
///     fn type_tag(&self) -> &'static str {
///         "level"
///     }
/// }
///
/// custom_value!(Level);
/// ```
#[macro_export]
macro_rules! custom_value {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Bindable for $ty {
            fn bind<'a>(
                &'a mut self,
                decl: $crate::FieldDecl,
                schema: &mut $crate::Schema<'a>,
            ) -> ::std::result::Result<(), $crate::ConfigError> {
                schema.custom(decl, self)
            }
        }
    )+};
}
