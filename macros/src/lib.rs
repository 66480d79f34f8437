use heck::ToUpperCamelCase;
use proc_macro::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, Token, parse_macro_input};

/// Derive `config_bindr::Bindable`
///
/// Each named field is handed to the schema in declaration order. Field
/// options go in `#[config(...)]`:
///
/// - a string literal (or `tag = "..."`) holding the field tag, e.g.
///   `#[config("default=8080;usage=Server port")]`
/// - `name = "AWSInfo"` overriding the declared name, which otherwise is the
///   UpperCamelCase form of the field identifier
/// - `skip` to leave the field out
/// - `flatten` to mark a nested struct (nested structs are always flattened)
///
/// `#[bind(opaque)]` on the type binds the whole value as one leaf through
/// its `CustomValue` implementation instead of walking its fields.
#[proc_macro_derive(Bindable, attributes(config, bind))]
pub fn derive_bindable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_bindable(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn generate_bindable(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let type_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    if is_opaque(&input.attrs)? {
        return Ok(quote! {
            impl #impl_generics ::config_bindr::Bindable for #type_name #ty_generics #where_clause {
                fn bind<'__cfg>(
                    &'__cfg mut self,
                    decl: ::config_bindr::FieldDecl,
                    schema: &mut ::config_bindr::Schema<'__cfg>,
                ) -> ::std::result::Result<(), ::config_bindr::ConfigError> {
                    schema.custom(decl, self)
                }
            }
        });
    }

    // Extract fields from the struct
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Bindable only supports structs with named fields; use #[bind(opaque)] for other types",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Bindable only supports structs; use #[bind(opaque)] for types implementing CustomValue",
            ));
        }
    };

    let mut bind_fields = Vec::new();

    for field in fields {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;

        let config = parse_field_config(&field.attrs)?;
        if config.skip {
            continue;
        }

        let declared = config.name.unwrap_or_else(|| {
            field_name
                .to_string()
                .trim_start_matches("r#")
                .to_upper_camel_case()
        });
        let tag = config.tag.unwrap_or_default();

        // Extract cfg attributes for feature gating
        let cfg_attrs: Vec<&Attribute> = field
            .attrs
            .iter()
            .filter(|attr| attr.path().is_ident("cfg"))
            .collect();

        bind_fields.push(quote! {
            #(#cfg_attrs)*
            ::config_bindr::Bindable::bind(
                &mut self.#field_name,
                ::config_bindr::FieldDecl::new(#declared, #tag),
                schema,
            )?;
        });
    }

    Ok(quote! {
        impl #impl_generics ::config_bindr::Bindable for #type_name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn bind<'__cfg>(
                &'__cfg mut self,
                _decl: ::config_bindr::FieldDecl,
                schema: &mut ::config_bindr::Schema<'__cfg>,
            ) -> ::std::result::Result<(), ::config_bindr::ConfigError> {
                #(#bind_fields)*
                ::std::result::Result::Ok(())
            }
        }
    })
}

/// Check for #[bind(opaque)] on the type
fn is_opaque(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut opaque = false;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("bind")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("opaque") {
                opaque = true;
                Ok(())
            } else {
                Err(meta.error("unknown bind option, expected `opaque`"))
            }
        })?;
    }
    Ok(opaque)
}

#[derive(Debug, Default)]
struct FieldConfig {
    tag: Option<String>,
    name: Option<String>,
    skip: bool,
}

/// One item inside #[config(...)]
enum ConfigArg {
    Tag(LitStr),
    Name(LitStr),
    Skip,
    Flatten,
}

impl Parse for ConfigArg {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(LitStr) {
            return Ok(ConfigArg::Tag(input.parse()?));
        }

        let key: syn::Ident = input.parse()?;
        match key.to_string().as_str() {
            "skip" => Ok(ConfigArg::Skip),
            "flatten" => Ok(ConfigArg::Flatten),
            "tag" => {
                input.parse::<Token![=]>()?;
                Ok(ConfigArg::Tag(input.parse()?))
            }
            "name" => {
                input.parse::<Token![=]>()?;
                Ok(ConfigArg::Name(input.parse()?))
            }
            other => Err(syn::Error::new(
                key.span(),
                format!("unknown config option `{other}`, expected a tag string, `name`, `skip` or `flatten`"),
            )),
        }
    }
}

/// Parse #[config("tag")] / #[config(name = "X", skip)] attributes
fn parse_field_config(attrs: &[Attribute]) -> syn::Result<FieldConfig> {
    let mut config = FieldConfig::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("config")) {
        let args = attr.parse_args_with(Punctuated::<ConfigArg, Token![,]>::parse_terminated)?;

        for arg in args {
            match arg {
                ConfigArg::Tag(lit) => {
                    if config.tag.is_some() {
                        return Err(syn::Error::new_spanned(lit, "field tag given more than once"));
                    }
                    config.tag = Some(lit.value());
                }
                ConfigArg::Name(lit) => {
                    let value = lit.value();
                    if value.trim().is_empty() {
                        return Err(syn::Error::new_spanned(lit, "name must not be empty"));
                    }
                    config.name = Some(value);
                }
                ConfigArg::Skip => config.skip = true,
                ConfigArg::Flatten => {}
            }
        }
    }

    Ok(config)
}
