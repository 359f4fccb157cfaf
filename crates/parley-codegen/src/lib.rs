// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Attribute, Data, DataEnum, DeriveInput, Expr, ExprLit, Fields, Lit, LitStr,
    Meta,
};

/// `#[derive(Model)]`: generates `parley::Model` (shape + value mapping)
///
/// Supports:
/// - Structs with named fields (and unit structs): records
/// - Enums whose variants are all unit: string enumerations
/// - Enums with struct variants: discriminated unions
///
/// Container attributes: `#[model(name = "...")]`, `#[model(anonymous)]`,
/// `#[model(discriminator = "...")]` (default `type`),
/// `#[model(rename_all = "...")]` (enum values and union tags).
/// Field and variant attribute: `#[model(rename = "...")]`.
/// Doc comments become descriptions and `#[deprecated]` marks deprecation.
///
/// Example:
/// ```ignore
/// use parley::Model;
///
/// /// A stored note.
/// #[derive(Model)]
/// struct Note {
///     id: String,
///     tags: Vec<String>,
///     archived_at: Option<chrono::DateTime<chrono::Utc>>,
/// }
///
/// #[derive(Model)]
/// #[model(discriminator = "kind", rename_all = "snake_case")]
/// enum NoteEvent {
///     Created { note: Note },
///     Deleted { id: String },
/// }
/// ```
#[proc_macro_derive(Model, attributes(model))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Model cannot be derived for generic types",
        ));
    }
    let options = ContainerOptions::parse(&input.attrs)?;
    let info = type_info(input, &options);

    let body = match &input.data {
        Data::Struct(data) => record(&data.fields, &info, input)?,
        Data::Enum(data) if data.variants.iter().all(|v| matches!(v.fields, Fields::Unit)) => {
            enumeration(data, &info, &options)?
        }
        Data::Enum(data) => union(data, &info, &options)?,
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Model cannot be derived for untagged unions",
            ))
        }
    };

    let ident = &input.ident;
    Ok(quote! {
        #[allow(deprecated, unused_mut, clippy::all)]
        impl ::parley::Model for #ident {
            #body
        }
    })
}

/// Options from `#[model(...)]` on the type.
#[derive(Default)]
struct ContainerOptions {
    name: Option<String>,
    anonymous: bool,
    discriminator: Option<String>,
    rename_all: Option<RenameRule>,
}

impl ContainerOptions {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut options = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("model")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    options.name = Some(meta.value()?.parse::<LitStr>()?.value());
                } else if meta.path.is_ident("anonymous") {
                    options.anonymous = true;
                } else if meta.path.is_ident("discriminator") {
                    options.discriminator = Some(meta.value()?.parse::<LitStr>()?.value());
                } else if meta.path.is_ident("rename_all") {
                    let lit = meta.value()?.parse::<LitStr>()?;
                    let rule = RenameRule::parse(&lit.value())
                        .ok_or_else(|| syn::Error::new_spanned(&lit, "unknown rename_all rule"))?;
                    options.rename_all = Some(rule);
                } else {
                    return Err(meta.error("unsupported model attribute"));
                }
                Ok(())
            })?;
        }
        if options.anonymous && options.name.is_some() {
            return Err(syn::Error::new(
                proc_macro2::Span::call_site(),
                "`anonymous` and `name` are mutually exclusive",
            ));
        }
        Ok(options)
    }
}

/// `#[model(rename = "...")]` on a field or variant.
fn rename(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut renamed = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("model")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                renamed = Some(meta.value()?.parse::<LitStr>()?.value());
                Ok(())
            } else {
                Err(meta.error("unsupported model attribute"))
            }
        })?;
    }
    Ok(renamed)
}

/// Doc comment lines joined with newlines.
fn doc(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|a| a.path().is_ident("doc"))
        .filter_map(|a| match &a.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) => Some(s.value().trim().to_string()),
                _ => None,
            },
            _ => None,
        })
        .collect();
    let text = lines.join("\n").trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn deprecated(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|a| a.path().is_ident("deprecated"))
}

fn type_info(input: &DeriveInput, options: &ContainerOptions) -> TokenStream2 {
    let mut info = quote! { ::parley::introspect::TypeInfo::of::<Self>() };
    if !options.anonymous {
        let name = options
            .name
            .clone()
            .unwrap_or_else(|| input.ident.to_string());
        info = quote! { #info.named(#name) };
    }
    if let Some(description) = doc(&input.attrs) {
        info = quote! { #info.described(#description) };
    }
    if deprecated(&input.attrs) {
        info = quote! { #info.deprecated(true) };
    }
    info
}

struct FieldInfo {
    ident: syn::Ident,
    wire: String,
    ty: syn::Type,
    description: Option<String>,
    deprecated: bool,
}

fn named_fields(fields: &Fields, span: &dyn quote::ToTokens) -> syn::Result<Vec<FieldInfo>> {
    match fields {
        Fields::Unit => Ok(Vec::new()),
        Fields::Unnamed(_) => Err(syn::Error::new_spanned(
            span,
            "Only named fields are supported",
        )),
        Fields::Named(named) => named
            .named
            .iter()
            .map(|field| {
                let Some(ident) = field.ident.clone() else {
                    return Err(syn::Error::new_spanned(field, "Field must have a name"));
                };
                let wire = rename(&field.attrs)?
                    .unwrap_or_else(|| ident.to_string().trim_start_matches("r#").to_string());
                Ok(FieldInfo {
                    ident,
                    wire,
                    ty: field.ty.clone(),
                    description: doc(&field.attrs),
                    deprecated: deprecated(&field.attrs),
                })
            })
            .collect(),
    }
}

fn field_shapes(fields: &[FieldInfo]) -> Vec<TokenStream2> {
    fields
        .iter()
        .map(|f| {
            let wire = &f.wire;
            let ty = &f.ty;
            let mut shape = quote! {
                ::parley::introspect::FieldShape::new(#wire, <#ty as ::parley::Model>::shape())
            };
            if let Some(description) = &f.description {
                shape = quote! { #shape.described(#description) };
            }
            if f.deprecated {
                shape = quote! { #shape.deprecated(true) };
            }
            shape
        })
        .collect()
}

/// `Object` literal built from bindings named like the fields.
fn object_from_bindings(fields: &[FieldInfo]) -> TokenStream2 {
    let inserts = fields.iter().map(|f| {
        let ident = &f.ident;
        let wire = &f.wire;
        quote! { .with(#wire, ::parley::Model::to_value(#ident)) }
    });
    quote! { ::parley::Object::new() #(#inserts)* }
}

/// Field initializers taking values out of `object`.
fn take_fields(fields: &[FieldInfo]) -> Vec<TokenStream2> {
    fields
        .iter()
        .map(|f| {
            let ident = &f.ident;
            let wire = &f.wire;
            let ty = &f.ty;
            quote! {
                #ident: <#ty as ::parley::Model>::from_value(object.take(#wire))
                    .map_err(|e| e.at(#wire))?
            }
        })
        .collect()
}

fn record(fields: &Fields, info: &TokenStream2, input: &DeriveInput) -> syn::Result<TokenStream2> {
    let fields = named_fields(fields, input)?;
    let shapes = field_shapes(&fields);
    let idents: Vec<_> = fields.iter().map(|f| &f.ident).collect();
    let object = object_from_bindings(&fields);
    let takes = take_fields(&fields);

    Ok(quote! {
        fn shape() -> ::parley::introspect::Shape {
            ::parley::introspect::Shape::Record(::parley::introspect::RecordShape {
                info: #info,
                fields: || ::std::vec![#(#shapes),*],
            })
        }

        fn to_value(&self) -> ::parley::Value {
            let Self { #(#idents),* } = self;
            ::parley::Value::Object(#object)
        }

        fn from_value(value: ::parley::Value) -> ::std::result::Result<Self, ::parley::codec::CodecError> {
            let mut object = value.into_object()?;
            ::std::result::Result::Ok(Self { #(#takes),* })
        }
    })
}

fn tag_of(variant: &syn::Variant, options: &ContainerOptions) -> syn::Result<String> {
    if let Some(renamed) = rename(&variant.attrs)? {
        return Ok(renamed);
    }
    let ident = variant.ident.to_string();
    Ok(match options.rename_all {
        Some(rule) => rule.apply(&ident),
        None => ident,
    })
}

fn enumeration(
    data: &DataEnum,
    info: &TokenStream2,
    options: &ContainerOptions,
) -> syn::Result<TokenStream2> {
    let mut values = Vec::new();
    let mut to_arms = Vec::new();
    let mut from_arms = Vec::new();
    for variant in &data.variants {
        let ident = &variant.ident;
        let tag = tag_of(variant, options)?;
        to_arms.push(quote! { Self::#ident => #tag });
        from_arms.push(quote! { #tag => ::std::result::Result::Ok(Self::#ident) });
        values.push(tag);
    }

    Ok(quote! {
        fn shape() -> ::parley::introspect::Shape {
            ::parley::introspect::Shape::Enum(::parley::introspect::EnumShape {
                info: #info,
                values: ::std::vec![#(#values),*],
            })
        }

        fn to_value(&self) -> ::parley::Value {
            let tag: &str = match self { #(#to_arms),* };
            ::parley::Value::String(tag.to_string())
        }

        fn from_value(value: ::parley::Value) -> ::std::result::Result<Self, ::parley::codec::CodecError> {
            match value {
                ::parley::Value::String(s) => match s.as_str() {
                    #(#from_arms,)*
                    other => ::std::result::Result::Err(::parley::codec::CodecError::UnknownEnumValue {
                        path: "/".to_string(),
                        value: other.to_string(),
                    }),
                },
                other => ::std::result::Result::Err(other.mismatch("string")),
            }
        }
    })
}

fn union(
    data: &DataEnum,
    info: &TokenStream2,
    options: &ContainerOptions,
) -> syn::Result<TokenStream2> {
    let discriminator = options
        .discriminator
        .clone()
        .unwrap_or_else(|| "type".to_string());

    let mut variant_shapes = Vec::new();
    let mut to_arms = Vec::new();
    let mut from_arms = Vec::new();
    for variant in &data.variants {
        let ident = &variant.ident;
        let tag = tag_of(variant, options)?;
        let fields = named_fields(&variant.fields, variant)?;
        if fields.iter().any(|f| f.wire == discriminator) {
            return Err(syn::Error::new_spanned(
                variant,
                format!("field collides with discriminator {discriminator:?}"),
            ));
        }

        let shapes = field_shapes(&fields);
        let description = match doc(&variant.attrs) {
            Some(d) => quote! { ::std::option::Option::Some(#d) },
            None => quote! { ::std::option::Option::None },
        };
        variant_shapes.push(quote! {
            ::parley::introspect::VariantShape {
                tag: #tag,
                description: #description,
                fields: ::std::vec![#(#shapes),*],
            }
        });

        let idents: Vec<_> = fields.iter().map(|f| &f.ident).collect();
        let object = object_from_bindings(&fields);
        let pattern = match &variant.fields {
            Fields::Unit => quote! { Self::#ident },
            _ => quote! { Self::#ident { #(#idents),* } },
        };
        to_arms.push(quote! {
            #pattern => ::parley::Value::Union { tag: #tag.to_string(), fields: #object }
        });

        let takes = take_fields(&fields);
        let build = match &variant.fields {
            Fields::Unit => quote! { Self::#ident },
            _ => quote! { Self::#ident { #(#takes),* } },
        };
        from_arms.push(quote! { #tag => ::std::result::Result::Ok(#build) });
    }

    Ok(quote! {
        fn shape() -> ::parley::introspect::Shape {
            ::parley::introspect::Shape::Union(::parley::introspect::UnionShape {
                info: #info,
                discriminator: #discriminator,
                variants: || ::std::vec![#(#variant_shapes),*],
            })
        }

        fn to_value(&self) -> ::parley::Value {
            match self { #(#to_arms),* }
        }

        fn from_value(value: ::parley::Value) -> ::std::result::Result<Self, ::parley::codec::CodecError> {
            let (tag, mut object) = value.into_union()?;
            match tag.as_str() {
                #(#from_arms,)*
                other => ::std::result::Result::Err(::parley::codec::CodecError::UnknownTag {
                    path: "/".to_string(),
                    tag: other.to_string(),
                }),
            }
        }
    })
}

/// Casing rules for enum values and union tags.
#[derive(Clone, Copy)]
enum RenameRule {
    Lower,
    Upper,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
}

impl RenameRule {
    fn parse(rule: &str) -> Option<Self> {
        match rule {
            "lowercase" => Some(Self::Lower),
            "UPPERCASE" => Some(Self::Upper),
            "camelCase" => Some(Self::Camel),
            "snake_case" => Some(Self::Snake),
            "SCREAMING_SNAKE_CASE" => Some(Self::ScreamingSnake),
            "kebab-case" => Some(Self::Kebab),
            _ => None,
        }
    }

    /// Apply to a PascalCase variant name.
    fn apply(self, ident: &str) -> String {
        let words = pascal_words(ident);
        match self {
            Self::Lower => ident.to_lowercase(),
            Self::Upper => ident.to_uppercase(),
            Self::Camel => {
                let mut out = String::new();
                for (i, word) in words.iter().enumerate() {
                    if i == 0 {
                        out.push_str(&word.to_lowercase());
                    } else {
                        out.push_str(word);
                    }
                }
                out
            }
            Self::Snake => words.join("_").to_lowercase(),
            Self::ScreamingSnake => words.join("_").to_uppercase(),
            Self::Kebab => words.join("-").to_lowercase(),
        }
    }
}

fn pascal_words(ident: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    for c in ident.chars() {
        if c.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
