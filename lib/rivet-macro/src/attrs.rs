//! Attribute parsing for the `#[service]` macro.

use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::ParseStream;
use syn::{Attribute, Expr, Ident, LitStr, Meta, Token};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    /// The attribute name of each verb.
    const ATTRIBUTES: [(&'static str, Self); 7] = [
        ("get", Self::Get),
        ("post", Self::Post),
        ("put", Self::Put),
        ("delete", Self::Delete),
        ("patch", Self::Patch),
        ("head", Self::Head),
        ("options", Self::Options),
    ];

    /// The `rivet::Method` variant name.
    #[must_use]
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "Get",
            Self::Post => "Post",
            Self::Put => "Put",
            Self::Delete => "Delete",
            Self::Patch => "Patch",
            Self::Head => "Head",
            Self::Options => "Options",
        }
    }

    /// Parse an HTTP method from a string (case-insensitive).
    /// Returns `None` for unsupported methods.
    #[must_use]
    pub(crate) fn parse(s: &str) -> Option<Self> {
        Self::ATTRIBUTES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|(_, method)| *method)
    }

    fn from_attribute(attr: &Attribute) -> Option<Self> {
        Self::ATTRIBUTES
            .iter()
            .find(|(name, _)| attr.path().is_ident(name))
            .map(|(_, method)| *method)
    }
}

/// Arguments of `#[service(...)]`.
#[derive(Debug, Default)]
pub(crate) struct ServiceArgs {
    /// Service name, defaults to the trait name.
    pub(crate) name: Option<String>,
}

impl ServiceArgs {
    pub(crate) fn parse(attr: TokenStream) -> syn::Result<Self> {
        let mut args = Self::default();
        let parser = syn::meta::parser(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                args.name = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported service attribute, expected `name = \"...\"`"))
            }
        });
        syn::parse::Parser::parse2(parser, attr)?;
        Ok(args)
    }
}

/// A method-level annotation.
#[derive(Debug, Clone)]
pub(crate) enum MethodAnnotation {
    /// `#[get("/path")]`, ..., or `#[http("GET /path")]`.
    Http(HttpMethod, String),
    /// `#[headers("Name: value", ...)]`.
    Headers(Vec<String>),
    /// `#[asynchronous]`.
    Asynchronous,
    /// `#[annotation(expr)]`.
    Custom(Expr),
}

impl MethodAnnotation {
    /// Parse a method attribute; `None` for attributes rivet does not own.
    pub(crate) fn parse(attr: &Attribute) -> syn::Result<Option<Self>> {
        if let Some(method) = HttpMethod::from_attribute(attr) {
            let path: LitStr = attr.parse_args()?;
            return Ok(Some(Self::Http(method, path.value())));
        }

        let path = attr.path();
        if path.is_ident("http") {
            let route: LitStr = attr.parse_args()?;
            let value = route.value();
            let (verb, path) = value.split_once(' ').ok_or_else(|| {
                syn::Error::new_spanned(
                    &route,
                    "expected format: \"METHOD /path\" (e.g., \"GET /users/{id}\")",
                )
            })?;
            let method = HttpMethod::parse(verb).ok_or_else(|| {
                syn::Error::new_spanned(
                    &route,
                    format!(
                        "unsupported HTTP method: {verb}. Supported: GET, POST, PUT, DELETE, PATCH, HEAD, OPTIONS"
                    ),
                )
            })?;
            return Ok(Some(Self::Http(method, path.trim().to_string())));
        }
        if path.is_ident("headers") {
            return parse_header_lines(attr).map(|lines| Some(Self::Headers(lines)));
        }
        if path.is_ident("asynchronous") {
            attr.meta.require_path_only()?;
            return Ok(Some(Self::Asynchronous));
        }
        if path.is_ident("annotation") {
            return attr.parse_args().map(|expr| Some(Self::Custom(expr)));
        }
        Ok(None)
    }

    /// The `.annotate(...)` argument for this annotation.
    pub(crate) fn to_tokens(&self) -> TokenStream {
        match self {
            Self::Http(method, path) => {
                let variant = Ident::new(method.as_str(), proc_macro2::Span::call_site());
                quote! { ::rivet::annotation::Http::new(::rivet::Method::#variant, #path) }
            }
            Self::Headers(lines) => quote! { ::rivet::annotation::Headers::new([#(#lines),*]) },
            Self::Asynchronous => quote! { ::rivet::annotation::Async },
            Self::Custom(expr) => quote! { #expr },
        }
    }
}

/// `#[headers("A: b", "C: d")]`, on a trait or a method.
pub(crate) fn parse_header_lines(attr: &Attribute) -> syn::Result<Vec<String>> {
    let lines = attr.parse_args_with(
        syn::punctuated::Punctuated::<LitStr, Token![,]>::parse_terminated,
    )?;
    Ok(lines.iter().map(LitStr::value).collect())
}

/// A parameter-level annotation.
#[derive(Debug, Clone)]
pub(crate) enum ParamAnnotation {
    Path { name: String, encoded: bool },
    Url,
    Query { name: String, encoded: bool },
    QueryMap { encoded: bool },
    QueryName { encoded: bool },
    Header { name: String },
    HeaderMap,
    Field { name: String, encoded: bool },
    FieldMap { encoded: bool },
    Part { name: String },
    PartMap,
    Body,
    Custom(Expr),
}

/// Parameter attribute names owned by rivet, stripped from generated code.
pub(crate) const PARAM_ATTRS: &[&str] = &[
    "path",
    "url",
    "query",
    "query_map",
    "query_name",
    "header",
    "header_map",
    "field",
    "field_map",
    "part",
    "part_map",
    "body",
    "annotation",
];

/// Options of a parameter attribute: `("name")`, `(name = "name")`, `(encoded)`.
#[derive(Debug, Default, PartialEq, Eq)]
struct ParamOptions {
    name: Option<String>,
    encoded: bool,
}

impl ParamOptions {
    fn parse(attr: &Attribute, allow_name: bool, allow_encoded: bool) -> syn::Result<Self> {
        let mut options = Self::default();
        let list = match &attr.meta {
            Meta::Path(_) => return Ok(options),
            Meta::List(list) => list,
            Meta::NameValue(_) => {
                return Err(syn::Error::new_spanned(attr, "expected `#[attr]` or `#[attr(...)]`"));
            }
        };

        list.parse_args_with(|input: ParseStream| {
            while !input.is_empty() {
                if input.peek(LitStr) && allow_name {
                    let name: LitStr = input.parse()?;
                    options.name = Some(name.value());
                } else {
                    let ident: Ident = input.parse()?;
                    if ident == "encoded" && allow_encoded {
                        options.encoded = true;
                    } else if ident == "name" && allow_name {
                        input.parse::<Token![=]>()?;
                        let name: LitStr = input.parse()?;
                        options.name = Some(name.value());
                    } else {
                        return Err(syn::Error::new_spanned(ident, "unsupported option"));
                    }
                }
                if input.is_empty() {
                    break;
                }
                input.parse::<Token![,]>()?;
            }
            Ok(())
        })?;

        Ok(options)
    }
}

impl ParamAnnotation {
    /// Parse a parameter attribute; `None` for attributes rivet does not own.
    ///
    /// Names default to the parameter name, with `_` turned into `-` for
    /// headers.
    pub(crate) fn parse(attr: &Attribute, param: &Ident) -> syn::Result<Option<Self>> {
        let path = attr.path();
        let Some(kind) = path.get_ident().map(ToString::to_string) else {
            return Ok(None);
        };
        let default_name = || param.to_string();

        let annotation = match kind.as_str() {
            "path" => {
                let options = ParamOptions::parse(attr, true, true)?;
                Self::Path {
                    name: options.name.unwrap_or_else(default_name),
                    encoded: options.encoded,
                }
            }
            "url" => {
                attr.meta.require_path_only()?;
                Self::Url
            }
            "query" => {
                let options = ParamOptions::parse(attr, true, true)?;
                Self::Query {
                    name: options.name.unwrap_or_else(default_name),
                    encoded: options.encoded,
                }
            }
            "query_map" => Self::QueryMap {
                encoded: ParamOptions::parse(attr, false, true)?.encoded,
            },
            "query_name" => Self::QueryName {
                encoded: ParamOptions::parse(attr, false, true)?.encoded,
            },
            "header" => {
                let options = ParamOptions::parse(attr, true, false)?;
                Self::Header {
                    name: options
                        .name
                        .unwrap_or_else(|| default_name().replace('_', "-")),
                }
            }
            "header_map" => {
                attr.meta.require_path_only()?;
                Self::HeaderMap
            }
            "field" => {
                let options = ParamOptions::parse(attr, true, true)?;
                Self::Field {
                    name: options.name.unwrap_or_else(default_name),
                    encoded: options.encoded,
                }
            }
            "field_map" => Self::FieldMap {
                encoded: ParamOptions::parse(attr, false, true)?.encoded,
            },
            "part" => Self::Part {
                name: ParamOptions::parse(attr, true, false)?
                    .name
                    .unwrap_or_else(default_name),
            },
            "part_map" => {
                attr.meta.require_path_only()?;
                Self::PartMap
            }
            "body" => {
                attr.meta.require_path_only()?;
                Self::Body
            }
            "annotation" => Self::Custom(attr.parse_args()?),
            _ => return Ok(None),
        };
        Ok(Some(annotation))
    }

    /// The `.annotate(...)` argument for this annotation.
    pub(crate) fn to_tokens(&self) -> TokenStream {
        let encoded = |encoded: &bool| encoded.then(|| quote! { .encoded() });
        match self {
            Self::Path { name, encoded: e } => {
                let encoded = encoded(e);
                quote! { ::rivet::annotation::Path::new(#name) #encoded }
            }
            Self::Url => quote! { ::rivet::annotation::Url },
            Self::Query { name, encoded: e } => {
                let encoded = encoded(e);
                quote! { ::rivet::annotation::Query::new(#name) #encoded }
            }
            Self::QueryMap { encoded: e } => {
                let encoded = encoded(e);
                quote! { ::rivet::annotation::QueryMap::new() #encoded }
            }
            Self::QueryName { encoded: e } => {
                let encoded = encoded(e);
                quote! { ::rivet::annotation::QueryName::new() #encoded }
            }
            Self::Header { name } => quote! { ::rivet::annotation::Header::new(#name) },
            Self::HeaderMap => quote! { ::rivet::annotation::HeaderMap },
            Self::Field { name, encoded: e } => {
                let encoded = encoded(e);
                quote! { ::rivet::annotation::Field::new(#name) #encoded }
            }
            Self::FieldMap { encoded: e } => {
                let encoded = encoded(e);
                quote! { ::rivet::annotation::FieldMap::new() #encoded }
            }
            Self::Part { name } => quote! { ::rivet::annotation::Part::new(#name) },
            Self::PartMap => quote! { ::rivet::annotation::PartMap },
            Self::Body => quote! { ::rivet::annotation::Body },
            Self::Custom(expr) => quote! { #expr },
        }
    }
}

/// Check if an attribute is a rivet parameter attribute.
pub(crate) fn is_param_attr(attr: &Attribute) -> bool {
    let path = attr.path();
    PARAM_ATTRS.iter().any(|name| path.is_ident(name))
}
