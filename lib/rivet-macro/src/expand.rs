//! Expansion of `#[service]` traits.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    FnArg, GenericArgument, Ident, ItemTrait, Pat, PatType, PathArguments, ReturnType,
    Signature, TraitItem, TraitItemFn, Type, parse2,
};

use crate::attrs::{
    HttpMethod, MethodAnnotation, ParamAnnotation, ServiceArgs, is_param_attr, parse_header_lines,
};

/// How a method hands its result back.
#[derive(Debug)]
enum Dispatch {
    /// `async fn m(..) -> Result<T>`: awaited inline.
    Direct(Type),
    /// `fn m(..) -> Result<Deferred<T>>`: resolved when awaited.
    Deferred(Type),
}

impl Dispatch {
    const fn value_type(&self) -> &Type {
        match self {
            Self::Direct(ty) | Self::Deferred(ty) => ty,
        }
    }
}

#[derive(Debug)]
struct MethodParam {
    name: Ident,
    ty: Type,
    annotations: Vec<ParamAnnotation>,
}

#[derive(Debug)]
struct ServiceMethod {
    sig: Signature,
    attrs: Vec<syn::Attribute>,
    annotations: Vec<MethodAnnotation>,
    params: Vec<MethodParam>,
    dispatch: Dispatch,
}

/// Expand a `#[service]` trait into the clean trait, its client struct, the
/// [`ServiceInterface`] impl and the trait impl.
pub(crate) fn expand_service(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    let trait_def: ItemTrait = parse2(item)?;
    let args = ServiceArgs::parse(attr)?;

    if !trait_def.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &trait_def.generics,
            "generic service traits are not supported",
        ));
    }

    let trait_name = &trait_def.ident;
    let service_name = args.name.unwrap_or_else(|| trait_name.to_string());
    let trait_headers = parse_trait_headers(&trait_def)?;
    let methods = extract_methods(&trait_def)?;

    let clean_trait = generate_clean_trait(&trait_def, &methods);
    let client_name = format_ident!("{}Client", trait_name);
    let client = generate_client(&trait_def.vis, trait_name, &client_name);
    let interface = generate_interface(&client_name, &service_name, &trait_headers, &methods);
    let trait_impl = generate_trait_impl(trait_name, &client_name, &methods);

    Ok(quote! {
        #clean_trait
        #client
        #interface
        #trait_impl
    })
}

fn parse_trait_headers(trait_def: &ItemTrait) -> syn::Result<Vec<String>> {
    let mut headers = Vec::new();
    for attr in trait_def.attrs.iter().filter(|a| a.path().is_ident("headers")) {
        headers.extend(parse_header_lines(attr)?);
    }
    Ok(headers)
}

fn extract_methods(trait_def: &ItemTrait) -> syn::Result<Vec<ServiceMethod>> {
    trait_def
        .items
        .iter()
        .map(|item| match item {
            TraitItem::Fn(method) => parse_method(method),
            other => Err(syn::Error::new_spanned(
                other,
                "service traits may only declare methods",
            )),
        })
        .collect()
}

fn parse_method(method: &TraitItemFn) -> syn::Result<ServiceMethod> {
    if method.default.is_some() {
        return Err(syn::Error::new_spanned(
            &method.sig,
            "service methods cannot have a default body",
        ));
    }
    if !method.sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &method.sig.generics,
            "generic service methods are not supported",
        ));
    }
    match method.sig.inputs.first() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new_spanned(
                &method.sig,
                "service methods must take `&self`",
            ));
        }
    }

    let mut annotations = Vec::new();
    let mut attrs = Vec::new();
    for attr in &method.attrs {
        match MethodAnnotation::parse(attr)? {
            Some(annotation) => annotations.push(annotation),
            None => attrs.push(attr.clone()),
        }
    }

    let dispatch = analyze_return_type(&method.sig)?;
    let explicit_async = annotations
        .iter()
        .any(|a| matches!(a, MethodAnnotation::Asynchronous));
    match &dispatch {
        Dispatch::Deferred(_) => {
            if method.sig.asyncness.is_some() {
                return Err(syn::Error::new_spanned(
                    &method.sig,
                    "methods returning `Deferred` must not be `async fn`",
                ));
            }
            if !explicit_async {
                annotations.push(MethodAnnotation::Asynchronous);
            }
        }
        Dispatch::Direct(_) => {
            if explicit_async {
                return Err(syn::Error::new_spanned(
                    &method.sig.output,
                    "`#[asynchronous]` methods must return `Result<Deferred<T>>`",
                ));
            }
            if method.sig.asyncness.is_none() {
                return Err(syn::Error::new_spanned(
                    &method.sig,
                    "service methods must be `async fn`, or return `Result<Deferred<T>>`",
                ));
            }
        }
    }

    let http = annotations.iter().find_map(|a| match a {
        MethodAnnotation::Http(method, path) => Some((*method, path.as_str())),
        _ => None,
    });
    let params = parse_params(&method.sig, http)?;

    Ok(ServiceMethod {
        sig: method.sig.clone(),
        attrs,
        annotations,
        params,
        dispatch,
    })
}

/// Extract `T` from `Result<T>`, then `U` from `Deferred<U>`.
fn analyze_return_type(sig: &Signature) -> syn::Result<Dispatch> {
    let ReturnType::Type(_, ty) = &sig.output else {
        return Err(syn::Error::new_spanned(
            sig,
            "service methods must return `rivet::Result<T>`",
        ));
    };
    let value = single_generic(ty, "Result").ok_or_else(|| {
        syn::Error::new_spanned(ty, "service methods must return `rivet::Result<T>`")
    })?;

    Ok(match single_generic(value, "Deferred") {
        Some(inner) => Dispatch::Deferred(inner.clone()),
        None => Dispatch::Direct(value.clone()),
    })
}

/// The only type argument of `ty` when its last path segment is `name`.
fn single_generic<'a>(ty: &'a Type, name: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != name {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    let mut types = args.args.iter().filter_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    });
    let first = types.next()?;
    types.next().is_none().then_some(first)
}

/// Parse parameters, classifying unannotated ones: a name matching a path
/// placeholder becomes a path parameter, a single leftover on a method that
/// takes a body becomes the body.
fn parse_params(sig: &Signature, http: Option<(HttpMethod, &str)>) -> syn::Result<Vec<MethodParam>> {
    let placeholders = http
        .map(|(_, path)| extract_path_placeholders(path))
        .unwrap_or_default();
    let mut params = Vec::new();
    let mut unclassified: Vec<(usize, &PatType)> = Vec::new();

    for input in sig.inputs.iter().skip(1) {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        let Pat::Ident(pat_ident) = pat_type.pat.as_ref() else {
            return Err(syn::Error::new_spanned(
                &pat_type.pat,
                "service parameters must be plain identifiers",
            ));
        };
        let name = pat_ident.ident.clone();

        let mut annotations = Vec::new();
        for attr in &pat_type.attrs {
            if let Some(annotation) = ParamAnnotation::parse(attr, &name)? {
                annotations.push(annotation);
            }
        }

        if annotations.is_empty() {
            if placeholders.contains(&name.to_string()) {
                annotations.push(ParamAnnotation::Path {
                    name: name.to_string(),
                    encoded: false,
                });
            } else {
                unclassified.push((params.len(), pat_type));
            }
        }

        params.push(MethodParam {
            name,
            ty: (*pat_type.ty).clone(),
            annotations,
        });
    }

    let takes_body = http.is_some_and(|(method, _)| {
        matches!(method, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    });
    match unclassified.as_slice() {
        [] => {}
        [(index, _)] if takes_body => {
            if let Some(param) = params.get_mut(*index) {
                param.annotations.push(ParamAnnotation::Body);
            }
        }
        [(_, pat_type)] => {
            return Err(syn::Error::new_spanned(
                pat_type,
                format!(
                    "parameter does not match any path placeholder (available: {placeholders:?}) \
                     and this method takes no body. Add #[query] or another explicit attribute."
                ),
            ));
        }
        [_, (_, pat_type), ..] => {
            return Err(syn::Error::new_spanned(
                pat_type,
                "multiple unannotated parameters found. Only one body parameter is allowed. \
                 Add explicit attributes to disambiguate.",
            ));
        }
    }

    Ok(params)
}

/// Placeholder names of a path template, in order.
fn extract_path_placeholders(path: &str) -> Vec<String> {
    path.split('{')
        .skip(1)
        .filter_map(|segment| segment.split_once('}'))
        .map(|(name, _)| name.to_string())
        .collect()
}

fn type_to_string(ty: &Type) -> String {
    quote!(#ty).to_string().replace(' ', "")
}

/// Strip rivet attributes from a method signature.
fn strip_rivet_attrs(sig: &Signature) -> Signature {
    let mut clean = sig.clone();
    for input in &mut clean.inputs {
        if let FnArg::Typed(pat_type) = input {
            pat_type.attrs.retain(|attr| !is_param_attr(attr));
        }
    }
    clean
}

fn generate_clean_trait(original: &ItemTrait, methods: &[ServiceMethod]) -> TokenStream {
    let vis = &original.vis;
    let name = &original.ident;
    let trait_attrs = original.attrs.iter().filter(|a| {
        let path = a.path();
        path.is_ident("doc") || path.is_ident("allow") || path.is_ident("cfg")
    });

    let signatures = methods.iter().map(|m| {
        let attrs = &m.attrs;
        let sig = strip_rivet_attrs(&m.sig);
        quote! {
            #(#attrs)*
            #sig;
        }
    });

    quote! {
        #(#trait_attrs)*
        #[allow(async_fn_in_trait)]
        #vis trait #name {
            #(#signatures)*
        }
    }
}

fn generate_client(vis: &syn::Visibility, trait_name: &Ident, client_name: &Ident) -> TokenStream {
    let doc = format!("Generated client for [`{trait_name}`].");
    quote! {
        #[doc = #doc]
        #[derive(Debug, Clone)]
        #vis struct #client_name {
            service: ::rivet::GeneratedService,
        }

        impl #client_name {
            /// The generated service backing this client.
            #[must_use]
            pub fn service(&self) -> &::rivet::GeneratedService {
                &self.service
            }
        }
    }
}

fn generate_interface(
    client_name: &Ident,
    service_name: &str,
    trait_headers: &[String],
    methods: &[ServiceMethod],
) -> TokenStream {
    let shared_headers = (!trait_headers.is_empty()).then(|| {
        quote! { .annotate(::rivet::annotation::Headers::new([#(#trait_headers),*])) }
    });

    let declarations = methods.iter().map(|m| {
        let name = m.sig.ident.to_string();
        let annotations = m.annotations.iter().map(MethodAnnotation::to_tokens);
        let params = m.params.iter().map(|p| {
            let param_name = p.name.to_string();
            let ty = type_to_string(&p.ty);
            let annotations = p.annotations.iter().map(ParamAnnotation::to_tokens);
            quote! {
                .parameter(
                    ::rivet::ParameterDeclaration::new(#param_name, #ty)
                        #(.annotate(#annotations))*
                )
            }
        });
        let returns = type_to_string(m.dispatch.value_type());
        quote! {
            .method(
                ::rivet::MethodDeclaration::new(#name)
                    #shared_headers
                    #(.annotate(#annotations))*
                    #(#params)*
                    .returns(#returns)
            )
        }
    });

    quote! {
        impl ::rivet::ServiceInterface for #client_name {
            fn declaration() -> ::rivet::ServiceDeclaration {
                ::rivet::ServiceDeclaration::new(#service_name)
                    #(#declarations)*
            }

            fn from_service(service: ::rivet::GeneratedService) -> Self {
                Self { service }
            }
        }
    }
}

fn generate_trait_impl(trait_name: &Ident, client_name: &Ident, methods: &[ServiceMethod]) -> TokenStream {
    let impls = methods.iter().map(|m| {
        let sig = strip_rivet_attrs(&m.sig);
        let name = m.sig.ident.to_string();
        let arguments = m.params.iter().map(|p| {
            let ident = &p.name;
            quote! { ::rivet::to_argument(&#ident)? }
        });
        let body = match m.dispatch {
            Dispatch::Direct(_) => quote! {
                self.service.call(#name, &[#(#arguments),*]).await
            },
            Dispatch::Deferred(_) => quote! {
                self.service.call_deferred(#name, &[#(#arguments),*])
            },
        };
        quote! {
            #sig {
                #body
            }
        }
    });

    quote! {
        impl #trait_name for #client_name {
            #(#impls)*
        }
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use quote::quote;

    use super::*;

    fn expand(item: TokenStream) -> syn::Result<String> {
        expand_service(TokenStream::new(), item).map(|tokens| tokens.to_string())
    }

    #[test]
    fn placeholders() {
        check!(extract_path_placeholders("/users/{id}/posts/{post_id}") == ["id", "post_id"]);
        check!(extract_path_placeholders("/users").is_empty());
        check!(extract_path_placeholders("/broken/{id").is_empty());
    }

    #[test]
    fn expands_client_and_declaration() {
        let_assert!(Ok(output) = expand(quote! {
            /// Users.
            pub trait UserApi {
                #[get("/users/{id}")]
                async fn get_user(&self, id: u64) -> rivet::Result<User>;

                #[post("/users")]
                fn create_user(&self, user: NewUser) -> rivet::Result<Deferred<User>>;
            }
        }));

        check!(output.contains("pub struct UserApiClient"));
        check!(output.contains("impl :: rivet :: ServiceInterface for UserApiClient"));
        check!(output.contains(":: rivet :: ServiceDeclaration :: new (\"UserApi\")"));
        check!(output.contains(":: rivet :: annotation :: Path :: new (\"id\")"));
        check!(output.contains(":: rivet :: annotation :: Body"));
        check!(output.contains(":: rivet :: annotation :: Async"));
        check!(output.contains(". returns (\"User\")"));
        check!(output.contains("self . service . call (\"get_user\""));
        check!(output.contains("self . service . call_deferred (\"create_user\""));
        check!(output.contains("# [allow (async_fn_in_trait)]"));
    }

    #[test]
    fn service_name_can_be_overridden() {
        let_assert!(Ok(output) = expand_service(
            quote! { name = "Users" },
            quote! {
                pub trait UserApi {
                    #[get("/ping")]
                    async fn ping(&self) -> rivet::Result<()>;
                }
            },
        ));
        check!(output.to_string().contains(":: rivet :: ServiceDeclaration :: new (\"Users\")"));
    }

    #[test]
    fn trait_headers_apply_to_every_method() {
        let_assert!(Ok(output) = expand(quote! {
            #[headers("Accept: application/json")]
            pub trait UserApi {
                #[get("/a")]
                async fn a(&self) -> rivet::Result<()>;
                #[get("/b")]
                async fn b(&self) -> rivet::Result<()>;
            }
        }));
        check!(output.matches("Headers :: new ([\"Accept: application/json\"])").count() == 2);
    }

    #[test]
    fn rivet_attributes_are_stripped() {
        let_assert!(Ok(output) = expand(quote! {
            pub trait SearchApi {
                #[get("/search")]
                async fn search(&self, #[query("q")] term: String) -> rivet::Result<Vec<String>>;
            }
        }));
        check!(!output.contains("# [query"));
        check!(!output.contains("# [get"));
        check!(output.contains(". returns (\"Vec<String>\")"));
    }

    #[test]
    fn unannotated_parameter_on_get_is_rejected() {
        check!(expand(quote! {
            pub trait UserApi {
                #[get("/users")]
                async fn find(&self, name: String) -> rivet::Result<()>;
            }
        })
        .is_err());
    }

    #[test]
    fn multiple_unannotated_parameters_are_rejected() {
        check!(expand(quote! {
            pub trait UserApi {
                #[post("/users")]
                async fn create(&self, a: String, b: String) -> rivet::Result<()>;
            }
        })
        .is_err());
    }

    #[test]
    fn dispatch_mode_must_match_signature() {
        check!(expand(quote! {
            pub trait Api {
                #[get("/x")]
                fn x(&self) -> rivet::Result<()>;
            }
        })
        .is_err());

        check!(expand(quote! {
            pub trait Api {
                #[get("/x")]
                async fn x(&self) -> rivet::Result<Deferred<()>>;
            }
        })
        .is_err());

        check!(expand(quote! {
            pub trait Api {
                #[get("/x")]
                #[asynchronous]
                async fn x(&self) -> rivet::Result<()>;
            }
        })
        .is_err());
    }

    #[test]
    fn explicit_asynchronous_is_not_duplicated() {
        let_assert!(Ok(output) = expand(quote! {
            pub trait Api {
                #[get("/x")]
                #[asynchronous]
                fn x(&self) -> rivet::Result<Deferred<()>>;
            }
        }));
        check!(output.matches(":: rivet :: annotation :: Async").count() == 1);
    }

    #[test]
    fn invalid_shapes_are_rejected() {
        check!(expand(quote! {
            pub trait Api {
                #[get("/x")]
                async fn x(self) -> rivet::Result<()>;
            }
        })
        .is_err());

        check!(expand(quote! {
            pub trait Api {
                #[get("/x")]
                async fn x(&self) -> String;
            }
        })
        .is_err());

        check!(expand(quote! {
            pub trait Api<T> {
                #[get("/x")]
                async fn x(&self) -> rivet::Result<T>;
            }
        })
        .is_err());
    }

    #[test]
    fn methods_without_verb_pass_through() {
        let_assert!(Ok(output) = expand(quote! {
            pub trait Api {
                #[annotation(Custom::new())]
                async fn x(&self) -> rivet::Result<()>;
            }
        }));
        check!(output.contains(". annotate (Custom :: new ())"));
    }
}
