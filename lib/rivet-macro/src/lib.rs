//! Procedural macros for the rivet declarative HTTP client.
//!
//! `#[service]` turns an annotated trait into:
//! - the clean trait (without rivet attributes),
//! - a `<Trait>Client` struct implementing it,
//! - a `rivet::ServiceInterface` impl carrying the service declaration.
//!
//! # Method attributes
//!
//! - `#[get("/path")]`, `#[post]`, `#[put]`, `#[delete]`, `#[patch]`, `#[head]`, `#[options]`
//! - `#[http("VERB /path")]`
//! - `#[headers("Name: value", ...)]`, also on the trait for every method
//! - `#[asynchronous]`, implied by a `Result<Deferred<T>>` return type
//! - `#[annotation(expr)]` for custom annotations
//!
//! # Parameter attributes
//!
//! - `#[path]`, `#[query]`, `#[field]`: optional `"name"` and `encoded`
//! - `#[query_map]`, `#[query_name]`, `#[field_map]`: optional `encoded`
//! - `#[header]`: optional `"name"`, defaults to the parameter name with `-`
//! - `#[header_map]`, `#[part("name")]`, `#[part_map]`, `#[body]`, `#[url]`
//! - `#[annotation(expr)]`
//!
//! Unannotated parameters named after a path placeholder are path
//! parameters; a single remaining one on `POST`, `PUT` or `PATCH` is the
//! body.
//!
//! # Example
//!
//! ```ignore
//! use rivet::prelude::*;
//!
//! #[rivet::service]
//! pub trait UserApi {
//!     #[get("/users/{id}")]
//!     async fn get_user(&self, id: u64) -> rivet::Result<User>;
//!
//!     #[post("/users")]
//!     fn create_user(&self, user: NewUser) -> rivet::Result<Deferred<User>>;
//! }
//!
//! let users: UserApiClient = rivet.create()?;
//! let user = users.get_user(42).await?;
//! ```

mod attrs;
mod expand;

use proc_macro::TokenStream;

/// Mark a trait as a rivet service.
///
/// # Attributes
///
/// - `name` (optional): the service name, defaults to the trait name
///
/// # Example
///
/// ```ignore
/// #[rivet::service(name = "Users")]
/// #[headers("Accept: application/json")]
/// pub trait UserApi {
///     #[get("/users")]
///     async fn search(&self, #[query("q")] term: &str) -> rivet::Result<Vec<User>>;
/// }
/// ```
#[proc_macro_attribute]
pub fn service(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand::expand_service(attr.into(), item.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
