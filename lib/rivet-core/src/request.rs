//! HTTP requests and the call-time [`RequestBuilder`].
//!
//! A generated method seeds a [`RequestBuilder`] from its descriptor, lets each
//! parameter handler apply its argument through `&mut` access, then calls
//! [`RequestBuilder::build`]. Values handed to the builder are already
//! percent-encoded by the handlers, so the builder only assembles them.

use bytes::Bytes;
use url::Url;

use crate::{BodyKind, ContentType, Error, Form, Method, Part, PathTemplate, RequestBody, Result};

/// An HTTP request with method, URL, headers, and optional body.
#[derive(Debug, Clone)]
pub struct Request<B = Bytes> {
    method: Method,
    url: Url,
    headers: Vec<(String, String)>,
    body: Option<B>,
}

impl<B> Request<B> {
    /// Assemble a request from its parts.
    #[must_use]
    pub const fn from_parts(
        method: Method,
        url: Url,
        headers: Vec<(String, String)>,
        body: Option<B>,
    ) -> Self {
        Self {
            method,
            url,
            headers,
            body,
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers, in insertion order. Names may repeat.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Mutable access to headers.
    pub fn headers_mut(&mut self) -> &mut Vec<(String, String)> {
        &mut self.headers
    }

    /// First header value with this name, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&B> {
        self.body.as_ref()
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, Url, Vec<(String, String)>, Option<B>) {
        (self.method, self.url, self.headers, self.body)
    }
}

#[derive(Debug, Clone)]
enum PendingBody {
    None,
    Form(Vec<(String, String)>),
    Multipart(Form),
    Raw(Option<RequestBody>),
}

/// Mutable staging area for one call.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    base_url: Url,
    path: String,
    url: Option<String>,
    query: Vec<(String, Option<String>)>,
    headers: Vec<(String, String)>,
    body: PendingBody,
}

impl RequestBuilder {
    /// Seed a builder with the method, base URL and path template.
    #[must_use]
    pub fn new(method: Method, base_url: Url, path: &PathTemplate) -> Self {
        Self {
            method,
            base_url,
            path: path.as_str().to_string(),
            url: None,
            query: Vec::new(),
            headers: Vec::new(),
            body: PendingBody::None,
        }
    }

    /// Declare how the body is produced. Form and multipart bodies are sent
    /// even when no field or part is added.
    #[must_use]
    pub fn body_kind(mut self, kind: Option<BodyKind>) -> Self {
        self.body = match kind {
            None => PendingBody::None,
            Some(BodyKind::FormUrlEncoded) => PendingBody::Form(Vec::new()),
            Some(BodyKind::Multipart) => PendingBody::Multipart(Form::new()),
            Some(BodyKind::Raw) => PendingBody::Raw(None),
        };
        self
    }

    /// Replace `{name}` with an encoded value.
    pub fn path_param(&mut self, name: &str, value: &str) {
        self.path = self.path.replace(&format!("{{{name}}}"), value);
    }

    /// Use a dynamic URL, resolved against the base URL.
    pub fn url(&mut self, url: impl Into<String>) {
        self.url = Some(url.into());
    }

    /// Append an encoded query pair, or a bare query name if `value` is `None`.
    pub fn query(&mut self, name: impl Into<String>, value: Option<String>) {
        self.query.push((name.into(), value));
    }

    /// Append a header.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Append an encoded form field.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not form-url-encoded.
    pub fn field(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        match &mut self.body {
            PendingBody::Form(fields) => {
                fields.push((name.into(), value.into()));
                Ok(())
            }
            _ => Err(Error::invalid_request("form field on a non form-url-encoded request")),
        }
    }

    /// Append a multipart part.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not multipart.
    pub fn part(&mut self, part: Part) -> Result<()> {
        match &mut self.body {
            PendingBody::Multipart(form) => {
                form.push(part);
                Ok(())
            }
            _ => Err(Error::invalid_request("part on a non multipart request")),
        }
    }

    /// Set the raw body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request uses a form or multipart body.
    pub fn body(&mut self, body: RequestBody) -> Result<()> {
        match &mut self.body {
            PendingBody::None | PendingBody::Raw(_) => {
                self.body = PendingBody::Raw(Some(body));
                Ok(())
            }
            PendingBody::Form(_) | PendingBody::Multipart(_) => {
                Err(Error::invalid_request("raw body on a form or multipart request"))
            }
        }
    }

    /// Build the [`Request`].
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn build(self) -> Result<Request> {
        let target = self.url.as_deref().unwrap_or(&self.path);
        let mut url = self.base_url.join(target)?;

        if !self.query.is_empty() {
            let appended = self
                .query
                .iter()
                .map(|(name, value)| match value {
                    Some(value) => format!("{name}={value}"),
                    None => name.clone(),
                })
                .collect::<Vec<_>>()
                .join("&");
            let query = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{appended}"),
                _ => appended,
            };
            url.set_query(Some(&query));
        }

        let mut headers = self.headers;
        let body = match self.body {
            PendingBody::None | PendingBody::Raw(None) => None,
            PendingBody::Form(fields) => {
                let encoded = fields
                    .iter()
                    .map(|(name, value)| format!("{name}={value}"))
                    .collect::<Vec<_>>()
                    .join("&");
                Some((ContentType::FormUrlEncoded.as_str().to_string(), Bytes::from(encoded)))
            }
            PendingBody::Multipart(form) => Some(form.into_body()),
            PendingBody::Raw(Some(body)) => Some(body.into_parts()),
        };

        let body = body.map(|(content_type, bytes)| {
            if !headers
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            {
                headers.push(("Content-Type".to_string(), content_type));
            }
            bytes
        });

        Ok(Request::from_parts(self.method, url, headers, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://api.example.com").expect("valid URL")
    }

    #[test]
    fn substitutes_path_and_appends_query() {
        let mut builder =
            RequestBuilder::new(Method::Get, base(), &PathTemplate::new("/users/{id}"));
        builder.path_param("id", "42");
        builder.query("page", Some("1".to_string()));
        builder.query("verbose", None);

        let request = builder.build().expect("build");
        assert_eq!(
            request.url().as_str(),
            "https://api.example.com/users/42?page=1&verbose"
        );
        assert!(request.body().is_none());
    }

    #[test]
    fn dynamic_url_replaces_path() {
        let mut builder = RequestBuilder::new(Method::Get, base(), &PathTemplate::default());
        builder.url("https://other.example.com/next?cursor=a");
        builder.query("limit", Some("5".to_string()));

        let request = builder.build().expect("build");
        assert_eq!(
            request.url().as_str(),
            "https://other.example.com/next?cursor=a&limit=5"
        );
    }

    #[test]
    fn form_body_sets_content_type() {
        let mut builder = RequestBuilder::new(Method::Post, base(), &PathTemplate::new("/login"))
            .body_kind(Some(BodyKind::FormUrlEncoded));
        builder.field("a", "1%202").expect("field");
        builder.field("b", "x").expect("field");

        let request = builder.build().expect("build");
        assert_eq!(
            request.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(request.body().map(AsRef::as_ref), Some(&b"a=1%202&b=x"[..]));
    }

    #[test]
    fn empty_form_is_still_sent() {
        let builder = RequestBuilder::new(Method::Post, base(), &PathTemplate::new("/ping"))
            .body_kind(Some(BodyKind::FormUrlEncoded));
        let request = builder.build().expect("build");
        assert_eq!(request.body().map(Bytes::len), Some(0));
    }

    #[test]
    fn explicit_content_type_header_wins() {
        let mut builder = RequestBuilder::new(Method::Put, base(), &PathTemplate::new("/raw"));
        builder.header("Content-Type", "application/vnd.custom+json");
        builder
            .body(RequestBody::new("application/json", "{}"))
            .expect("body");

        let request = builder.build().expect("build");
        assert_eq!(request.header("Content-Type"), Some("application/vnd.custom+json"));
        assert_eq!(request.headers().len(), 1);
    }

    #[test]
    fn field_requires_form_body() {
        let mut builder = RequestBuilder::new(Method::Post, base(), &PathTemplate::new("/x"));
        assert!(builder.field("a", "b").is_err());
        assert!(builder.part(Part::new("a", "b")).is_err());
    }
}
