//! Relative path templates with `{name}` placeholders.

use std::fmt;

/// A request path before parameter substitution, e.g. `/users/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PathTemplate(String);

impl PathTemplate {
    /// Create a new path template.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// Get the template string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the template is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Placeholder names in order of appearance.
    ///
    /// E.g., `/users/{id}/posts/{post_id}` returns `["id", "post_id"]`.
    #[must_use]
    pub fn placeholders(&self) -> Vec<&str> {
        let mut placeholders = Vec::new();
        let mut rest = self.0.as_str();

        while let Some((_, after)) = rest.split_once('{') {
            let Some((name, tail)) = after.split_once('}') else {
                break;
            };
            if !name.is_empty() {
                placeholders.push(name);
            }
            rest = tail;
        }

        placeholders
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PathTemplate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PathTemplate {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_single() {
        assert_eq!(PathTemplate::new("/users/{id}").placeholders(), vec!["id"]);
    }

    #[test]
    fn placeholders_multiple() {
        let template = PathTemplate::new("/repos/{owner}/{repo}/issues/{number}");
        assert_eq!(template.placeholders(), vec!["owner", "repo", "number"]);
    }

    #[test]
    fn placeholders_none() {
        assert!(PathTemplate::new("/health").placeholders().is_empty());
        assert!(PathTemplate::new("").placeholders().is_empty());
    }

    #[test]
    fn placeholders_ignore_empty_and_unterminated() {
        assert!(PathTemplate::new("/a/{}/b").placeholders().is_empty());
        assert!(PathTemplate::new("/a/{open").placeholders().is_empty());
    }
}
