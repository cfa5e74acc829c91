//! Interception rules

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::error::{HarnessError, HarnessResult};
use crate::intercept::exchange::{RequestData, ResponseData};

/// Rewrites a forwarded response before the application sees it. The
/// original request is available for inspection but never modified.
pub type ResponseTransform = Arc<dyn Fn(&RequestData, &mut ResponseData) + Send + Sync>;

/// What a matched rule answers with.
#[derive(Clone)]
pub enum ResponseSource {
    /// Canned body loaded from the fixture store by name
    Fixture(String),
    /// Inline JSON literal
    Literal(Value),
    /// Let the real upstream answer and deliver it unchanged (spying)
    Passthrough,
    /// Let the real upstream answer, then rewrite the response in flight
    Transform(ResponseTransform),
}

impl fmt::Debug for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseSource::Fixture(name) => write!(f, "Fixture({:?})", name),
            ResponseSource::Literal(_) => write!(f, "Literal(..)"),
            ResponseSource::Passthrough => write!(f, "Passthrough"),
            ResponseSource::Transform(_) => write!(f, "Transform(..)"),
        }
    }
}

/// URL pattern matched against a request's path and query.
///
/// `**` matches across path segments, `*` within one segment; both ends
/// are anchored. A pattern without glob metacharacters matches as a plain
/// substring.
#[derive(Debug, Clone)]
pub struct UrlPattern {
    raw: String,
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    Substring(String),
    Glob(Regex),
}

impl UrlPattern {
    pub fn new(pattern: &str) -> HarnessResult<Self> {
        let matcher = if pattern.contains('*') {
            Matcher::Glob(compile_glob(pattern)?)
        } else {
            Matcher::Substring(pattern.to_string())
        };
        Ok(Self {
            raw: pattern.to_string(),
            matcher,
        })
    }

    pub fn matches(&self, uri: &str) -> bool {
        match &self.matcher {
            Matcher::Substring(needle) => uri.contains(needle.as_str()),
            Matcher::Glob(regex) => regex.is_match(uri),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn compile_glob(pattern: &str) -> HarnessResult<Regex> {
    let mut translated = String::from("^");
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '*' {
            if chars.peek() == Some(&'*') {
                chars.next();
                translated.push_str(".*");
            } else {
                translated.push_str("[^/]*");
            }
        } else {
            translated.push_str(&regex::escape(&c.to_string()));
        }
    }
    translated.push('$');
    Regex::new(&translated).map_err(|e| HarnessError::Pattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// A match pattern paired with a response policy and an optional alias.
#[derive(Debug, Clone)]
pub struct InterceptRule {
    method: String,
    pattern: UrlPattern,
    source: ResponseSource,
    alias: Option<String>,
}

impl InterceptRule {
    pub fn new(method: &str, pattern: &str) -> HarnessResult<Self> {
        Ok(Self {
            method: method.to_uppercase(),
            pattern: UrlPattern::new(pattern)?,
            source: ResponseSource::Passthrough,
            alias: None,
        })
    }

    pub fn get(pattern: &str) -> HarnessResult<Self> {
        Self::new("GET", pattern)
    }

    pub fn post(pattern: &str) -> HarnessResult<Self> {
        Self::new("POST", pattern)
    }

    /// Answer matched calls from the named fixture.
    pub fn fixture(mut self, name: &str) -> Self {
        self.source = ResponseSource::Fixture(name.to_string());
        self
    }

    /// Answer matched calls with an inline JSON literal.
    pub fn literal(mut self, body: Value) -> Self {
        self.source = ResponseSource::Literal(body);
        self
    }

    /// Forward matched calls upstream and rewrite the response in flight.
    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&RequestData, &mut ResponseData) + Send + Sync + 'static,
    {
        self.source = ResponseSource::Transform(Arc::new(transform));
        self
    }

    /// Tag matched exchanges so they can be waited on by name.
    pub fn aliased(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn matches(&self, method: &str, uri: &str) -> bool {
        self.method.eq_ignore_ascii_case(method) && self.pattern.matches(uri)
    }

    pub fn source(&self) -> &ResponseSource {
        &self.source
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn pattern(&self) -> &UrlPattern {
        &self.pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_star_crosses_path_segments() {
        let pattern = UrlPattern::new("**/tags").unwrap();
        assert!(pattern.matches("/api/tags"));
        assert!(pattern.matches("/v2/api/tags"));
        assert!(!pattern.matches("/api/tags/popular"));
    }

    #[test]
    fn single_star_stays_within_a_segment() {
        let pattern = UrlPattern::new("**/articles*").unwrap();
        assert!(pattern.matches("/api/articles"));
        assert!(pattern.matches("/api/articles?limit=10&offset=0"));
        assert!(!pattern.matches("/api/articles/feed?limit=10"));

        let feed = UrlPattern::new("**/articles/feed*").unwrap();
        assert!(feed.matches("/api/articles/feed?limit=10&offset=0"));
    }

    #[test]
    fn plain_pattern_matches_as_substring() {
        let pattern = UrlPattern::new("tags").unwrap();
        assert!(pattern.matches("/api/tags"));
        assert!(pattern.matches("/api/tags?all=true"));
    }

    #[test]
    fn glob_metacharacters_from_the_uri_are_literal() {
        let pattern = UrlPattern::new("**/articles?limit=10&offset=0").unwrap();
        assert!(pattern.matches("/api/articles?limit=10&offset=0"));
        assert!(!pattern.matches("/api/articlesXlimit=10&offset=0"));
    }

    #[test]
    fn rules_match_on_method_and_pattern() {
        let rule = InterceptRule::post("**/articles").unwrap();
        assert!(rule.matches("POST", "/api/articles"));
        assert!(rule.matches("post", "/api/articles"));
        assert!(!rule.matches("GET", "/api/articles"));
        assert!(!rule.matches("POST", "/api/articles/slug/favorite"));
    }
}
