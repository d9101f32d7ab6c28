//! URL composition for provider endpoints
//!
//! Joins a base URL with path segments and a query string. Path segments are
//! percent-encoded so record ids cannot reshape the request. Query values are
//! form-urlencoded by default; providers that need literal `[`, `]`, `$` or
//! `@` in their query syntax register encoding exceptions which are restored
//! after generic encoding.

use crate::error::Result;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::collections::BTreeMap;
use std::fmt;
use url::form_urlencoded;

/// Exceptions for bracket filters (`query[createdOn][from]`) and OData sigils (`$filter`).
pub const QUERY_ENCODING_EXCEPTIONS: [(&str, &str); 4] =
    [("%24", "$"), ("%40", "@"), ("%5B", "["), ("%5D", "]")];

/// Characters escaped inside one path segment (RFC 3986 `pchar` complement)
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Builder for request URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlBuilder {
    base: String,
    query: BTreeMap<String, Vec<String>>,
    unencoded: Vec<(String, String)>,
    encoding_exceptions: Vec<(String, String)>,
}

impl UrlBuilder {
    /// Create a builder from a base URL and path segments
    pub fn new(base: &str, paths: &[&str]) -> Result<Self> {
        url::Url::parse(base)?;

        let mut builder = Self {
            base: base.trim_end_matches('/').to_string(),
            query: BTreeMap::new(),
            unencoded: Vec::new(),
            encoding_exceptions: Vec::new(),
        };
        for path in paths {
            builder.add_path(path);
        }
        Ok(builder)
    }

    /// Continue from a complete URL, keeping its query parameters
    pub fn parse(raw: &str) -> Result<Self> {
        let (base, query) = match raw.split_once('?') {
            Some((base, query)) => (base, query),
            None => (raw, ""),
        };

        let mut builder = Self::new(base, &[])?;
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            builder
                .query
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
        Ok(builder)
    }

    /// Append a static path such as `me/events`; each `/`-separated part is encoded
    pub fn add_path(&mut self, path: &str) -> &mut Self {
        for part in path.split('/').filter(|part| !part.is_empty()) {
            self.add_segment(part);
        }
        self
    }

    /// Append exactly one segment, escaping `/`, `?` and `#` along with the rest
    pub fn add_segment(&mut self, segment: &str) -> &mut Self {
        if !segment.is_empty() {
            self.base.push('/');
            self.base.extend(utf8_percent_encode(segment, SEGMENT));
        }
        self
    }

    /// Set a query parameter, replacing any previous value
    pub fn with_query_param(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.query.insert(key.into(), vec![value.into()]);
        self
    }

    /// Set a query parameter to several values (`key=a&key=b`)
    pub fn with_query_param_list<I, S>(&mut self, key: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query
            .insert(key.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Append `key=value` verbatim, bypassing encoding
    pub fn with_unencoded_query_param(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.unencoded.push((key.into(), value.into()));
        self
    }

    /// Restore the given encoded sequences after encoding
    pub fn add_encoding_exceptions<'a, I>(&mut self, exceptions: I) -> &mut Self
    where
        I: IntoIterator<Item = &'a (&'a str, &'a str)>,
    {
        for (encoded, literal) in exceptions {
            self.encoding_exceptions
                .push(((*encoded).to_string(), (*literal).to_string()));
        }
        self
    }

    /// First value of a query parameter
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Remove a query parameter
    pub fn remove_query_param(&mut self, key: &str) -> &mut Self {
        self.query.remove(key);
        self
    }

    fn encoded_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.query {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        let mut query = serializer.finish();

        for (encoded, literal) in &self.encoding_exceptions {
            query = query.replace(encoded.as_str(), literal);
        }

        for (key, value) in &self.unencoded {
            if !query.is_empty() {
                query.push('&');
            }
            query.push_str(key);
            query.push('=');
            query.push_str(value);
        }
        query
    }
}

impl fmt::Display for UrlBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query = self.encoded_query();
        if query.is_empty() {
            f.write_str(&self.base)
        } else {
            write!(f, "{}?{query}", self.base)
        }
    }
}
