//! Absolute URL construction with filtered query parameters.
//!
//! # Design
//! Generated callers pass every optional query parameter they know about,
//! set or not. Only "present" values reach the query string: `Null`,
//! `false`, `0`, `0.0`, `NaN` and `""` are all dropped. A legitimate `0` or
//! `false` therefore cannot be sent as a query parameter; callers that need
//! one must encode it into the path or send `"0"` / `"false"` as text.

use std::fmt;

use url::form_urlencoded;

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl QueryValue {
    /// Whether this value is written to the query string.
    pub fn is_present(&self) -> bool {
        match self {
            QueryValue::Null => false,
            QueryValue::Bool(b) => *b,
            QueryValue::Int(i) => *i != 0,
            QueryValue::Float(f) => *f != 0.0 && !f.is_nan(),
            QueryValue::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Null => Ok(()),
            QueryValue::Bool(b) => write!(f, "{b}"),
            QueryValue::Int(i) => write!(f, "{i}"),
            QueryValue::Float(x) => write!(f, "{x}"),
            QueryValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self {
        QueryValue::Text(s.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(s: String) -> Self {
        QueryValue::Text(s)
    }
}

impl From<bool> for QueryValue {
    fn from(b: bool) -> Self {
        QueryValue::Bool(b)
    }
}

impl From<i32> for QueryValue {
    fn from(i: i32) -> Self {
        QueryValue::Int(i64::from(i))
    }
}

impl From<i64> for QueryValue {
    fn from(i: i64) -> Self {
        QueryValue::Int(i)
    }
}

impl From<f64> for QueryValue {
    fn from(x: f64) -> Self {
        QueryValue::Float(x)
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(QueryValue::Null, Into::into)
    }
}

/// Ordered list of query parameters.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(String, QueryValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.pairs.push((name.into(), value.into()));
        self
    }

    /// Encode the present parameters, or `None` when nothing survives filtering.
    pub fn encode(&self) -> Option<String> {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        let mut any = false;
        for (name, value) in self.pairs.iter().filter(|(_, v)| v.is_present()) {
            serializer.append_pair(name, &value.to_string());
            any = true;
        }
        any.then(|| serializer.finish())
    }
}

/// Join `base_url` and `path`, appending the present query parameters.
pub fn build_url(base_url: &str, path: &str, params: &QueryParams) -> String {
    let base = base_url.trim_end_matches('/');
    let mut url = if path.starts_with('/') || path.is_empty() {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    };
    if let Some(query) = params.encode() {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&query);
    }
    url
}
