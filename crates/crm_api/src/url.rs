use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use url::Url;

/// Default base URL for CRM backend requests.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001/api";

/// Everything outside the RFC 3986 unreserved set.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Ordered query-string parameters for a gateway call.
///
/// Entries whose value is `null` or the empty string are never serialized, so
/// backend filters fall back to their defaults instead of receiving `key=`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: Vec<(String, Value)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter. `None`, `null` and `""` are accepted and dropped
    /// at serialization time.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.push((key.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.pairs().next().is_none()
    }

    /// Serializable `(key, value)` pairs in insertion order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.entries
            .iter()
            .filter_map(|(key, value)| query_value(value).map(|value| (key.as_str(), value)))
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.push(key, value);
        }
        params
    }
}

fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        other => Some(other.to_string()),
    }
}

/// Parse and normalize a configured base URL.
///
/// Trailing slashes are dropped so `join_path` can always prepend one.
pub fn normalize_base_url(input: &str) -> Result<String, url::ParseError> {
    let base = if input.trim().is_empty() {
        DEFAULT_API_BASE_URL
    } else {
        input.trim()
    };

    let trimmed = base.trim_end_matches('/');
    Url::parse(trimmed)?;
    Ok(trimmed.to_string())
}

/// Build the absolute request URL for `path` with the non-empty `query` pairs.
pub fn build_url(base_url: &str, path: &str, query: &QueryParams) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&join_path(base_url, path))?;

    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query.pairs() {
            pairs.append_pair(key, &value);
        }
    }

    Ok(url)
}

/// Percent-encodes one path segment. A space becomes `%20` and `+`, `/`, `?`
/// become `%2B`, `%2F`, `%3F`, so an id can never change the route.
pub fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

fn join_path(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim();
    if path.is_empty() {
        return base.to_string();
    }
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
