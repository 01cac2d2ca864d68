use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::form_urlencoded;

/// Raw parameter configuration: query key → unexpanded value, in the order
/// the keys first appear in the configuration string.
pub type ParameterSpec = IndexMap<String, String>;

/// Parameter key → distinct values it expands to.
pub type ExpandedParameters = IndexMap<String, Vec<ParamValue>>;

/// A single expanded value. Ranges produce integers, everything else text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

/// Splits a `&a=1&b=[2|3]` configuration string into its parameters.
/// Keys and values are form-decoded; empty keys are dropped and a repeated
/// key keeps its first position with the last value.
pub fn explode_query(query: &str) -> ParameterSpec {
    let mut spec = ParameterSpec::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if key.is_empty() {
            continue;
        }
        spec.insert(key.into_owned(), value.into_owned());
    }
    spec
}

/// Percent-encodes everything outside `A-Z a-z 0-9 - _ . ~` (RFC 3986).
pub fn raw_url_encode(input: &str) -> String {
    // form encoding differs from RFC 3986 only in these three spots
    form_urlencoded::byte_serialize(input.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
        .replace('*', "%2A")
        .replace("%7E", "~")
}
