//! Query string assembly.
//!
//! Parameters are kept in insertion order. Nothing is included unless the
//! caller pushes it: boolean flags only appear when set, and then always as
//! the literal `true`.

/// Delimiter placed between plugin properties when they are folded into a
/// single `pluginProperty` value. This is a backslash followed by `n`, not a
/// newline.
pub const PLUGIN_PROPERTY_DELIMITER: &str = "\\n";

/// Ordered set of already-stringified query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always include `key=value`.
    pub fn push(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.pairs.push((key.to_string(), value.into()));
        self
    }

    /// Include `key=true` when `flag` is set.
    pub fn flag(&mut self, key: &str, flag: bool) -> &mut Self {
        if flag {
            self.push(key, "true");
        }
        self
    }

    /// Include `key=value` when a non-empty value is present.
    pub fn optional<V: ToString>(&mut self, key: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            let value = value.to_string();
            if !value.is_empty() {
                self.push(key, value);
            }
        }
        self
    }

    /// Include `key=<values joined by delimiter>` when `values` is non-empty.
    pub fn joined<S: AsRef<str>>(&mut self, key: &str, values: &[S], delimiter: &str) -> &mut Self {
        if !values.is_empty() {
            let joined = values
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join(delimiter);
            self.push(key, joined);
        }
        self
    }

    /// Fold plugin properties into a single `pluginProperty` value.
    pub fn plugin_properties<S: AsRef<str>>(&mut self, values: &[S]) -> &mut Self {
        self.joined("pluginProperty", values, PLUGIN_PROPERTY_DELIMITER)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Render as `""` or `?k=v&k2=v2` with percent-encoded keys and values.
    pub fn to_query_string(&self) -> String {
        if self.pairs.is_empty() {
            return String::new();
        }
        let encoded = self
            .pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("?{encoded}")
    }
}
