//! Iframe URL construction.
//!
//! URLs have the form `{base_url}iframe/{route}/?{query}`. Query values are
//! emitted as given, without percent-encoding: identifiers are generated
//! URL-safe and header-derived values are passed through from the server.

use crate::kind::DisplayKind;

/// Ordered query parameters with unique keys.
///
/// Inserting an existing key replaces its value in place, so emission order
/// always reflects first insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `key=value` pairs joined by `&`.
    pub fn to_query_string(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for QueryParams {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = QueryParams::new();
        params.extend(iter);
        params
    }
}

/// Assemble the iframe URL. `base_url` must already end with `/`.
pub fn build_iframe_url(base_url: &str, kind: DisplayKind, params: &QueryParams) -> String {
    format!(
        "{}iframe/{}/?{}",
        base_url,
        kind.route(),
        params.to_query_string()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_table_url() {
        let params: QueryParams = [("name", "t_abc")].into_iter().collect();
        assert_eq!(
            build_iframe_url("http://localhost:9876/", DisplayKind::Table, &params),
            "http://localhost:9876/iframe/table/?name=t_abc"
        );
    }

    #[test]
    fn test_routes_per_kind() {
        let params: QueryParams = [("name", "x")].into_iter().collect();
        let base = "https://dh.example/";
        assert_eq!(
            build_iframe_url(base, DisplayKind::Chart, &params),
            "https://dh.example/iframe/chart/?name=x"
        );
        assert_eq!(
            build_iframe_url(base, DisplayKind::GenericWidget, &params),
            "https://dh.example/iframe/widget/?name=x"
        );
    }

    #[test]
    fn test_params_keep_insertion_order() {
        let mut params = QueryParams::new();
        params.insert("name", "t_1");
        params.insert("envoyPrefix", "/worker/7");
        params.insert("authProvider", "parent");
        assert_eq!(
            params.to_query_string(),
            "name=t_1&envoyPrefix=/worker/7&authProvider=parent"
        );
    }

    #[test]
    fn test_duplicate_key_replaces_in_place() {
        let mut params = QueryParams::new();
        params.insert("name", "a");
        params.insert("authProvider", "parent");
        params.insert("name", "b");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("name"), Some("b"));
        assert_eq!(params.to_query_string(), "name=b&authProvider=parent");
    }

    #[test]
    fn test_values_are_not_encoded() {
        let params: QueryParams = [("name", "a b&c")].into_iter().collect();
        assert_eq!(
            build_iframe_url("http://h/", DisplayKind::Table, &params),
            "http://h/iframe/table/?name=a b&c"
        );
    }
}
