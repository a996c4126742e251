//! Query-string parsing.

use std::collections::BTreeMap;

/// Name of the parameter that switches a page into file-loaded mode.
pub const LOADFILE_PARAM: &str = "loadfile";

/// Decoded `?a=b&c=d` parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: BTreeMap<String, String>,
}

impl QueryParams {
    /// Parse a search string, with or without the leading `?`.
    ///
    /// Later duplicates win. A key without `=` maps to an empty value.
    #[must_use]
    pub fn parse(search: &str) -> Self {
        let search = search.strip_prefix('?').unwrap_or(search);
        let params = search
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((k, v)) => (decode_component(k), decode_component(v)),
                None => (decode_component(pair), String::new()),
            })
            .collect();
        Self { params }
    }

    /// Parse the query part of a route such as `#/timedScalars?loadfile=x`.
    #[must_use]
    pub fn from_route(route: &str) -> Self {
        let route = route.split('#').find(|part| part.contains('?')).unwrap_or(route);
        route
            .split_once('?')
            .map_or_else(Self::default, |(_, q)| Self::parse(q))
    }

    /// Get a parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The `loadfile` parameter, if present and non-empty.
    #[must_use]
    pub fn loadfile(&self) -> Option<&str> {
        self.get(LOADFILE_PARAM).filter(|v| !v.is_empty())
    }
}

/// Percent-decode a component; `+` is a space. Invalid escapes are kept verbatim.
fn decode_component(s: &str) -> String {
    let spaced = s.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let q = QueryParams::parse("?loadfile=dump.json&x=1");
        assert_eq!(q.loadfile(), Some("dump.json"));
        assert_eq!(q.get("x"), Some("1"));
        assert_eq!(q.get("y"), None);
    }

    #[test]
    fn test_parse_without_question_mark() {
        assert_eq!(QueryParams::parse("a=b").get("a"), Some("b"));
    }

    #[test]
    fn test_parse_empty() {
        let q = QueryParams::parse("");
        assert_eq!(q, QueryParams::default());
        assert_eq!(q.loadfile(), None);
    }

    #[test]
    fn test_empty_loadfile_is_absent() {
        assert_eq!(QueryParams::parse("loadfile=").loadfile(), None);
        assert_eq!(QueryParams::parse("loadfile").loadfile(), None);
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode_component("a%20b+c"), "a b c");
        assert_eq!(decode_component("100%"), "100%");
        assert_eq!(decode_component("%zz"), "%zz");
        assert_eq!(decode_component("%C3%A9"), "é");
    }

    #[test]
    fn test_parse_decodes_encoded_values() {
        let encoded = urlencoding::encode("x&y=z b.json");
        let q = QueryParams::parse(&format!("loadfile={encoded}"));
        assert_eq!(q.loadfile(), Some("x&y=z b.json"));
        assert_eq!(QueryParams::parse("loadfile=a+b%2Fc").loadfile(), Some("a b/c"));
    }

    #[test]
    fn test_from_route() {
        let q = QueryParams::from_route("/index.html#/timedScalars?loadfile=nsysmon-1.json");
        assert_eq!(q.loadfile(), Some("nsysmon-1.json"));
        assert_eq!(QueryParams::from_route("#/envvar"), QueryParams::default());
    }
}
