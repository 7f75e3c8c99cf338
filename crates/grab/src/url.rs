//! URL composition

use std::collections::BTreeMap;

/// Whether `url` already names a scheme and can stand on its own.
fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Compose the final request URL from an optional base, a path and query
/// parameters.
///
/// Pure function: same inputs always produce the same output. A relative
/// `url` is joined onto `base_url` with exactly one slash; params are
/// appended with `?`, or `&` when the URL already carries a query string.
pub fn build_url(base_url: Option<&str>, url: &str, params: &BTreeMap<String, String>) -> String {
    let mut full = match base_url {
        Some(base) if !is_absolute(url) => format!(
            "{}/{}",
            base.trim_end_matches('/'),
            url.trim_start_matches('/')
        ),
        _ => url.to_string(),
    };

    if !params.is_empty() {
        if let Ok(query) = serde_urlencoded::to_string(params) {
            full.push(if full.contains('?') { '&' } else { '?' });
            full.push_str(&query);
        }
    }
    full
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_params() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    #[test]
    fn test_join_with_exactly_one_slash() {
        for (base, path) in [
            ("https://api.example.com", "/posts"),
            ("https://api.example.com/", "posts"),
            ("https://api.example.com///", "///posts"),
            ("https://api.example.com", "posts"),
        ] {
            assert_eq!(
                build_url(Some(base), path, &no_params()),
                "https://api.example.com/posts"
            );
        }
    }

    #[test]
    fn test_absolute_url_ignores_base() {
        assert_eq!(
            build_url(
                Some("https://api.example.com"),
                "https://other.example.com/posts",
                &no_params()
            ),
            "https://other.example.com/posts"
        );
    }

    #[test]
    fn test_params_appended_with_question_mark() {
        let mut params = BTreeMap::new();
        params.insert("q".to_string(), "rust lang".to_string());
        assert_eq!(
            build_url(None, "https://example.com/search", &params),
            "https://example.com/search?q=rust+lang"
        );
    }

    #[test]
    fn test_params_appended_with_ampersand_when_query_present() {
        let mut params = BTreeMap::new();
        params.insert("page".to_string(), "2".to_string());
        assert_eq!(
            build_url(None, "https://example.com/search?q=rust", &params),
            "https://example.com/search?q=rust&page=2"
        );
    }

    #[test]
    fn test_idempotent_for_same_inputs() {
        let mut params = BTreeMap::new();
        params.insert("a".to_string(), "1".to_string());
        params.insert("b".to_string(), "2".to_string());
        let first = build_url(Some("https://example.com/"), "/v1", &params);
        let second = build_url(Some("https://example.com/"), "/v1", &params);
        assert_eq!(first, second);
        assert_eq!(first, "https://example.com/v1?a=1&b=2");
    }
}
