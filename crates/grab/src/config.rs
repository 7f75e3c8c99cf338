//! Request configuration and merge rules

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::response::Body;
use crate::transform::{json_decode_stage, json_encode_stage, RequestTransform, ResponseTransform};

/// Timeout applied when a config does not set one.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// HTTP request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// PATCH
    Patch,
    /// OPTIONS
    Options,
    /// HEAD
    Head,
    /// CONNECT
    Connect,
    /// TRACE
    Trace,
}

impl Method {
    /// Canonical upper-case token for the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Options => "OPTIONS",
            Method::Head => "HEAD",
            Method::Connect => "CONNECT",
            Method::Trace => "TRACE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            "OPTIONS" => Ok(Method::Options),
            "HEAD" => Ok(Method::Head),
            "CONNECT" => Ok(Method::Connect),
            "TRACE" => Ok(Method::Trace),
            other => Err(format!("unknown HTTP method: {other}")),
        }
    }
}

/// How the response body should be interpreted before the response
/// transforms run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    /// Decode the body as text and attempt JSON decoding (the default).
    #[default]
    Json,
    /// Keep the body as text.
    Text,
    /// Keep the body as raw bytes.
    Bytes,
}

/// Header map with case-insensitive names.
///
/// Names are lower-cased on insert, so lookups are case-insensitive by
/// construction and response headers always come out lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    inner: BTreeMap<String, String>,
}

impl Headers {
    /// Create an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any existing value for the same name.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.inner
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Insert a header only if no value is present for the same name.
    pub fn insert_if_absent(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.inner
            .entry(name.as_ref().to_ascii_lowercase())
            .or_insert_with(|| value.into());
    }

    /// Look up a header value, ignoring the case of `name`.
    pub fn get(&self, name: impl AsRef<str>) -> Option<&str> {
        self.inner
            .get(&name.as_ref().to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Whether a header with this name is present.
    pub fn contains(&self, name: impl AsRef<str>) -> bool {
        self.inner.contains_key(&name.as_ref().to_ascii_lowercase())
    }

    /// Remove a header by name.
    pub fn remove(&mut self, name: impl AsRef<str>) -> Option<String> {
        self.inner.remove(&name.as_ref().to_ascii_lowercase())
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Key-wise merge: every entry of `other` is inserted over `self`.
    pub fn extend(&mut self, other: Headers) {
        for (name, value) in other.inner {
            self.inner.insert(name, value);
        }
    }
}

impl<N: AsRef<str>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// Progress callback: `(transferred_bytes, total_bytes_if_known)`.
pub type ProgressCallback = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Predicate deciding whether a numeric HTTP status counts as success.
pub type StatusValidator = Arc<dyn Fn(u16) -> bool + Send + Sync>;

/// Per-call request configuration.
///
/// Unset fields fall back to the instance defaults during
/// [`RequestConfig::merge`]; after the merge every recognized default is
/// filled in. Closures are stored behind `Arc`, so the config is cheap to
/// clone and a merge never mutates its inputs.
#[derive(Clone, Default)]
pub struct RequestConfig {
    /// Request path or absolute URL.
    pub url: Option<String>,
    /// HTTP method; defaults to GET.
    pub method: Option<Method>,
    /// Base URL joined with `url` when `url` is not absolute.
    pub base_url: Option<String>,
    /// Query parameters, serialized onto the final URL.
    pub params: BTreeMap<String, String>,
    /// Request body payload, run through the request transforms before send.
    pub body: Body,
    /// Request headers.
    pub headers: Headers,
    /// Timeout in milliseconds; `0` disables the timeout, unset means
    /// [`DEFAULT_TIMEOUT_MS`].
    pub timeout_ms: Option<u64>,
    /// How to interpret the response body.
    pub response_kind: Option<ResponseKind>,
    /// Cancellation signal; triggering it aborts the in-flight request.
    pub cancel: Option<CancellationToken>,
    /// Upload progress callback.
    pub on_upload_progress: Option<ProgressCallback>,
    /// Download progress callback, fired per received chunk.
    pub on_download_progress: Option<ProgressCallback>,
    /// Status validator; unset means `200..300`.
    pub validate_status: Option<StatusValidator>,
    /// Request body transforms, applied in order before send.
    pub request_transforms: Option<Vec<RequestTransform>>,
    /// Response body transforms, applied in order after receipt.
    pub response_transforms: Option<Vec<ResponseTransform>>,
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("base_url", &self.base_url)
            .field("params", &self.params)
            .field("body", &self.body)
            .field("headers", &self.headers)
            .field("timeout_ms", &self.timeout_ms)
            .field("response_kind", &self.response_kind)
            .finish_non_exhaustive()
    }
}

impl RequestConfig {
    /// Config targeting `url` with everything else unset.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Set the HTTP method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Add a query parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Add a request header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set the request body.
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Serialize `value` as the structured JSON request body.
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Result<Self, crate::GrabError> {
        self.body = Body::Json(serde_json::to_value(value)?);
        Ok(self)
    }

    /// Set the timeout in milliseconds; `0` disables the timeout.
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Set how the response body is interpreted.
    pub fn response_kind(mut self, kind: ResponseKind) -> Self {
        self.response_kind = Some(kind);
        self
    }

    /// Attach a cancellation token.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Set the status validator predicate.
    pub fn validate_status<F>(mut self, validator: F) -> Self
    where
        F: Fn(u16) -> bool + Send + Sync + 'static,
    {
        self.validate_status = Some(Arc::new(validator));
        self
    }

    /// Merge instance defaults with a per-call override and fill the
    /// recognized defaults.
    ///
    /// The merge is shallow: any field set in `overrides` replaces the
    /// default wholesale, except headers, which merge key-wise with the
    /// override winning on conflicting names. Afterwards the timeout,
    /// response kind, status validator and transform lists are filled if
    /// still unset. Always succeeds; a missing URL is only diagnosed at
    /// dispatch time, as a malformed-URL failure.
    pub fn merge(defaults: &RequestConfig, overrides: RequestConfig) -> RequestConfig {
        let mut headers = defaults.headers.clone();
        headers.extend(overrides.headers);

        let response_kind = overrides
            .response_kind
            .or(defaults.response_kind)
            .unwrap_or_default();

        let mut merged = RequestConfig {
            url: overrides.url.or_else(|| defaults.url.clone()),
            method: overrides.method.or(defaults.method),
            base_url: overrides.base_url.or_else(|| defaults.base_url.clone()),
            params: if overrides.params.is_empty() {
                defaults.params.clone()
            } else {
                overrides.params
            },
            body: if overrides.body.is_empty() {
                defaults.body.clone()
            } else {
                overrides.body
            },
            headers,
            timeout_ms: overrides.timeout_ms.or(defaults.timeout_ms),
            response_kind: Some(response_kind),
            cancel: overrides.cancel.or_else(|| defaults.cancel.clone()),
            on_upload_progress: overrides
                .on_upload_progress
                .or_else(|| defaults.on_upload_progress.clone()),
            on_download_progress: overrides
                .on_download_progress
                .or_else(|| defaults.on_download_progress.clone()),
            validate_status: overrides
                .validate_status
                .or_else(|| defaults.validate_status.clone()),
            request_transforms: overrides
                .request_transforms
                .or_else(|| defaults.request_transforms.clone()),
            response_transforms: overrides
                .response_transforms
                .or_else(|| defaults.response_transforms.clone()),
        };

        merged.timeout_ms = Some(merged.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS));
        merged.validate_status = Some(
            merged
                .validate_status
                .unwrap_or_else(|| Arc::new(|status| (200..300).contains(&status))),
        );
        merged.request_transforms = Some(
            merged
                .request_transforms
                .unwrap_or_else(|| vec![json_encode_stage()]),
        );
        merged.response_transforms = Some(merged.response_transforms.unwrap_or_else(|| {
            match response_kind {
                ResponseKind::Json => vec![json_decode_stage()],
                ResponseKind::Text | ResponseKind::Bytes => Vec::new(),
            }
        }));
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_lowercase_on_insert() {
        let mut headers = Headers::new();
        headers.insert("X-Custom-Header", "test");
        assert_eq!(headers.get("x-custom-header"), Some("test"));
        assert_eq!(headers.get("X-CUSTOM-HEADER"), Some("test"));
        assert!(headers.iter().all(|(name, _)| name
            .chars()
            .all(|c| !c.is_ascii_uppercase())));
    }

    #[test]
    fn test_headers_insert_if_absent() {
        let mut headers = Headers::new();
        headers.insert("Accept", "text/plain");
        headers.insert_if_absent("accept", "application/json");
        assert_eq!(headers.get("accept"), Some("text/plain"));

        headers.insert_if_absent("content-type", "application/json");
        assert_eq!(headers.get("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_method_round_trip() {
        for token in [
            "GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS", "HEAD", "CONNECT", "TRACE",
        ] {
            let method: Method = token.parse().expect("known method");
            assert_eq!(method.to_string(), token);
        }
        assert!("FETCH".parse::<Method>().is_err());
    }

    #[test]
    fn test_merge_header_union_with_override_precedence() {
        let defaults = RequestConfig::default()
            .header("Authorization", "Bearer default")
            .header("X-Shared", "from-defaults");
        let overrides = RequestConfig::new("/posts")
            .header("X-Shared", "from-call")
            .header("X-Call-Only", "yes");

        let merged = RequestConfig::merge(&defaults, overrides);
        assert_eq!(merged.headers.get("authorization"), Some("Bearer default"));
        assert_eq!(merged.headers.get("x-shared"), Some("from-call"));
        assert_eq!(merged.headers.get("x-call-only"), Some("yes"));
    }

    #[test]
    fn test_merge_fills_recognized_defaults() {
        let merged = RequestConfig::merge(&RequestConfig::default(), RequestConfig::new("/x"));
        assert_eq!(merged.timeout_ms, Some(DEFAULT_TIMEOUT_MS));
        assert_eq!(merged.response_kind, Some(ResponseKind::Json));

        let validator = merged.validate_status.expect("validator filled");
        assert!(validator(200));
        assert!(validator(299));
        assert!(!validator(300));
        assert!(!validator(199));

        assert_eq!(merged.request_transforms.expect("filled").len(), 1);
        assert_eq!(merged.response_transforms.expect("filled").len(), 1);
    }

    #[test]
    fn test_merge_override_replaces_wholesale() {
        let mut defaults = RequestConfig::new("/default");
        defaults.method = Some(Method::Get);
        defaults.timeout_ms = Some(5);
        defaults.params.insert("page".into(), "1".into());

        let overrides = RequestConfig::new("/call")
            .method(Method::Post)
            .timeout_ms(9)
            .param("q", "rust");

        let merged = RequestConfig::merge(&defaults, overrides);
        assert_eq!(merged.url.as_deref(), Some("/call"));
        assert_eq!(merged.method, Some(Method::Post));
        assert_eq!(merged.timeout_ms, Some(9));
        // params replace wholesale, not key-wise
        assert_eq!(merged.params.len(), 1);
        assert_eq!(merged.params.get("q").map(String::as_str), Some("rust"));
    }

    #[test]
    fn test_merge_keeps_defaults_when_override_unset() {
        let defaults = RequestConfig::new("/default")
            .base_url("https://api.example.com")
            .timeout_ms(1234);
        let merged = RequestConfig::merge(&defaults, RequestConfig::default());
        assert_eq!(merged.url.as_deref(), Some("/default"));
        assert_eq!(merged.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(merged.timeout_ms, Some(1234));
    }

    #[test]
    fn test_merge_no_response_decode_for_text_kind() {
        let merged = RequestConfig::merge(
            &RequestConfig::default(),
            RequestConfig::new("/x").response_kind(ResponseKind::Text),
        );
        assert!(merged.response_transforms.expect("filled").is_empty());
    }

    #[test]
    fn test_merge_does_not_mutate_defaults() {
        let defaults = RequestConfig::default().header("a", "1");
        let _ = RequestConfig::merge(&defaults, RequestConfig::new("/x").header("a", "2"));
        assert_eq!(defaults.headers.get("a"), Some("1"));
    }
}
