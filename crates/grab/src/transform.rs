//! Request and response body transform pipelines

use std::sync::Arc;

use crate::config::Headers;
use crate::response::Body;

/// A request transform stage: `(body, headers) -> body`.
///
/// Stages may set headers directly; that is the one sanctioned mutation of
/// the effective config.
pub type RequestTransform = Arc<dyn Fn(Body, &mut Headers) -> Body + Send + Sync>;

/// A response transform stage: `(body) -> body`.
pub type ResponseTransform = Arc<dyn Fn(Body) -> Body + Send + Sync>;

/// Default request stage: serialize a structured body to JSON text and set
/// `content-type: application/json` only when the header is absent.
pub fn json_encode_stage() -> RequestTransform {
    Arc::new(|body, headers| match body {
        Body::Json(value) => {
            headers.insert_if_absent("content-type", "application/json");
            Body::Text(value.to_string())
        }
        other => other,
    })
}

/// Default response stage: attempt a JSON decode of textual bodies, keeping
/// the original text when it does not parse. Never errors; non-text input
/// passes through unchanged, so running the stage twice is a no-op.
pub fn json_decode_stage() -> ResponseTransform {
    Arc::new(|body| match body {
        Body::Text(text) => match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value) => Body::Json(value),
            Err(_) => Body::Text(text),
        },
        other => other,
    })
}

/// Run the request stages in list order, each stage feeding the next.
pub fn apply_request(transforms: &[RequestTransform], body: Body, headers: &mut Headers) -> Body {
    transforms
        .iter()
        .fold(body, |body, stage| stage(body, headers))
}

/// Run the response stages in list order, each stage feeding the next.
pub fn apply_response(transforms: &[ResponseTransform], body: Body) -> Body {
    transforms.iter().fold(body, |body, stage| stage(body))
}
