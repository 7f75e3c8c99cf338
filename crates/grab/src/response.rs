//! Response envelope and body payload types

use serde::de::DeserializeOwned;

use crate::config::{Headers, RequestConfig, ResponseKind};
use crate::error::GrabError;

/// A request or response body payload.
///
/// Bodies move through the transform pipelines as values of this enum: a
/// structured [`Body::Json`] request payload is encoded to [`Body::Text`]
/// before send, and a textual response payload is decoded back to
/// [`Body::Json`] after receipt when it parses.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Body {
    /// No payload.
    #[default]
    Empty,
    /// Structured JSON payload.
    Json(serde_json::Value),
    /// Textual payload.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl Body {
    /// Whether there is no payload.
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }

    /// Borrow the payload as text, if textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Borrow the payload as a JSON value, if structured.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Deserialize the payload into `T`.
    ///
    /// Works on both structured payloads and not-yet-decoded text.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, GrabError> {
        match self {
            Body::Json(value) => Ok(serde_json::from_value(value.clone())?),
            Body::Text(text) => Ok(serde_json::from_str(text)?),
            Body::Bytes(bytes) => Ok(serde_json::from_slice(bytes)?),
            Body::Empty => Err(GrabError::Serialization("empty body".to_string())),
        }
    }

    /// Encoded bytes for the wire, or `None` when there is nothing to send.
    pub(crate) fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Body::Empty => None,
            Body::Json(value) => Some(value.to_string().into_bytes()),
            Body::Text(text) => Some(text.into_bytes()),
            Body::Bytes(bytes) => Some(bytes),
        }
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Json(value)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(bytes)
    }
}

/// What a transport backend hands back: status line, lower-cased headers
/// and the raw body bytes, before any transform runs.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// HTTP reason phrase, empty when the backend does not expose one.
    pub status_text: String,
    /// Response headers with lower-cased names.
    pub headers: Headers,
    /// Raw body bytes as received.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Interpret the raw body per the configured response kind.
    ///
    /// Invalid UTF-8 falls back to the raw bytes rather than failing; the
    /// JSON decode itself is left to the response transform pipeline.
    pub(crate) fn body_for(&self, kind: ResponseKind) -> Body {
        if self.body.is_empty() {
            return Body::Empty;
        }
        match kind {
            ResponseKind::Bytes => Body::Bytes(self.body.clone()),
            ResponseKind::Json | ResponseKind::Text => {
                match String::from_utf8(self.body.clone()) {
                    Ok(text) => Body::Text(text),
                    Err(err) => Body::Bytes(err.into_bytes()),
                }
            }
        }
    }

    /// Raw body decoded as text, lossily.
    pub(crate) fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A completed HTTP response after the transform pipeline ran.
#[derive(Debug, Clone)]
pub struct Response {
    /// Response body after the response transforms.
    pub data: Body,
    /// HTTP status code.
    pub status: u16,
    /// HTTP reason phrase.
    pub status_text: String,
    /// Response headers; names are always lower-cased.
    pub headers: Headers,
    /// Echo of the effective config used for this call.
    pub config: RequestConfig,
}

impl Response {
    /// Deserialize the response body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, GrabError> {
        self.data.json()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_body_json_accessors() {
        let body = Body::Json(json!({"id": 1}));
        assert_eq!(body.as_json(), Some(&json!({"id": 1})));
        assert_eq!(body.as_text(), None);

        #[derive(serde::Deserialize)]
        struct Post {
            id: u32,
        }
        let post: Post = body.json().expect("deserializes");
        assert_eq!(post.id, 1);
    }

    #[test]
    fn test_body_into_bytes() {
        assert_eq!(Body::Empty.into_bytes(), None);
        assert_eq!(
            Body::Text("hi".to_string()).into_bytes(),
            Some(b"hi".to_vec())
        );
        assert_eq!(
            Body::Json(json!({"a": 1})).into_bytes(),
            Some(br#"{"a":1}"#.to_vec())
        );
    }

    #[test]
    fn test_raw_response_body_for_kind() {
        let raw = RawResponse {
            status: 200,
            status_text: "OK".to_string(),
            headers: Headers::new(),
            body: br#"{"id":1}"#.to_vec(),
        };
        assert_eq!(
            raw.body_for(ResponseKind::Text),
            Body::Text(r#"{"id":1}"#.to_string())
        );
        assert_eq!(
            raw.body_for(ResponseKind::Bytes),
            Body::Bytes(br#"{"id":1}"#.to_vec())
        );

        let empty = RawResponse {
            status: 204,
            status_text: "No Content".to_string(),
            headers: Headers::new(),
            body: Vec::new(),
        };
        assert_eq!(empty.body_for(ResponseKind::Json), Body::Empty);
    }

    #[test]
    fn test_raw_response_invalid_utf8_falls_back_to_bytes() {
        let raw = RawResponse {
            status: 200,
            status_text: "OK".to_string(),
            headers: Headers::new(),
            body: vec![0xff, 0xfe],
        };
        assert_eq!(raw.body_for(ResponseKind::Json), Body::Bytes(vec![0xff, 0xfe]));
    }
}
