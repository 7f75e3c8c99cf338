//! Socket-stream transport for native hosts (reqwest over rustls)

use async_trait::async_trait;

use crate::config::Method;
use crate::error::GrabError;
use crate::response::RawResponse;
use crate::transport::{PreparedRequest, Transport};

/// Native transport backed by a shared `reqwest::Client`.
///
/// The response body is accumulated chunk by chunk so the download-progress
/// callback fires as bytes arrive. Timeouts and cancellation live in the
/// orchestrator; dropping the execute future aborts the connection.
#[derive(Debug, Clone, Default)]
pub struct NativeTransport {
    client: reqwest::Client,
}

impl NativeTransport {
    /// Create a transport with default client settings.
    pub fn new() -> Self {
        Self::default()
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Patch => reqwest::Method::PATCH,
        Method::Options => reqwest::Method::OPTIONS,
        Method::Head => reqwest::Method::HEAD,
        Method::Connect => reqwest::Method::CONNECT,
        Method::Trace => reqwest::Method::TRACE,
    }
}

#[async_trait]
impl Transport for NativeTransport {
    async fn execute(&self, request: PreparedRequest) -> Result<RawResponse, GrabError> {
        let url = url::Url::parse(&request.url)
            .map_err(|e| GrabError::Url(format!("{}: {e}", request.url)))?;

        let mut builder = self.client.request(to_reqwest_method(request.method), url);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }

        let upload_len = request.body.as_ref().map(|b| b.len() as u64);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GrabError::network(e.to_string()))?;

        if let (Some(callback), Some(len)) = (&request.on_upload_progress, upload_len) {
            callback(len, Some(len));
        }

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();

        // reqwest header names are already lower-case; Headers re-normalizes
        // anyway so the invariant holds regardless of backend.
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let total = response.content_length();
        let mut body = Vec::new();
        let mut received: u64 = 0;
        let mut response = response;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| GrabError::network(e.to_string()))?
        {
            received += chunk.len() as u64;
            body.extend_from_slice(&chunk);
            if let Some(callback) = &request.on_download_progress {
                callback(received, total);
            }
        }

        Ok(RawResponse {
            status: status.as_u16(),
            status_text,
            headers,
            body,
        })
    }
}
