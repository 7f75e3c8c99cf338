//! Transport backends
//!
//! One [`Transport`] abstraction with two implementations: a socket-stream
//! variant for native hosts and a fetch-based variant for wasm32. The
//! concrete backend is selected per target at instance construction, and can
//! be injected for tests.

use std::fmt;
use std::sync::Arc;

use crate::config::{Headers, Method, ProgressCallback};
use crate::error::GrabError;
use crate::response::RawResponse;

#[cfg(not(target_arch = "wasm32"))]
mod native;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(not(target_arch = "wasm32"))]
pub use native::NativeTransport;
#[cfg(target_arch = "wasm32")]
pub use wasm::WasmTransport;

/// A fully prepared request: final URL, merged headers and the already
/// transformed body bytes.
pub struct PreparedRequest {
    /// HTTP method.
    pub method: Method,
    /// Final URL with query string appended.
    pub url: String,
    /// Request headers, including the defaulted `accept` header.
    pub headers: Headers,
    /// Encoded body bytes, `None` when there is nothing to send.
    pub body: Option<Vec<u8>>,
    /// Upload progress callback.
    pub on_upload_progress: Option<ProgressCallback>,
    /// Download progress callback, fired per received chunk.
    pub on_download_progress: Option<ProgressCallback>,
}

impl fmt::Debug for PreparedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}

/// Backend responsible for actually sending bytes and receiving a response
/// for one call.
///
/// Dropping the returned future aborts the in-flight request; the
/// orchestrator relies on that for its timeout/cancellation race.
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
pub trait Transport: Send + Sync {
    /// Send one request and collect the complete raw response.
    async fn execute(&self, request: PreparedRequest) -> Result<RawResponse, GrabError>;
}

/// Backend for the current target.
pub(crate) fn default_transport() -> Arc<dyn Transport> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        Arc::new(NativeTransport::new())
    }
    #[cfg(target_arch = "wasm32")]
    {
        Arc::new(WasmTransport::new())
    }
}
