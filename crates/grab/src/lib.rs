//! Lightweight HTTP request library with a unified call surface across
//! native and wasm32 hosts.
//!
//! One request orchestrator drives both environments: a per-call config is
//! merged with instance defaults, threaded through the request interceptor
//! chain and transform pipeline, dispatched over the target's transport
//! backend, and the response is decoded and threaded back through the
//! response pipeline — all raced against the configured timeout and an
//! optional cancellation signal.
//!
//! # Example
//!
//! ```no_run
//! use grab::{Grab, RequestConfig};
//!
//! async fn example() -> Result<(), grab::GrabError> {
//!     let client = Grab::create(RequestConfig::default().base_url("https://api.example.com"));
//!     client.interceptors.request.use_fn(|config| {
//!         Ok(config.header("X-Custom-Header", "test"))
//!     });
//!
//!     let response = client.get("/posts/1").await?;
//!     println!("status {}: {:?}", response.status, response.data.as_json());
//!     Ok(())
//! }
//! ```
//!
//! The legacy functional form is also supported:
//!
//! ```no_run
//! use grab::{grab, Method, RequestConfig};
//!
//! async fn example() -> Result<(), grab::GrabError> {
//!     let body = grab(Method::Get, RequestConfig::new("https://api.example.com/posts/1")).await?;
//!     println!("{:?}", body.as_json());
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod interceptor;
mod response;
mod transform;
mod transport;
mod url;

pub use client::{grab, Grab};
pub use config::{
    Headers, Method, ProgressCallback, RequestConfig, ResponseKind, StatusValidator,
    DEFAULT_TIMEOUT_MS,
};
pub use error::{is_cancel, ErrorCode, GrabError};
pub use interceptor::{Handler, InterceptorChain, InterceptorSet, Interceptors};
pub use response::{Body, RawResponse, Response};
pub use tokio_util::sync::CancellationToken;
pub use transform::{
    apply_request, apply_response, json_decode_stage, json_encode_stage, RequestTransform,
    ResponseTransform,
};
#[cfg(not(target_arch = "wasm32"))]
pub use transport::NativeTransport;
#[cfg(target_arch = "wasm32")]
pub use transport::WasmTransport;
pub use transport::{PreparedRequest, Transport};
pub use crate::url::build_url;
