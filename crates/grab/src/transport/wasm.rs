//! Event-driven transport for wasm32 (web-sys fetch)

use async_trait::async_trait;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::error::GrabError;
use crate::response::RawResponse;
use crate::transport::{PreparedRequest, Transport};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "fetch")]
    fn js_fetch(input: &web_sys::Request) -> js_sys::Promise;
}

/// Aborts the associated fetch when dropped.
///
/// The orchestrator cancels a request by dropping the execute future; this
/// guard turns that drop into an abort of the in-flight fetch. Aborting an
/// already settled fetch is a no-op.
struct AbortOnDrop(web_sys::AbortController);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Browser transport backed by the page's `fetch`.
#[derive(Debug, Clone, Default)]
pub struct WasmTransport;

impl WasmTransport {
    /// Create the fetch-based transport.
    pub fn new() -> Self {
        Self
    }
}

fn js_error(context: &str, value: JsValue) -> GrabError {
    GrabError::network(format!("{context}: {value:?}"))
}

#[async_trait(?Send)]
impl Transport for WasmTransport {
    async fn execute(&self, request: PreparedRequest) -> Result<RawResponse, GrabError> {
        let opts = web_sys::RequestInit::new();
        opts.set_method(request.method.as_str());

        let controller = web_sys::AbortController::new()
            .map_err(|e| js_error("failed to create abort controller", e))?;
        opts.set_signal(Some(&controller.signal()));
        let _abort_guard = AbortOnDrop(controller);

        let upload_len = request.body.as_ref().map(|b| b.len() as u64);
        if let Some(body) = &request.body {
            let bytes = js_sys::Uint8Array::from(body.as_slice());
            opts.set_body(&bytes.into());
        }

        let fetch_request = web_sys::Request::new_with_str_and_init(&request.url, &opts)
            .map_err(|e| GrabError::Url(format!("{}: {e:?}", request.url)))?;

        let header_map = fetch_request.headers();
        for (name, value) in request.headers.iter() {
            header_map
                .set(name, value)
                .map_err(|e| js_error("failed to set header", e))?;
        }

        let response_value = JsFuture::from(js_fetch(&fetch_request))
            .await
            .map_err(|e| js_error("fetch failed", e))?;

        if let (Some(callback), Some(len)) = (&request.on_upload_progress, upload_len) {
            callback(len, Some(len));
        }

        let response: web_sys::Response = response_value
            .dyn_into()
            .map_err(|_| GrabError::network("response is not a web_sys::Response"))?;

        let status = response.status();
        let status_text = response.status_text();

        let mut headers = crate::Headers::new();
        let entries = js_sys::try_iter(&response.headers())
            .map_err(|e| js_error("failed to iterate headers", e))?;
        if let Some(entries) = entries {
            for entry in entries {
                let entry = entry.map_err(|e| js_error("failed to read header", e))?;
                let pair: js_sys::Array = entry
                    .dyn_into()
                    .map_err(|_| GrabError::network("header entry is not an array"))?;
                let name = pair.get(0).as_string().unwrap_or_default();
                let value = pair.get(1).as_string().unwrap_or_default();
                headers.insert(name, value);
            }
        }

        let body_promise = response
            .array_buffer()
            .map_err(|e| js_error("failed to read body", e))?;
        let body_value = JsFuture::from(body_promise)
            .await
            .map_err(|e| js_error("failed to read body", e))?;
        let body = js_sys::Uint8Array::new(&body_value).to_vec();

        if let Some(callback) = &request.on_download_progress {
            callback(body.len() as u64, Some(body.len() as u64));
        }

        Ok(RawResponse {
            status,
            status_text,
            headers,
            body,
        })
    }
}
