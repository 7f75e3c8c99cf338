//! Request orchestrator: instances, the functional facade and the
//! timeout/cancellation race

use std::sync::Arc;

use futures::future::{self, Either};
use futures::pin_mut;
use tracing::{debug, warn};

use crate::config::{Method, RequestConfig, ResponseKind, DEFAULT_TIMEOUT_MS};
use crate::error::GrabError;
use crate::interceptor::Interceptors;
use crate::response::{Body, RawResponse, Response};
use crate::transform::{apply_request, apply_response};
use crate::transport::{default_transport, PreparedRequest, Transport};
use crate::url::build_url;

#[cfg(not(target_arch = "wasm32"))]
async fn sleep_ms(ms: u64) {
    tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
}

#[cfg(target_arch = "wasm32")]
async fn sleep_ms(ms: u64) {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        if let Some(window) = web_sys::window() {
            let timeout = i32::try_from(ms).unwrap_or(i32::MAX);
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout);
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

/// A configured request instance.
///
/// Owns the default config, the two interceptor chains and the transport.
/// Instances are independent: [`Grab::create`] shares nothing with other
/// instances, and clones of one instance share its chains and transport.
#[derive(Clone)]
pub struct Grab {
    defaults: RequestConfig,
    /// Request and response interceptor chains.
    pub interceptors: Interceptors,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Grab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grab")
            .field("defaults", &self.defaults)
            .field("interceptors", &self.interceptors)
            .finish_non_exhaustive()
    }
}

impl Default for Grab {
    fn default() -> Self {
        Self::new()
    }
}

impl Grab {
    /// Instance with empty defaults and the target's default transport.
    pub fn new() -> Self {
        Self::create(RequestConfig::default())
    }

    /// Independently configured instance; `defaults` merge under every
    /// per-call config.
    pub fn create(defaults: RequestConfig) -> Self {
        Self::with_transport(defaults, default_transport())
    }

    /// Instance with an injected transport backend.
    pub fn with_transport(defaults: RequestConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            defaults,
            interceptors: Interceptors::default(),
            transport,
        }
    }

    /// Execute one request.
    ///
    /// Control flow: merge config, run the request interceptor chain, build
    /// the URL, encode the body through the request transforms, dispatch
    /// racing transport completion against timeout and cancellation, then
    /// decode through the response transforms and run the response
    /// interceptor chain. Failures reject directly, bypassing transforms and
    /// interceptors.
    pub async fn request(&self, config: RequestConfig) -> Result<Response, GrabError> {
        let mut config = RequestConfig::merge(&self.defaults, config);

        for handler in self.interceptors.request.fulfilled_handlers() {
            config = handler(config).await?;
        }

        let url = match config.url.as_deref() {
            Some(path) => build_url(config.base_url.as_deref(), path, &config.params),
            None => return Err(GrabError::Url("request URL missing".to_string())),
        };

        let mut headers = config.headers.clone();
        let body = config.body.clone();
        let transforms = config.request_transforms.clone().unwrap_or_default();
        let body = apply_request(&transforms, body, &mut headers);
        headers.insert_if_absent("accept", "application/json");

        let method = config.method.unwrap_or_default();
        let prepared = PreparedRequest {
            method,
            url: url.clone(),
            headers,
            body: body.into_bytes(),
            on_upload_progress: config.on_upload_progress.clone(),
            on_download_progress: config.on_download_progress.clone(),
        };

        debug!(method = %method, url = %url, "dispatching request");
        let raw = self
            .dispatch(prepared, &config)
            .await
            .map_err(|e| e.with_config(&config))?;

        let accepted = config
            .validate_status
            .as_ref()
            .map(|validator| validator(raw.status))
            .unwrap_or_else(|| (200..300).contains(&raw.status));
        if !accepted {
            warn!(status = raw.status, url = %url, "status rejected by validator");
            return Err(GrabError::Status {
                status: raw.status,
                response: Body::Text(raw.text_lossy()),
                config: Box::new(config),
            });
        }

        let kind = config.response_kind.unwrap_or_default();
        let transforms = config.response_transforms.clone().unwrap_or_default();
        let data = apply_response(&transforms, raw.body_for(kind));

        let mut response = Response {
            data,
            status: raw.status,
            status_text: raw.status_text,
            headers: raw.headers,
            config,
        };

        for handler in self.interceptors.response.fulfilled_handlers() {
            response = handler(response).await?;
        }

        debug!(status = response.status, "request completed");
        Ok(response)
    }

    /// First-settled-wins race between transport completion, timeout elapse
    /// and the cancellation signal. Losing branches are dropped, which both
    /// aborts an in-flight transport and discards a pending timer, so
    /// nothing fires after the call settles.
    async fn dispatch(
        &self,
        prepared: PreparedRequest,
        config: &RequestConfig,
    ) -> Result<RawResponse, GrabError> {
        let timeout_ms = config.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
        let cancel = config.cancel.clone();

        let transport = self.transport.execute(prepared);
        let cancelled = async {
            match &cancel {
                Some(token) => token.cancelled().await,
                None => future::pending().await,
            }
        };
        let timer = async {
            if timeout_ms > 0 {
                sleep_ms(timeout_ms).await;
            } else {
                future::pending::<()>().await;
            }
        };
        pin_mut!(transport, cancelled, timer);

        match future::select(transport, future::select(cancelled, timer)).await {
            Either::Left((result, _)) => result,
            Either::Right((Either::Left(_), _)) => Err(GrabError::Aborted),
            Either::Right((Either::Right(_), _)) => Err(GrabError::Timeout { timeout_ms }),
        }
    }

    /// GET shortcut.
    pub async fn get(&self, url: impl Into<String>) -> Result<Response, GrabError> {
        self.request(RequestConfig::new(url).method(Method::Get))
            .await
    }

    /// POST shortcut with a request body.
    pub async fn post(
        &self,
        url: impl Into<String>,
        body: impl Into<Body>,
    ) -> Result<Response, GrabError> {
        self.request(RequestConfig::new(url).method(Method::Post).body(body))
            .await
    }

    /// PUT shortcut with a request body.
    pub async fn put(
        &self,
        url: impl Into<String>,
        body: impl Into<Body>,
    ) -> Result<Response, GrabError> {
        self.request(RequestConfig::new(url).method(Method::Put).body(body))
            .await
    }

    /// DELETE shortcut.
    pub async fn delete(&self, url: impl Into<String>) -> Result<Response, GrabError> {
        self.request(RequestConfig::new(url).method(Method::Delete))
            .await
    }

    /// PATCH shortcut with a request body.
    pub async fn patch(
        &self,
        url: impl Into<String>,
        body: impl Into<Body>,
    ) -> Result<Response, GrabError> {
        self.request(RequestConfig::new(url).method(Method::Patch).body(body))
            .await
    }

    /// HEAD shortcut.
    pub async fn head(&self, url: impl Into<String>) -> Result<Response, GrabError> {
        self.request(RequestConfig::new(url).method(Method::Head))
            .await
    }

    /// OPTIONS shortcut.
    pub async fn options(&self, url: impl Into<String>) -> Result<Response, GrabError> {
        self.request(RequestConfig::new(url).method(Method::Options))
            .await
    }
}

/// Functional form: execute one request and resolve with the decoded body.
///
/// A convenience over a fresh default instance; instances created with
/// [`Grab::create`] are never affected by it.
pub async fn grab(method: Method, config: RequestConfig) -> Result<Body, GrabError> {
    let response = Grab::new().request(config.method(method)).await?;
    Ok(response.data)
}
