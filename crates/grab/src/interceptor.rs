//! Interceptor chains for outgoing configs and incoming responses

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use futures::future::BoxFuture;

use crate::config::RequestConfig;
use crate::error::GrabError;
use crate::response::Response;

/// An interceptor handler: receives the current value and returns the
/// (possibly modified) value, or fails the call. Handlers may be
/// asynchronous; the orchestrator awaits each one before the next runs.
pub type Handler<T> = Arc<dyn Fn(T) -> BoxFuture<'static, Result<T, GrabError>> + Send + Sync>;

struct Entry<T> {
    fulfilled: Option<Handler<T>>,
    // Stored for API parity; the orchestrator only drives the fulfilled side.
    #[allow(dead_code)]
    rejected: Option<Handler<T>>,
}

/// An ordered, ejectable chain of (fulfilled, rejected) handler pairs.
///
/// Handles are stable for the life of the chain: ejecting an entry leaves a
/// hole rather than shifting later registrations, and traversal skips the
/// holes in original registration order.
pub struct InterceptorChain<T> {
    entries: BTreeMap<usize, Entry<T>>,
    next_handle: usize,
}

impl<T> Default for InterceptorChain<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_handle: 0,
        }
    }
}

impl<T> fmt::Debug for InterceptorChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("len", &self.entries.len())
            .field("next_handle", &self.next_handle)
            .finish()
    }
}

impl<T: 'static> InterceptorChain<T> {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler pair and return its stable handle.
    pub fn use_(
        &mut self,
        fulfilled: Option<Handler<T>>,
        rejected: Option<Handler<T>>,
    ) -> usize {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.entries.insert(handle, Entry { fulfilled, rejected });
        handle
    }

    /// Append a synchronous fulfilled handler and return its handle.
    pub fn use_fn<F>(&mut self, fulfilled: F) -> usize
    where
        F: Fn(T) -> Result<T, GrabError> + Send + Sync + 'static,
        T: Send,
    {
        let fulfilled = Arc::new(fulfilled);
        self.use_(
            Some(Arc::new(move |value| {
                let fulfilled = fulfilled.clone();
                Box::pin(async move { fulfilled(value) })
            })),
            None,
        )
    }

    /// Clear the slot at `handle`. Other handles stay valid; an unknown or
    /// already-ejected handle is a no-op.
    pub fn eject(&mut self, handle: usize) {
        self.entries.remove(&handle);
    }

    /// Number of surviving (non-ejected) entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries survive.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot the fulfilled handlers in registration order.
    pub(crate) fn fulfilled_handlers(&self) -> Vec<Handler<T>> {
        self.entries
            .values()
            .filter_map(|entry| entry.fulfilled.clone())
            .collect()
    }
}

/// Shared handle to one interceptor chain, exposing `use`/`eject` on a
/// shared instance.
pub struct InterceptorSet<T> {
    inner: Arc<RwLock<InterceptorChain<T>>>,
}

impl<T> Clone for InterceptorSet<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for InterceptorSet<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(InterceptorChain::default())),
        }
    }
}

impl<T> fmt::Debug for InterceptorSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorSet").finish_non_exhaustive()
    }
}

impl<T: 'static> InterceptorSet<T> {
    /// Append a handler pair and return its stable handle.
    pub fn use_(&self, fulfilled: Option<Handler<T>>, rejected: Option<Handler<T>>) -> usize {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .use_(fulfilled, rejected)
    }

    /// Append a synchronous fulfilled handler and return its handle.
    pub fn use_fn<F>(&self, fulfilled: F) -> usize
    where
        F: Fn(T) -> Result<T, GrabError> + Send + Sync + 'static,
        T: Send,
    {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .use_fn(fulfilled)
    }

    /// Eject the entry registered at `handle`.
    pub fn eject(&self, handle: usize) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .eject(handle);
    }

    /// Snapshot the fulfilled handlers in registration order. The lock is
    /// released before any handler runs.
    pub(crate) fn fulfilled_handlers(&self) -> Vec<Handler<T>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .fulfilled_handlers()
    }
}

/// The two chains owned by an instance.
#[derive(Debug, Clone, Default)]
pub struct Interceptors {
    /// Runs against the merged config before the URL is built.
    pub request: InterceptorSet<RequestConfig>,
    /// Runs against the response after the transform pipeline.
    pub response: InterceptorSet<Response>,
}
