//! Panic recovery middleware
//!
//! Outermost stage of the pipeline. A panic anywhere further in becomes a
//! 500 failure envelope instead of a dropped connection. The correlation
//! stage runs inside this one, so the id it assigns is handed back through
//! a [`CorrelationSlot`] placed in the request extensions. Stages that add
//! response headers record them in [`FaultHeaders`] before calling further
//! in, and a recovered 500 carries them too.

use std::{
    any::Any,
    future::Future,
    panic::AssertUnwindSafe,
    pin::Pin,
    sync::{Arc, OnceLock},
    task::{Context, Poll},
};

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue, header::IntoHeaderName},
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use parking_lot::Mutex;
use tower::{Layer, Service};
use tracing::error;
use uuid::Uuid;

use super::request_id::REQUEST_ID_HEADER;
use crate::error::ApiError;

/// Write-once cell through which the correlation stage reports its id
#[derive(Debug, Clone, Default)]
pub struct CorrelationSlot(Arc<OnceLock<Uuid>>);

impl CorrelationSlot {
    /// Record the request id; later calls are ignored
    pub fn fill(&self, request_id: Uuid) {
        let _ = self.0.set(request_id);
    }

    /// The recorded request id, if the correlation stage has run
    #[must_use]
    pub fn get(&self) -> Option<Uuid> {
        self.0.get().copied()
    }
}

/// Response headers that must survive a panic further in
#[derive(Debug, Clone, Default)]
pub struct FaultHeaders(Arc<Mutex<HeaderMap>>);

impl FaultHeaders {
    /// Record a header for the recovered response
    pub fn record<K: IntoHeaderName>(&self, name: K, value: HeaderValue) {
        self.0.lock().append(name, value);
    }

    /// Copy every recorded header into `headers`
    pub fn replay(&self, headers: &mut HeaderMap) {
        for (name, value) in self.0.lock().iter() {
            headers.append(name.clone(), value.clone());
        }
    }
}

/// Layer that converts panics into 500 responses
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoveryLayer;

impl RecoveryLayer {
    /// Create a new recovery layer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RecoveryLayer {
    type Service = Recovery<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Recovery { inner }
    }
}

/// Middleware service for panic recovery
#[derive(Debug, Clone)]
pub struct Recovery<S> {
    inner: S,
}

impl<S> Service<Request> for Recovery<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let slot = CorrelationSlot::default();
        let fault_headers = FaultHeaders::default();
        req.extensions_mut().insert(slot.clone());
        req.extensions_mut().insert(fault_headers.clone());
        let mut inner = self.inner.clone();

        Box::pin(async move {
            // `inner.call` runs inside the guarded future so that panics
            // raised while building the inner future are caught as well
            let outcome = AssertUnwindSafe(async move { inner.call(req).await })
                .catch_unwind()
                .await;

            match outcome {
                Ok(result) => result,
                Err(panic) => Ok(fault_response(
                    slot.get(),
                    &fault_headers,
                    panic.as_ref(),
                )),
            }
        })
    }
}

fn fault_response(
    request_id: Option<Uuid>,
    fault_headers: &FaultHeaders,
    panic: &(dyn Any + Send),
) -> Response {
    let detail = panic_message(panic);
    error!(
        request_id = ?request_id,
        panic = %detail,
        "Recovered from panic while handling request"
    );

    let mut response = ApiError::Internal(format!("panic: {detail}"))
        .reject(request_id)
        .into_response();

    fault_headers.replay(response.headers_mut());
    if let Some(value) = request_id.and_then(|id| HeaderValue::from_str(&id.to_string()).ok()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
