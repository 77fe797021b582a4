//! API key authentication middleware
//!
//! Validates the `X-API-Key` header against the configured key table and
//! records the granted role in the request context. Every configured key
//! is compared in constant time, so response timing does not reveal how
//! much of a presented key matched.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use application::RequestContext;
use axum::{
    extract::Request,
    response::{IntoResponse, Response},
};
use domain::Role;
use infrastructure::ApiKeyEntry;
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use tower::{Layer, Service};
use tracing::{debug, warn};

use super::client_ip::ClientIpResolver;
use crate::error::ApiError;

/// Header carrying the pre-shared key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Rejection message for absent or unknown keys
pub const INVALID_KEY_MESSAGE: &str = "invalid or missing API key";

#[derive(Clone, Debug)]
struct KeyEntry {
    key: SecretString,
    role: Role,
}

/// Table of accepted API keys and the roles they grant
#[derive(Clone, Debug, Default)]
pub struct ApiKeyTable {
    entries: Vec<KeyEntry>,
}

impl ApiKeyTable {
    /// Create an empty table; every request is rejected
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from configuration entries
    #[must_use]
    pub fn from_entries(entries: &[ApiKeyEntry]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|entry| KeyEntry {
                    key: entry.key.clone(),
                    role: Role::new(entry.role.clone()),
                })
                .collect(),
        }
    }

    /// Add a key granting the given role
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>, role: Role) -> Self {
        self.entries.push(KeyEntry {
            key: SecretString::from(key.into()),
            role,
        });
        self
    }

    /// Check if the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a presented key to its role
    ///
    /// All entries are compared regardless of where a match occurs.
    #[must_use]
    pub fn resolve(&self, presented: &str) -> Option<Role> {
        let presented = presented.as_bytes();
        let mut granted = None;

        for entry in &self.entries {
            let matches: bool = entry.key.expose_secret().as_bytes().ct_eq(presented).into();
            if matches && granted.is_none() {
                granted = Some(entry.role.clone());
            }
        }

        granted
    }
}

/// Layer that applies API key authentication
#[derive(Clone, Debug, Default)]
pub struct ApiKeyAuthLayer {
    table: Arc<ApiKeyTable>,
}

impl ApiKeyAuthLayer {
    /// Create a new API key auth layer
    #[must_use]
    pub fn new(table: ApiKeyTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }
}

impl<S> Layer<S> for ApiKeyAuthLayer {
    type Service = ApiKeyAuth<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ApiKeyAuth {
            inner,
            table: Arc::clone(&self.table),
        }
    }
}

/// Middleware service for API key authentication
#[derive(Clone, Debug)]
pub struct ApiKeyAuth<S> {
    inner: S,
    table: Arc<ApiKeyTable>,
}

impl<S> Service<Request> for ApiKeyAuth<S>
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
        let role = req
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|key| self.table.resolve(key));

        let ctx = req.extensions_mut().remove::<RequestContext>();

        let Some(role) = role else {
            let request_id = ctx.as_ref().map(RequestContext::request_id);
            warn!(
                request_id = ?request_id,
                path = %req.uri().path(),
                "Rejected request with invalid or missing API key"
            );
            let rejection = ApiError::Unauthorized(INVALID_KEY_MESSAGE.to_string())
                .reject(request_id);
            return Box::pin(async move { Ok(rejection.into_response()) });
        };

        debug!(role = %role, "API key accepted");
        let ctx = ctx
            .unwrap_or_else(|| {
                let client_ip = ClientIpResolver::default().resolve(&req);
                RequestContext::new(uuid::Uuid::new_v4(), client_ip)
            })
            .with_role(role);
        req.extensions_mut().insert(ctx);

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(req).await })
    }
}
