//! Request context for propagating request metadata and identity
//!
//! A `RequestContext` is created once per inbound request by the HTTP
//! pipeline and handed from stage to stage. Stages never mutate it in
//! place: a stage that learns something new (e.g. the caller's role)
//! produces an updated copy for the stages after it.
//!
//! # Examples
//!
//! ```
//! use std::net::{IpAddr, Ipv4Addr};
//!
//! use application::RequestContext;
//! use domain::Role;
//! use uuid::Uuid;
//!
//! let ctx = RequestContext::new(Uuid::new_v4(), IpAddr::V4(Ipv4Addr::LOCALHOST));
//! assert!(ctx.role().is_none());
//!
//! let ctx = ctx.with_role(Role::admin());
//! assert!(ctx.is_admin());
//! ```

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use domain::Role;
use uuid::Uuid;

/// Context for a single request, carrying correlation and identity
///
/// - `request_id`: correlation id, fixed for the lifetime of the request
/// - `client_ip`: client identifier used for rate limiting and logging
/// - `role`: present only after successful authentication
/// - `received_at`: when the request entered the pipeline
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Uuid,
    client_ip: IpAddr,
    role: Option<Role>,
    received_at: DateTime<Utc>,
}

impl RequestContext {
    /// Create an unauthenticated context for a new request
    #[must_use]
    pub fn new(request_id: Uuid, client_ip: IpAddr) -> Self {
        Self {
            request_id,
            client_ip,
            role: None,
            received_at: Utc::now(),
        }
    }

    /// Return a copy of this context carrying the authenticated role
    #[must_use]
    pub fn with_role(self, role: Role) -> Self {
        Self {
            role: Some(role),
            ..self
        }
    }

    /// Get the correlation id
    #[must_use]
    pub const fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Get the client identifier
    #[must_use]
    pub const fn client_ip(&self) -> IpAddr {
        self.client_ip
    }

    /// Get the authenticated role, if any
    #[must_use]
    pub const fn role(&self) -> Option<&Role> {
        self.role.as_ref()
    }

    /// Check whether the caller authenticated with the admin role
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.as_ref().is_some_and(Role::is_admin)
    }

    /// Get the timestamp when the request was received
    #[must_use]
    pub const fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}
