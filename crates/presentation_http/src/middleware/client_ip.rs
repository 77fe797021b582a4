//! Client identification
//!
//! The client is identified by the peer address of the connection. The
//! `X-Forwarded-For` header is honoured only when the peer is a configured
//! trusted proxy, or when no peer address is available at all (e.g. when
//! the router is driven in-process).

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request},
    http::{Extensions, HeaderMap},
};

/// Header carrying the original client address behind a proxy
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Resolves the client IP for a request
#[derive(Debug, Clone, Default)]
pub struct ClientIpResolver {
    trusted_proxies: Vec<IpAddr>,
}

impl ClientIpResolver {
    /// Create a resolver trusting the given proxy addresses
    #[must_use]
    pub fn new(trusted_proxies: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            trusted_proxies: trusted_proxies.into_iter().collect(),
        }
    }

    /// Resolve the client IP of a request
    #[must_use]
    pub fn resolve(&self, req: &Request) -> IpAddr {
        self.resolve_from(req.extensions(), req.headers())
    }

    /// Resolve the client IP from request extensions and headers
    #[must_use]
    pub fn resolve_from(&self, extensions: &Extensions, headers: &HeaderMap) -> IpAddr {
        let peer = extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        match peer {
            Some(peer) if self.trusted_proxies.contains(&peer) => {
                forwarded_for(headers).unwrap_or(peer)
            },
            Some(peer) => peer,
            None => forwarded_for(headers).unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST)),
        }
    }
}

/// First parseable address of the `X-Forwarded-For` chain
fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse().ok())
}
