// Client address helpers shared by middleware and handlers

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, FromRequestParts, Request},
    http::{request::Parts, Extensions, HeaderMap},
};
use std::convert::Infallible;
use std::net::SocketAddr;

/// Request extension marking X-Forwarded-For / X-Real-IP as trustworthy
///
/// Installed by the router only when TRUST_PROXY_HEADERS is set. Without it
/// the peer address is the client address, so clients cannot pick their own
/// rate-limit key.
#[derive(Debug, Clone, Copy)]
pub struct TrustProxyHeaders;

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    // Try X-Forwarded-For header first (for proxied requests)
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            // Take the first IP in the chain
            if let Some(first_ip) = forwarded_str.split(',').next() {
                let first_ip = first_ip.trim();
                if !first_ip.is_empty() {
                    return Some(first_ip.to_string());
                }
            }
        }
    }

    // Try X-Real-IP header
    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            let ip_str = ip_str.trim();
            if !ip_str.is_empty() {
                return Some(ip_str.to_string());
            }
        }
    }

    None
}

/// Extract IP address from proxy headers (when trusted) or the peer address
pub fn extract_ip_address(
    headers: &HeaderMap,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
    trust_proxy_headers: bool,
) -> Option<String> {
    if trust_proxy_headers {
        if let Some(ip) = forwarded_ip(headers) {
            return Some(ip);
        }
    }

    // Fall back to connection info
    connect_info.map(|info| info.0.ip().to_string())
}

fn ip_from_parts(headers: &HeaderMap, extensions: &Extensions) -> String {
    extract_ip_address(
        headers,
        extensions.get::<ConnectInfo<SocketAddr>>(),
        extensions.get::<TrustProxyHeaders>().is_some(),
    )
    .unwrap_or_else(|| "unknown".to_string())
}

/// Client IP for a full request, `"unknown"` when it cannot be determined
pub fn client_ip(request: &Request) -> String {
    ip_from_parts(request.headers(), request.extensions())
}

/// Extractor form of [`client_ip`]
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(ip_from_parts(&parts.headers, &parts.extensions)))
    }
}

impl std::fmt::Display for ClientIp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
