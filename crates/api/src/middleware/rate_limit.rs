//! Rate limiting middleware
//!
//! Implements rate limiting using `tower-governor`. Authenticated
//! requests are keyed by profile id so a manager behind a shared NAT
//! is not throttled by their neighbours; everything else falls back
//! to the client IP.

use axum::{extract::ConnectInfo, http::HeaderMap, http::Request};
use std::hash::Hash;
use std::net::{IpAddr, SocketAddr};
use tower_governor::{errors::GovernorError, key_extractor::KeyExtractor};
use uuid::Uuid;

// Target rates:
// - Authenticated API: 300 requests/minute = 1 request every 200ms
pub const API_PERIOD_MS: u64 = 200;
pub const API_BURST_SIZE: u32 = 300;

// - Public booking creation: 120 requests/minute = 1 request every 500ms
pub const PUBLIC_PERIOD_MS: u64 = 500;
pub const PUBLIC_BURST_SIZE: u32 = 50;

// - Telegram webhook: 600 requests/minute = 1 request every 100ms.
//   All updates arrive from Telegram's egress IPs, so the key is
//   effectively shared and the quota has to cover the whole bot.
pub const WEBHOOK_PERIOD_MS: u64 = 100;
pub const WEBHOOK_BURST_SIZE: u32 = 200;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RateLimitKey {
    Profile(Uuid),
    Ip(IpAddr),
}

/// Client IP as reported by proxy headers, if any
fn ip_from_headers(headers: &HeaderMap) -> Option<IpAddr> {
    // X-Forwarded-For first; the first entry is the client
    if let Some(value) = headers.get("x-forwarded-for").and_then(|h| h.to_str().ok())
        && let Some(client_ip) = value.split(',').next()
        && let Ok(ip) = client_ip.trim().parse::<IpAddr>()
    {
        return Some(ip);
    }

    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.trim().parse::<IpAddr>().ok())
}

#[derive(Clone)]
pub struct ProfileOrIpKeyExtractor;

impl KeyExtractor for ProfileOrIpKeyExtractor {
    type Key = RateLimitKey;

    fn extract<B>(&self, req: &Request<B>) -> Result<Self::Key, GovernorError> {
        // Auth middleware runs before the governor on protected routes
        // and leaves the profile id in the request extensions
        if let Some(profile_id) = req.extensions().get::<Uuid>() {
            return Ok(RateLimitKey::Profile(*profile_id));
        }

        if let Some(ip) = ip_from_headers(req.headers()) {
            return Ok(RateLimitKey::Ip(ip));
        }

        if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
            return Ok(RateLimitKey::Ip(addr.ip()));
        }

        Err(GovernorError::UnableToExtractKey)
    }
}
