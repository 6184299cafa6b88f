//! Client identity derivation for admission.
//!
//! Forwarded-address headers are client-supplied and trivially spoofable.
//! They are only authoritative when the request arrives through a proxy we
//! know about, which is what `IdentityPolicy::TrustedProxies` expresses.

use super::types::UNKNOWN_CLIENT;

use axum::http::HeaderMap;
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};

pub const FORWARDED_FOR: &str = "x-forwarded-for";
pub const REAL_IP: &str = "x-real-ip";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityPolicy {
    /// Honor forwarded-address headers from any peer.
    TrustForwardedHeaders,
    /// Honor forwarded-address headers only from these peers.
    TrustedProxies(HashSet<IpAddr>),
}

impl IdentityPolicy {
    pub fn from_proxies(proxies: Vec<IpAddr>) -> Self {
        if proxies.is_empty() {
            Self::TrustForwardedHeaders
        } else {
            Self::TrustedProxies(proxies.into_iter().collect())
        }
    }

    fn trusts(&self, peer: Option<SocketAddr>) -> bool {
        match self {
            Self::TrustForwardedHeaders => true,
            Self::TrustedProxies(proxies) => {
                peer.is_some_and(|addr| proxies.contains(&addr.ip()))
            }
        }
    }
}

/// Derives the rate-limit identity for a request.
///
/// Order: first entry of `X-Forwarded-For`, then `X-Real-IP` (both only when
/// the policy trusts the peer), then the socket peer address, then the shared
/// `"unknown"` bucket.
pub fn client_identity(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    policy: &IdentityPolicy,
) -> String {
    if policy.trusts(peer) {
        if let Some(forwarded) = header_str(headers, FORWARDED_FOR) {
            if let Some(first) = forwarded.split(',').map(str::trim).find(|s| !s.is_empty()) {
                return first.to_string();
            }
        }

        if let Some(real_ip) = header_str(headers, REAL_IP) {
            let real_ip = real_ip.trim();
            if !real_ip.is_empty() {
                return real_ip.to_string();
            }
        }
    }

    match peer {
        Some(addr) => addr.ip().to_string(),
        None => UNKNOWN_CLIENT.to_string(),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
