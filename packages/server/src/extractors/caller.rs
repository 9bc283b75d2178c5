use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use common::IdentityHash;

use crate::error::AppError;
use crate::state::AppState;

/// Proxy headers consulted, in order, when `trust_proxy_headers` is set.
const CLIENT_ADDRESS_HEADERS: [&str; 5] = [
    "x-client-ip",
    "x-forwarded-for",
    "cf-connecting-ip",
    "true-client-ip",
    "x-real-ip",
];

/// The pseudonymous identity of whoever sent the request.
///
/// Derived afresh on every request from the client address and the pepper;
/// there is no session. Add this as a handler parameter to scope the call.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub identity: IdentityHash,
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        let address = client_address(
            &parts.headers,
            peer,
            state.config.server.trust_proxy_headers,
        )
        .ok_or(AppError::AddressUnavailable)?;

        Ok(Caller {
            identity: state.hasher.hash(&address),
        })
    }
}

/// Resolve the client address as a string without port.
///
/// IPv4-mapped IPv6 peers are rendered as plain IPv4 so a client keeps one
/// identity whichever socket family accepted it.
pub fn client_address(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy_headers: bool,
) -> Option<String> {
    if trust_proxy_headers && let Some(ip) = address_from_headers(headers) {
        return Some(ip.to_canonical().to_string());
    }
    peer.map(|addr| addr.ip().to_canonical().to_string())
}

fn address_from_headers(headers: &HeaderMap) -> Option<IpAddr> {
    CLIENT_ADDRESS_HEADERS.iter().find_map(|name| {
        let value = headers.get(*name)?.to_str().ok()?;
        // X-Forwarded-For: client, proxy1, proxy2
        let first = value.split(',').next()?.trim();
        parse_ip(first)
    })
}

fn parse_ip(raw: &str) -> Option<IpAddr> {
    raw.parse::<IpAddr>()
        .ok()
        .or_else(|| raw.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
}
