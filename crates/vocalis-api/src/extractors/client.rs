//! Client address and user-agent extraction.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap, header};

/// Address reported when nothing identifies the client.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Resolves the client address: first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then the TCP peer, then [`UNKNOWN_CLIENT`].
///
/// Header values that are not a bare IP address are ignored, so the result
/// is always a normalized address or [`UNKNOWN_CLIENT`].
pub fn client_address(headers: &HeaderMap, extensions: &Extensions) -> String {
    let forwarded = header_ip(headers, "x-forwarded-for", |v| v.split(',').next());
    if let Some(address) = forwarded {
        return address.to_string();
    }

    if let Some(address) = header_ip(headers, "x-real-ip", Some) {
        return address.to_string();
    }

    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(peer)| peer.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn header_ip<'a>(
    headers: &'a HeaderMap,
    name: &str,
    pick: impl FnOnce(&'a str) -> Option<&'a str>,
) -> Option<IpAddr> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(pick)
        .and_then(|v| v.trim().parse().ok())
}

/// Where a request came from.
#[derive(Debug, Clone)]
pub struct ClientInfo {
    /// Resolved client address.
    pub address: String,
    /// `User-Agent` header, when present.
    pub user_agent: Option<String>,
}

impl<S: Send + Sync> FromRequestParts<S> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            address: client_address(&parts.headers, &parts.extensions),
            user_agent: parts
                .headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(String::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn forwarded_for_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_address(&headers, &Extensions::new()), "203.0.113.9");
    }

    #[test]
    fn falls_back_through_real_ip_and_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_address(&headers, &Extensions::new()), "198.51.100.2");

        let mut extensions = Extensions::new();
        extensions.insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 40000))));
        assert_eq!(client_address(&HeaderMap::new(), &extensions), "192.0.2.1");

        assert_eq!(client_address(&HeaderMap::new(), &Extensions::new()), UNKNOWN_CLIENT);
    }

    #[test]
    fn non_ip_header_values_are_ignored() {
        let long = "a".repeat(500);
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_str(&long).unwrap());
        headers.insert("x-real-ip", HeaderValue::from_static("not-an-ip"));
        assert_eq!(client_address(&headers, &Extensions::new()), UNKNOWN_CLIENT);

        headers.insert("x-real-ip", HeaderValue::from_static(" 2001:DB8::1 "));
        assert_eq!(client_address(&headers, &Extensions::new()), "2001:db8::1");
    }
}
