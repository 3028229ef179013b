//! Client identity resolution
//!
//! Anonymous visitors are told apart by network address. Behind a proxy the
//! originating client is the leftmost entry of `X-Forwarded-For`; otherwise
//! the transport peer address is used.

use crate::errors::AppError;
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use std::net::SocketAddr;

pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Resolve the client address from request headers and the peer address.
///
/// Returns `None` only when neither source yields a value.
pub fn resolve_client_identity(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let forwarded = headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty());

    match forwarded {
        Some(first) => Some(first.to_string()),
        None => peer.map(|addr| addr.ip().to_string()),
    }
}

/// Identity of the requesting client, used as the rating key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(pub String);

impl ClientIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S> FromRequestParts<S> for ClientIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Also honours `MockConnectInfo` in tests
        let peer = ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|ConnectInfo(addr)| addr);

        resolve_client_identity(&parts.headers, peer)
            .map(ClientIdentity)
            .ok_or_else(|| AppError::Internal {
                message: "client address unavailable".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(forwarded: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_str(forwarded).unwrap());
        headers
    }

    fn peer() -> Option<SocketAddr> {
        Some("9.9.9.9:5000".parse().unwrap())
    }

    #[test]
    fn test_leftmost_forwarded_entry_wins() {
        assert_eq!(
            resolve_client_identity(&headers("1.2.3.4, 5.6.7.8"), peer()).as_deref(),
            Some("1.2.3.4")
        );
    }

    #[test]
    fn test_forwarded_entry_is_trimmed() {
        assert_eq!(
            resolve_client_identity(&headers("  10.0.0.1 ,10.0.0.2"), None).as_deref(),
            Some("10.0.0.1")
        );
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        assert_eq!(
            resolve_client_identity(&HeaderMap::new(), peer()).as_deref(),
            Some("9.9.9.9")
        );
    }

    #[test]
    fn test_empty_forwarded_entry_falls_back() {
        assert_eq!(
            resolve_client_identity(&headers(" , 5.6.7.8"), peer()).as_deref(),
            Some("9.9.9.9")
        );
    }

    #[test]
    fn test_no_source_is_none() {
        assert_eq!(resolve_client_identity(&HeaderMap::new(), None), None);
    }

    #[tokio::test]
    async fn test_extractor_reads_connect_info() {
        let (mut parts, _) = axum::http::Request::builder()
            .body(())
            .unwrap()
            .into_parts();
        parts.extensions.insert(ConnectInfo(peer().unwrap()));

        let identity = ClientIdentity::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(identity.as_str(), "9.9.9.9");
    }
}
