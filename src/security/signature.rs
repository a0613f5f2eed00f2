//! Request signature derivation for rate-limit bucketing.
//!
//! Authenticated clients are bucketed by user id (set upstream by the auth
//! layer); anonymous clients by a hash of IP and user-agent. The path is part
//! of the signature so separate endpoints fill separate buckets.

use axum::body::Body;
use axum::http::Request;
use sha2::{Digest, Sha256};
use std::net::SocketAddr;

/// Header populated by the authentication layer for logged-in clients.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Derive the rate-limit bucket key for a request.
pub fn request_signature(request: &Request<Body>, addr: &SocketAddr) -> String {
    let identity = match header_str(request, USER_ID_HEADER) {
        Some(user_id) if !user_id.is_empty() => user_id.to_string(),
        _ => anonymous_identity(&addr.ip().to_string(), user_agent(request)),
    };
    format!("{}|{}", identity, request.uri().path())
}

/// Hash of IP + user-agent for unauthenticated clients. Truncated hex is
/// plenty for bucketing and keeps log lines readable.
pub fn anonymous_identity(ip: &str, user_agent: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    hasher.update(b"|");
    hasher.update(user_agent.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..16])
}

/// User-agent header value, empty string when missing or non-ASCII.
pub fn user_agent(request: &Request<Body>) -> &str {
    header_str(request, "user-agent").unwrap_or("")
}

fn header_str<'a>(request: &'a Request<Body>, name: &str) -> Option<&'a str> {
    request.headers().get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(path: &str, headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri(format!("http://host{}", path));
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(Body::default()).unwrap()
    }

    #[test]
    fn test_authenticated_signature_uses_user_id() {
        let addr: SocketAddr = "10.0.0.1:5000".parse().unwrap();
        let request = req("/api/properties", &[("x-user-id", "42")]);
        assert_eq!(request_signature(&request, &addr), "42|/api/properties");
    }

    #[test]
    fn test_anonymous_signature_hashes_ip_and_agent() {
        let addr: SocketAddr = "10.0.0.1:5000".parse().unwrap();
        let a = request_signature(&req("/api/x", &[("user-agent", "curl/8")]), &addr);
        let b = request_signature(&req("/api/x", &[("user-agent", "curl/8")]), &addr);
        let c = request_signature(&req("/api/x", &[("user-agent", "wget/1")]), &addr);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.ends_with("|/api/x"));
    }

    #[test]
    fn test_same_identity_different_paths_bucket_separately() {
        let addr: SocketAddr = "10.0.0.1:5000".parse().unwrap();
        let a = request_signature(&req("/api/x", &[]), &addr);
        let b = request_signature(&req("/api/y", &[]), &addr);
        assert_ne!(a, b);
    }
}
