//! Response decoration: security and CORS headers.
//!
//! # Responsibilities
//! - Attach the standard security/versioning headers to every response
//! - Attach CORS headers; short-circuit OPTIONS preflights with 200
//!
//! # Design Decisions
//! - Bound at dispatch, applied on the way out, so even 429/400 responses
//!   produced by inner stages carry the full header set.
//! - Preflights never reach the rate limiter or sanitizer.

use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::observability::metrics;

/// API version marker attached to every response.
pub const API_VERSION: &str = "1.0";

/// Middleware: OPTIONS short-circuit plus outbound header decoration.
pub async fn response_decorator_middleware(request: Request<Body>, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::OK;
        apply_standard_headers(response.headers_mut());
        metrics::record_request("OPTIONS", StatusCode::OK.as_u16());
        return response;
    }

    let method = request.method().to_string();
    let mut response = next.run(request).await;
    apply_standard_headers(response.headers_mut());
    metrics::record_request(&method, response.status().as_u16());
    response
}

/// Attach the security, versioning, and CORS header set.
pub fn apply_standard_headers(headers: &mut HeaderMap) {
    headers.insert("x-api-version", HeaderValue::from_static(API_VERSION));
    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("x-xss-protection", HeaderValue::from_static("1; mode=block"));

    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("POST,GET,OPTIONS,PUT,DELETE"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("Content-Type, Authorization, X-Auth-Token, X-Requested-With"),
    );
    headers.insert(
        "access-control-allow-credentials",
        HeaderValue::from_static("true"),
    );
    headers.insert("access-control-max-age", HeaderValue::from_static("86400"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_header_set_applied() {
        let mut headers = HeaderMap::new();
        apply_standard_headers(&mut headers);

        assert_eq!(headers["x-api-version"], API_VERSION);
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-max-age"], "86400");
        assert!(headers["access-control-allow-headers"]
            .to_str()
            .unwrap()
            .contains("X-Auth-Token"));
    }
}
