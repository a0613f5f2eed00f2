//! Content sanitization and attack-signature inspection.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → allow-list check (exempt paths skip everything)
//!     → recursive string cleaning (NUL, control chars, trim, truncate)
//!     → whole-payload signature scan (SQLi, XSS, traversal, command injection)
//!     → request continues with the sanitized body
//! ```
//!
//! # Design Decisions
//! - The 10,000-character truncation runs before the regex scan, bounding
//!   pattern evaluation time against adversarial input.
//! - Rejections return a generic message; the matched family is only logged.
//! - Routes containing `home-stats` skip the signature scan even off the
//!   allow-list: admin-entered labels legitimately carry punctuation that
//!   collides with the patterns.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::{self, Body},
    extract::{ConnectInfo, State},
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::config::SanitizerConfig;
use crate::http::response::PipelineError;
use crate::observability::metrics;
use crate::security::signature;

/// Hard ceiling on any single string leaf after sanitization.
pub const MAX_STRING_CHARS: usize = 10_000;

static SQL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\bunion\b.{0,40}\bselect\b").unwrap(),
        Regex::new(r"\b1\s*=\s*1\b").unwrap(),
        Regex::new(r#"(?i)['"]\s*(?:or|and)\s+['"]"#).unwrap(),
        Regex::new(r"(?i)\b(?:sleep|benchmark)\s*\(").unwrap(),
        Regex::new(r"(?i)\bwaitfor\s+delay\b").unwrap(),
    ]
});

static XSS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)<\s*script\b").unwrap(),
        Regex::new(r"(?i)javascript\s*:").unwrap(),
        Regex::new(r"(?i)\bon\w+\s*=").unwrap(),
        Regex::new(r"(?i)<\s*(?:iframe|object|embed)\b").unwrap(),
    ]
});

static TRAVERSAL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\.\./|\.\.\\").unwrap(),
        Regex::new(r"(?i)%2e%2e(?:%2f|%5c)").unwrap(),
    ]
});

static COMMAND_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"[;|`]|\$\(").unwrap(),
        Regex::new(r"(?i)(?:^|\s)(?:wget|curl|bash|sh|nc|netcat|powershell)\s").unwrap(),
    ]
});

/// Path allow-list deciding which routes bypass the sanitizer entirely.
#[derive(Debug, Clone)]
pub struct SanitizePolicy {
    exempt_paths: Vec<String>,
    exempt_prefixes: Vec<String>,
}

impl SanitizePolicy {
    pub fn new(config: &SanitizerConfig) -> Self {
        Self {
            exempt_paths: config.exempt_paths.clone(),
            exempt_prefixes: config.exempt_prefixes.clone(),
        }
    }

    /// Exempt routes skip both sanitization and inspection. A prefix only
    /// matches at a segment boundary, so `/api/properties` does not exempt
    /// `/api/properties-export`.
    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths.iter().any(|p| p == path)
            || self.exempt_prefixes.iter().any(|p| {
                path.strip_prefix(p.as_str())
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
            })
    }
}

/// Clean one string leaf: drop NUL bytes, drop C0/C1 controls except tab and
/// newline, trim outer whitespace, truncate to [`MAX_STRING_CHARS`].
///
/// Truncation is a plain cut; it does not re-trim the boundary.
pub fn clean_string(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|&c| {
            c != '\0' && (c == '\t' || c == '\n' || !(c.is_control() || ('\u{80}'..='\u{9f}').contains(&c)))
        })
        .collect();
    let trimmed = stripped.trim();
    trimmed.chars().take(MAX_STRING_CHARS).collect()
}

/// Depth-first sanitization of a JSON tree. Keys are preserved; only string
/// leaves change, and only ever by shortening.
pub fn sanitize_value(value: &mut Value) {
    match value {
        Value::String(s) => *s = clean_string(s),
        Value::Array(items) => {
            for item in items {
                sanitize_value(item);
            }
        }
        Value::Object(map) => {
            for (_, item) in map.iter_mut() {
                sanitize_value(item);
            }
        }
        _ => {}
    }
}

/// Scan serialized input against the four signature families. Returns the
/// matching family name for logging; callers must never echo it to clients.
pub fn detect_attack_signature(serialized: &str) -> Option<&'static str> {
    let families: [(&'static str, &Lazy<Vec<Regex>>); 4] = [
        ("sql_injection", &SQL_PATTERNS),
        ("xss", &XSS_PATTERNS),
        ("path_traversal", &TRAVERSAL_PATTERNS),
        ("command_injection", &COMMAND_PATTERNS),
    ];
    for (family, patterns) in families {
        if patterns.iter().any(|p| p.is_match(serialized)) {
            return Some(family);
        }
    }
    None
}

/// State for the sanitizer middleware.
pub struct SanitizerState {
    pub policy: SanitizePolicy,
    pub max_json_body_bytes: usize,
}

/// Middleware: sanitize the JSON body and reject suspicious payloads.
///
/// The input tree is the JSON body; multipart bodies are field-level data
/// that the upload guard and media validator own, so only the query string
/// is inspected for them.
pub async fn sanitize_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<SanitizerState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if state.policy.is_exempt(&path) {
        return next.run(request).await;
    }

    let inspect = !path.contains("home-stats");
    let query = request.uri().query().unwrap_or("").to_string();
    let user_agent = signature::user_agent(&request).to_string();

    let reject = |input: &str, family: &'static str| {
        tracing::warn!(
            ip = %addr.ip(),
            user_agent = %user_agent,
            path = %path,
            family = family,
            input = %input,
            "Suspicious input rejected"
        );
        metrics::record_rejection("sanitizer");
        PipelineError::SuspiciousInput.into_response()
    };

    if inspect {
        if let Some(family) = detect_attack_signature(&query) {
            return reject(&query, family);
        }
    }

    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false);
    if !is_json {
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();
    let bytes = match body::to_bytes(body, state.max_json_body_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(ip = %addr.ip(), path = %path, error = %err, "Failed to buffer request body");
            metrics::record_rejection("sanitizer");
            return PipelineError::SuspiciousInput.into_response();
        }
    };

    let (out_bytes, scan_target) = match serde_json::from_slice::<Value>(&bytes) {
        Ok(mut tree) => {
            sanitize_value(&mut tree);
            let serialized = tree.to_string();
            (serialized.clone().into_bytes(), serialized)
        }
        // Malformed JSON is the handler's problem; still scan the raw text.
        Err(_) => (
            bytes.to_vec(),
            String::from_utf8_lossy(&bytes).into_owned(),
        ),
    };

    if inspect {
        if let Some(family) = detect_attack_signature(&scan_target) {
            return reject(&scan_target, family);
        }
    }

    // The sanitized body may be shorter than the original.
    parts.headers.remove(header::CONTENT_LENGTH);
    let request = Request::from_parts(parts, Body::from(out_bytes));
    next.run(request).await
}
