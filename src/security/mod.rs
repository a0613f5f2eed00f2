//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (OPTIONS short-circuit; headers applied on the way out)
//!     → rate_limit.rs (general per-signature budget)
//!     → sanitizer.rs (string cleaning + attack-signature scan)
//!     → upload_guard.rs (upload endpoints only: own limit, MIME/filename/size)
//!     → Pass to media validation and normalization
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - Every stage owns its own error response; nothing propagates uncaught
//! - No trust in client input

pub mod headers;
pub mod rate_limit;
pub mod sanitizer;
pub mod signature;
pub mod store;
pub mod upload_guard;
