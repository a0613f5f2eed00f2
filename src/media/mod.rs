//! Media ingestion validation.
//!
//! # Data Flow
//! ```text
//! Multipart parts → MediaDescriptor (type, size, filename)
//!     → MediaValidator (per-item Results folded into a field-error map)
//!     → descriptors discarded; storage is someone else's job
//! ```

pub mod descriptor;
pub mod validator;

pub use descriptor::{MediaDescriptor, MediaKind};
pub use validator::{FieldErrors, MediaError, MediaValidator};
