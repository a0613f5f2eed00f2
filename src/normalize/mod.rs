//! Field normalization for property submissions.
//!
//! Reconciles the two parallel naming conventions (camelCase from the client
//! application, snake_case as a compatibility alias) into one canonical map
//! and derives default values before validation rules run.

pub mod aliases;
pub mod submission;

pub use aliases::{Coercion, FieldAlias, FIELD_ALIASES};
pub use submission::{normalize, CanonicalSubmission};
