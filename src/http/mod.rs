//! HTTP boundary: server wiring, handlers, and error responses.

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use response::PipelineError;
pub use server::{AppState, HttpServer};
