//! Cabinet Infrastructure Library
//!
//! Shared plumbing for the HTTP binary: tracing initialisation, the
//! request-id and security-header middleware, and the JSON error body.

pub mod error;
pub mod middleware;
pub mod telemetry;

pub use error::ErrorResponse;
pub use middleware::{
    get_request_id, request_id_middleware, security_headers_middleware, RequestId,
    REQUEST_ID_HEADER,
};
pub use telemetry::{init_telemetry, shutdown_telemetry, LogFormat};
