//! Cabinet API Library
//!
//! HTTP surface over the CRUD and attachment services and the object storage
//! adapters: tenant middleware, generic entity routers and application setup.

mod api_doc;
pub mod constants;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod setup;
pub mod state;
mod utils;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
