//! Entities exposed over HTTP

mod document;
mod profile;

pub use document::Document;
pub use profile::Profile;
