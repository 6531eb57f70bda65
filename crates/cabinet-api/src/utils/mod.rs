pub mod download;
pub mod multipart;
