//! Tenant-aware CRUD and attachment services
//!
//! [`CrudService`] owns the tenant rules; [`FileService`], [`ImageService`]
//! and [`MultiFileService`] layer attachments on top of it and persist the
//! bytes through a [`cabinet_storage::FileBackend`].

mod attachment;
pub mod crud;
pub mod file;
pub mod image;
pub mod multi_file;

#[cfg(test)]
mod test_support;

pub use crud::CrudService;
pub use file::FileService;
pub use image::ImageService;
pub use multi_file::MultiFileService;
