//! Data models shared by the CRUD, storage and API crates.

mod attachment;
mod object_storage;
mod page;
mod storage_connection;
mod upload;

pub use attachment::*;
pub use object_storage::*;
pub use page::*;
pub use storage_connection::*;
pub use upload::*;
