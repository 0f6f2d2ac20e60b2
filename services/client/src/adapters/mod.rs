pub mod http;
pub mod identity;
pub mod storage;

pub use http::HttpDocumentAdapter;
pub use identity::IdentityToolkitAdapter;
pub use storage::{FileStore, MemoryStore};
