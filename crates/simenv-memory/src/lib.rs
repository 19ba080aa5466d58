//! simenv memory - access to agent memories held by the remote memory service

pub mod flatten;
pub mod http;
pub mod local;
pub mod store;

pub use flatten::flatten_memory;
pub use http::HttpMemoryClient;
pub use local::InMemoryStore;
pub use store::MemoryStore;
