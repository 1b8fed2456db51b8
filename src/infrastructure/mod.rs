pub mod http;
pub mod memory;

pub use http::backend_client;
pub use memory::session_store;
