pub mod http;
pub mod memory;
pub mod traits;

pub use http::HttpBackend;
pub use memory::MemorySource;
pub use traits::{LogToaster, PropertySource, Toaster, UserSource};
