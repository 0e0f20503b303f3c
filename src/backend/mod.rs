pub mod http;
pub mod sse;
mod traits;
mod types;

pub use http::HttpBackend;
pub use traits::{Backend, ProgressStream};
pub use types::*;
