pub mod cached;
pub mod http;
pub mod source;

pub use cached::CachedKeySet;
pub use http::HttpKeySet;
pub use source::{KeySetError, KeySetResult, KeySetSource, StaticKeySet};
