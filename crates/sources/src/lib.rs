//! Data sources and the per-category fallback registry
//!
//! External collaborators (weather, market, scheme, pest services) are
//! reached through `HttpJsonSource`; `StaticSource` carries the statically
//! configured fallback payloads that close every chain. The router walks a
//! category's chain in order and treats any error identically as
//! "unavailable".

pub mod http;
pub mod registry;
pub mod static_data;

pub use http::HttpJsonSource;
pub use registry::SourceRegistry;
pub use static_data::StaticSource;
