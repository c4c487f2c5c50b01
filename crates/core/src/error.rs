//! Error taxonomy for the query engine
//!
//! Only validation and rate-limit conditions surface to the caller. Backend,
//! cache, and budget failures are absorbed by the router and converted into
//! fallback replies, so they never appear here.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Every violated rule, not just the first
    #[error("validation failed: {0:?}")]
    Validation(Vec<String>),

    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}
