//! Request guards: input validation/sanitization and rate limiting
//!
//! Every inbound request passes through the `Validator` before any other
//! component sees it, and through the `SlidingWindowLimiter` before any
//! backend work is performed.

pub mod rate_limit;
pub mod validator;

pub use rate_limit::{client_key, SlidingWindowLimiter};
pub use validator::{Validated, Validator};
