//! Core types and traits for the Krishimitra query engine
//!
//! This crate provides the foundational vocabulary used across all other
//! crates:
//! - Language and script definitions with deterministic detection
//! - The closed intent set and source categories
//! - Query request/analysis/reply types
//! - Error taxonomy
//! - The `DataSource` and `Responder` traits for pluggable backends

pub mod error;
pub mod intent;
pub mod language;
pub mod query;
pub mod traits;

pub use error::{Error, Result};
pub use intent::{Intent, SourceCategory};
pub use language::{detect, Language, Script};
pub use query::{
    Coordinates, EntityMap, QueryAnalysis, QueryReply, QueryRequest, SanitizedQuery,
};
pub use traits::{DataSource, Params, Payload, Responder, SourceError};
