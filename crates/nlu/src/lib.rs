//! Query understanding: normalization, intent classification, entity
//! extraction
//!
//! Everything here is deterministic: identical normalized text and identical
//! dictionaries always produce identical (intent, confidence, entities).

pub mod entities;
pub mod intent;
pub mod normalize;

pub use entities::{nearest_city, parse_coordinates, EntityExtractor};
pub use intent::{Classification, IntentClassifier};
pub use normalize::normalize_query;
