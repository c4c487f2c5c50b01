//! Query routing, response generation, and usage tracking
//!
//! `QueryEngine` is the single entry point the web layer talks to: it owns
//! the guards, the NLU components, the cache, the source registry, the
//! responder, and the usage tracker, and orchestrates one request end to
//! end.

pub mod router;
pub mod templates;
pub mod tracker;

pub use router::QueryEngine;
pub use templates::{apology, build_responder, RuleBasedResponder, TemplateResponder};
pub use tracker::{QueryRecord, UsageReport, UsageTracker};
