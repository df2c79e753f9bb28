//! # Deterministic Tools
//!
//! Rust code that wraps agent guesswork with fixed rules.
//!
//! ## Philosophy: "Code > Agents"
//!
//! Anything that can be decided without a model is decided here, so the
//! pipeline has a correct answer to fall back on when every model call fails.
//!
//! ## Modules
//!
//! - `capabilities` - Stack -> integration server lookup
//! - `doc_hints` - Technology -> documentation links
//! - `validation` - Entry point and recommendation heuristics

pub mod capabilities;
pub mod doc_hints;
pub mod validation;

pub use capabilities::{CapabilityResolver, CapabilityTables};
pub use doc_hints::DocHintTable;
