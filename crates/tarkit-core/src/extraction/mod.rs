//! Extraction orchestrator: strips, filters, validates and materializes
//! entries in archive order.

mod engine;
mod materialize;
mod metadata;
mod stream;

pub use engine::Extractor;
pub use stream::extract;
pub use stream::extract_with_progress;
