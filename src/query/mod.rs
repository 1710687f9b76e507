//! Query engines and response synthesis.
//!
//! ```text
//! VectorQueryEngine  → top-k retrieval (+ filters) → compact synthesis
//! SummaryQueryEngine → every node                  → tree summarize
//! ```

mod engine;
mod synthesizer;

pub use engine::{SummaryQueryEngine, VectorQueryEngine};
pub use synthesizer::{EMPTY_RESPONSE, ResponseMode, Synthesizer};
