//! Core data types shared by ingestion, indexing, and tools.

mod document;
mod node;

pub use document::Document;
pub use node::{FILE_NAME_KEY, FILE_PATH_KEY, Node, PAGE_LABEL_KEY, Response, ScoredNode};
