//! paperprep-text
//!
//! Text cleanup and recursive chunking. See `normalize` and `chunker`.
pub mod chunker;
pub mod normalize;

pub use chunker::{chunk, RecursiveChunker};
pub use normalize::{normalize, NormalizeStep, TextNormalizer};
