pub mod drawio;
pub mod engine;
pub mod normalizer;
pub mod pipeline;
pub mod segmenter;
pub mod synthesizer;
pub mod text;

pub use crate::domain::ports::{ExtractionProvider, GenerationBackend, Storage};
pub use crate::utils::error::Result;
