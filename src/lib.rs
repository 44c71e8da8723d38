pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod nlp;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::storage::LocalStorage;
pub use config::TomlConfig;
pub use crate::core::engine::{GenerationEngine, GenerationReport};
pub use crate::core::pipeline::{GenerationPipeline, GenerationResponse, PipelineOutput};
pub use domain::model::{DomainModel, StrategyKind};
pub use utils::error::{ExtractionError, Req2DomError, Result};
