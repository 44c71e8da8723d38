use crate::domain::model::{Extraction, RequirementUnit, StrategyKind};
use crate::utils::error::{ExtractionError, Result};
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Location a relative path resolves to, for reporting.
    fn resolve(&self, path: &str) -> String;
}

/// One extraction strategy: requirement units in, candidates out.
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    fn strategy(&self) -> StrategyKind;

    async fn extract(
        &self,
        units: &[RequirementUnit],
    ) -> std::result::Result<Extraction, ExtractionError>;
}

/// Text-generation backend used by the model-based strategies.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str) -> std::result::Result<String, ExtractionError>;
}
