use crate::core::pipeline::{GenerationPipeline, GenerationResponse, PipelineOutput};
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};

/// Runs the pipeline and writes the document through a storage backend.
pub struct GenerationEngine<S: Storage> {
    pipeline: GenerationPipeline,
    storage: S,
    filename: String,
}

#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub output: PipelineOutput,
    pub output_path: String,
    pub generated_at: DateTime<Utc>,
}

impl<S: Storage> GenerationEngine<S> {
    /// `filename` has no extension; the output format supplies it.
    pub fn new(pipeline: GenerationPipeline, storage: S, filename: impl Into<String>) -> Self {
        Self {
            pipeline,
            storage,
            filename: filename.into(),
        }
    }

    pub async fn run(&self, text: &str) -> Result<GenerationReport> {
        tracing::info!("🚀 Starting generation...");

        let output = self.pipeline.run(text).await?;

        let file = format!("{}.{}", self.filename, output.document.format.extension());
        tracing::info!("💾 Writing {} bytes to {}", output.document.content.len(), file);
        self.storage
            .write_file(&file, output.document.content.as_bytes())
            .await?;

        let output_path = self.storage.resolve(&file);
        tracing::info!("📁 Output saved to: {}", output_path);

        Ok(GenerationReport {
            output,
            output_path,
            generated_at: Utc::now(),
        })
    }

    /// Like [`run`](Self::run), but always answers with the structured result.
    pub async fn respond(&self, text: &str) -> GenerationResponse {
        match self.run(text).await {
            Ok(report) => GenerationResponse::success(&report.output)
                .with_output_path(report.output_path)
                .without_document(),
            Err(e) => {
                tracing::error!(
                    "❌ Generation failed at {}: {} (Severity: {:?})",
                    e.stage().map(|s| s.as_str()).unwrap_or("output"),
                    e,
                    e.severity()
                );
                GenerationResponse::failure(&e)
            }
        }
    }
}
