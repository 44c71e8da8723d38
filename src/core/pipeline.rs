use crate::core::normalizer::Normalizer;
use crate::core::segmenter::{Segmenter, SegmentationMode};
use crate::core::synthesizer::Synthesizer;
use crate::core::text::PluralRules;
use crate::domain::diagram::{DiagramDocument, OutputFormat};
use crate::domain::model::{DomainModel, ExtractionStage, ModelStats, RequirementUnit};
use crate::domain::ports::ExtractionProvider;
use crate::nlp::{Language, LanguageModels};
use crate::utils::error::{Req2DomError, Result, Stage};
use crate::utils::monitor::{RunMonitor, StageTiming};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Everything one run produced, kept for reporting.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub language: Language,
    pub segmentation: SegmentationMode,
    pub units: Vec<RequirementUnit>,
    pub produced_by: ExtractionStage,
    pub warnings: Vec<String>,
    pub model: DomainModel,
    pub document: DiagramDocument,
    pub timings: Vec<StageTiming>,
}

/// text → units → candidates → model → document.
///
/// Holds no per-run state: every call to [`run`](Self::run) builds and
/// discards its own units, candidates and model.
pub struct GenerationPipeline {
    segmenter: Segmenter,
    provider: Arc<dyn ExtractionProvider>,
    models: Arc<LanguageModels>,
    language: Option<Language>,
    plural_rules: Option<PluralRules>,
    synthesizer: Synthesizer,
    format: OutputFormat,
    monitoring: bool,
}

impl GenerationPipeline {
    pub fn new(provider: Arc<dyn ExtractionProvider>, models: Arc<LanguageModels>) -> Self {
        Self {
            segmenter: Segmenter::new(),
            provider,
            models,
            language: None,
            plural_rules: None,
            synthesizer: Synthesizer::default(),
            format: OutputFormat::default(),
            monitoring: false,
        }
    }

    pub fn with_segmenter(mut self, segmenter: Segmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    /// `None` detects the language of every input.
    pub fn with_language(mut self, language: Option<Language>) -> Self {
        self.language = language;
        self
    }

    /// Replaces the plural rules of the detected language.
    pub fn with_plural_rules(mut self, rules: Option<PluralRules>) -> Self {
        self.plural_rules = rules;
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Synthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitoring = enabled;
        self
    }

    pub fn strategy(&self) -> crate::domain::model::StrategyKind {
        self.provider.strategy()
    }

    pub async fn run(&self, text: &str) -> Result<PipelineOutput> {
        let monitor = RunMonitor::new(self.monitoring);
        tracing::info!("🚀 Starting generation with the {} strategy", self.provider.strategy());

        // 1. 切分需求
        let started = Instant::now();
        let segmentation = self.segmenter.segment(text)?;
        monitor.record(Stage::Segmenter.as_str(), started.elapsed());
        tracing::info!(
            "✂️ Segmented {} requirement units ({:?} mode)",
            segmentation.units.len(),
            segmentation.mode
        );

        let units = segmentation.units;
        let language = Language::resolve(self.language, &units);

        // 2. 抽取候選
        let started = Instant::now();
        let extraction = self.provider.extract(&units).await?;
        monitor.record(Stage::Extraction.as_str(), started.elapsed());
        tracing::info!(
            "🔎 Extraction produced {} entities and {} relationships ({:?})",
            extraction.candidates.entities.len(),
            extraction.candidates.relationships.len(),
            extraction.produced_by
        );
        for warning in &extraction.warnings {
            tracing::warn!("⚠️ {}", warning);
        }

        // 3. 正規化
        let started = Instant::now();
        let rules = self
            .plural_rules
            .clone()
            .unwrap_or_else(|| self.models.get(language).plural_rules().clone());
        let model = Normalizer::new(rules).normalize(&extraction.candidates)?;
        monitor.record(Stage::Normalizer.as_str(), started.elapsed());

        // 4. 版面與輸出
        let started = Instant::now();
        let document = self.synthesizer.render(&model, self.format)?;
        monitor.record(Stage::Synthesizer.as_str(), started.elapsed());

        monitor.log_final_stats();

        Ok(PipelineOutput {
            language,
            segmentation: segmentation.mode,
            units,
            produced_by: extraction.produced_by,
            warnings: extraction.warnings,
            model,
            document,
            timings: monitor.timings(),
        })
    }
}

/// Structured result handed to callers; failures never escape as raw errors.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub produced_by: Option<ExtractionStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ModelStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub timings: Vec<StageTiming>,
}

impl GenerationResponse {
    pub fn success(output: &PipelineOutput) -> Self {
        Self {
            success: true,
            error: None,
            stage: None,
            suggestion: None,
            warnings: output.warnings.clone(),
            produced_by: Some(output.produced_by),
            language: Some(output.language),
            units: Some(output.units.len()),
            stats: Some(output.model.stats()),
            format: Some(output.document.format),
            document: Some(output.document.content.clone()),
            output_path: None,
            timings: output.timings.clone(),
        }
    }

    pub fn failure(error: &Req2DomError) -> Self {
        Self {
            success: false,
            error: Some(error.user_friendly_message()),
            stage: error.stage(),
            suggestion: Some(error.recovery_suggestion().to_string()),
            warnings: Vec::new(),
            produced_by: None,
            language: None,
            units: None,
            stats: None,
            format: None,
            document: None,
            output_path: None,
            timings: Vec::new(),
        }
    }

    pub fn from_result(result: &Result<PipelineOutput>) -> Self {
        match result {
            Ok(output) => Self::success(output),
            Err(e) => Self::failure(e),
        }
    }

    /// Adds where the document was written.
    pub fn with_output_path(mut self, path: impl Into<String>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Drops the document body, e.g. once it has been written to a file.
    pub fn without_document(mut self) -> Self {
        self.document = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::extractors::grammar::GrammarExtractor;
    use crate::domain::model::{Extraction, StrategyKind};
    use crate::utils::error::ExtractionError;
    use async_trait::async_trait;

    fn grammar_pipeline() -> GenerationPipeline {
        let models = LanguageModels::global();
        let provider = Arc::new(GrammarExtractor::new(models.clone(), None));
        GenerationPipeline::new(provider, models)
    }

    #[tokio::test]
    async fn test_run_grammar_strategy() {
        let output = grammar_pipeline()
            .run("RF01: O cliente deve poder registar-se fornecendo nome, email e telefone.")
            .await
            .unwrap();

        assert_eq!(output.language, Language::Pt);
        assert_eq!(output.segmentation, SegmentationMode::Coded);
        assert_eq!(output.units.len(), 1);
        assert_eq!(output.produced_by, ExtractionStage::Grammar);
        assert!(output.model.class_by_name("Cliente").is_some());
        assert!(output.document.content.contains("<mxfile"));

        let stages: Vec<&str> = output.timings.iter().map(|t| t.stage.as_str()).collect();
        assert_eq!(stages, vec!["segmenter", "extraction", "normalizer", "synthesizer"]);
    }

    #[tokio::test]
    async fn test_empty_input_reports_segmenter_stage() {
        let result = grammar_pipeline().run("   \n\t ").await;
        let response = GenerationResponse::from_result(&result);

        assert!(!response.success);
        assert_eq!(response.stage, Some(Stage::Segmenter));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["stage"], "segmenter");
        assert_eq!(json["success"], false);
        assert!(json.get("document").is_none());
    }

    struct Unreachable;

    #[async_trait]
    impl ExtractionProvider for Unreachable {
        fn strategy(&self) -> StrategyKind {
            StrategyKind::Generative
        }

        async fn extract(
            &self,
            _units: &[RequirementUnit],
        ) -> std::result::Result<Extraction, ExtractionError> {
            Err(ExtractionError::ProviderUnavailable {
                message: "connection refused".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_extraction_failure_aborts() {
        let pipeline = GenerationPipeline::new(Arc::new(Unreachable), LanguageModels::global());
        let result = pipeline.run("O cliente compra produtos.").await;

        let err = result.as_ref().unwrap_err();
        assert!(matches!(
            err,
            Req2DomError::Extraction(ExtractionError::ProviderUnavailable { .. })
        ));
        let response = GenerationResponse::from_result(&result);
        assert_eq!(response.stage, Some(Stage::Extraction));
    }

    #[tokio::test]
    async fn test_json_output_format() {
        let output = grammar_pipeline()
            .with_format(OutputFormat::Json)
            .run("O cliente deve poder registar-se fornecendo nome, email e telefone.")
            .await
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&output.document.content).unwrap();
        assert!(value["classes"].get("class-cliente").is_some());

        let response = GenerationResponse::success(&output).with_output_path("out/model.json");
        assert!(response.success);
        assert_eq!(response.stats.unwrap().classes, output.model.classes.len());
        assert_eq!(response.output_path.as_deref(), Some("out/model.json"));
    }
}
