// Application layer: extraction strategies and the wiring from configuration.

pub mod extractors;

use crate::config::toml_config::TomlConfig;
use crate::core::pipeline::GenerationPipeline;
use crate::core::segmenter::Segmenter;
use crate::core::synthesizer::Synthesizer;
use crate::nlp::{LanguageModels, LexiconFile};
use crate::utils::error::Result;
use std::sync::Arc;

/// Built-in language models, or fresh ones with the configured lexicon merged in.
pub fn build_models(config: &TomlConfig) -> Result<Arc<LanguageModels>> {
    match &config.grammar.lexicon_file {
        Some(path) => {
            tracing::info!("📚 Loading lexicon overrides from {}", path);
            let lexicon = LexiconFile::from_file(path)?;
            Ok(Arc::new(LanguageModels::load_with(&lexicon)))
        }
        None => Ok(LanguageModels::global()),
    }
}

pub fn build_pipeline(config: &TomlConfig, models: Arc<LanguageModels>) -> Result<GenerationPipeline> {
    let segmenter = match &config.segmenter.code_pattern {
        Some(pattern) => Segmenter::with_code_pattern(pattern)?,
        None => Segmenter::new(),
    };
    let provider = extractors::build_provider(config, models.clone())?;

    Ok(GenerationPipeline::new(provider, models)
        .with_segmenter(segmenter)
        .with_language(config.language()?)
        .with_plural_rules(config.plural_rules())
        .with_synthesizer(Synthesizer::new(config.layout.clone()))
        .with_format(config.output_format()?)
        .with_monitoring(config.monitoring_enabled()))
}
