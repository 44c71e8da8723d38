pub mod generative;
pub mod grammar;
pub mod hybrid;
pub mod reply;

pub use generative::{BatchLimits, GenerativeExtractor};
pub use grammar::GrammarExtractor;
pub use hybrid::HybridExtractor;

use crate::adapters::llm::{ChatCompletionsBackend, OllamaBackend, ProviderPreset};
use crate::config::toml_config::TomlConfig;
use crate::domain::model::StrategyKind;
use crate::domain::ports::{ExtractionProvider, GenerationBackend};
use crate::nlp::LanguageModels;
use crate::utils::error::Result;
use crate::utils::logger::mask_secret;
use std::sync::Arc;
use std::time::Duration;

/// Generation backend for the configured provider preset.
pub fn build_backend(config: &TomlConfig) -> Result<Arc<dyn GenerationBackend>> {
    let preset = config.provider()?;
    let endpoint = config.endpoint()?;
    let model = config.model()?;
    let timeout = Duration::from_secs(config.timeout_seconds()?);
    let temperature = config.generative.temperature;

    tracing::info!(
        "🤖 Generation backend: {} ({}) at {}, timeout {:?}",
        preset,
        model,
        endpoint,
        timeout
    );

    let backend: Arc<dyn GenerationBackend> = match preset {
        ProviderPreset::Ollama => {
            Arc::new(OllamaBackend::new(&endpoint, &model, temperature, timeout))
        }
        _ => {
            let api_key = config.api_key();
            match &api_key {
                Some(key) => tracing::debug!("🔑 Using API key {}", mask_secret(key)),
                None if preset.requires_api_key() => tracing::warn!(
                    "⚠️ No API key for {}; set generative.api_key or {}",
                    preset,
                    preset.api_key_env().unwrap_or("the provider's key variable")
                ),
                None => {}
            }
            let backend = ChatCompletionsBackend::new(
                preset.as_str(),
                &endpoint,
                &model,
                api_key,
                temperature,
                timeout,
            );
            let backend = if preset.requires_api_key() {
                backend
            } else {
                backend.with_optional_key()
            };
            Arc::new(backend)
        }
    };
    Ok(backend)
}

/// The extraction strategy selected by `[pipeline] strategy`.
pub fn build_provider(
    config: &TomlConfig,
    models: Arc<LanguageModels>,
) -> Result<Arc<dyn ExtractionProvider>> {
    let language = config.language()?;
    let provider: Arc<dyn ExtractionProvider> = match config.strategy()? {
        StrategyKind::Grammar => Arc::new(GrammarExtractor::new(models, language)),
        StrategyKind::Generative => Arc::new(generative(config)?),
        StrategyKind::Hybrid => {
            let structural: Arc<dyn ExtractionProvider> = match config.structural_strategy()? {
                StrategyKind::Generative => Arc::new(generative(config)?),
                _ => Arc::new(GrammarExtractor::new(models.clone(), language)),
            };
            Arc::new(
                HybridExtractor::new(structural, Arc::new(generative(config)?), models)
                    .with_language(language)
                    .with_plural_rules(config.plural_rules()),
            )
        }
    };
    Ok(provider)
}

fn generative(config: &TomlConfig) -> Result<GenerativeExtractor> {
    Ok(GenerativeExtractor::new(
        build_backend(config)?,
        config.batch_limits(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_each_strategy() {
        for (strategy, expected) in [
            ("grammar", StrategyKind::Grammar),
            ("generative", StrategyKind::Generative),
            ("hybrid", StrategyKind::Hybrid),
        ] {
            let config =
                TomlConfig::from_toml_str(&format!("[pipeline]\nstrategy = \"{}\"", strategy))
                    .unwrap();
            let provider = build_provider(&config, LanguageModels::global()).unwrap();
            assert_eq!(provider.strategy(), expected);
        }
    }

    #[test]
    fn test_backend_follows_preset() {
        let config = TomlConfig::from_toml_str(
            "[generative]\nprovider = \"deepseek\"\napi_key = \"sk-abc\"",
        )
        .unwrap();
        let backend = build_backend(&config).unwrap();
        assert_eq!(backend.name(), "deepseek");
        assert_eq!(backend.model(), "deepseek-chat");

        let backend = build_backend(&TomlConfig::default()).unwrap();
        assert_eq!(backend.name(), "ollama");
        assert_eq!(backend.model(), "llama3.1:8b");
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let config = TomlConfig::from_toml_str("[pipeline]\nstrategy = \"magic\"").unwrap();
        assert!(build_provider(&config, LanguageModels::global()).is_err());
    }
}
