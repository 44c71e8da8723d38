use crate::adapters::llm::ProviderPreset;
use crate::app::extractors::generative::{
    BatchLimits, DEFAULT_MAX_CHARS_PER_REQUEST, DEFAULT_MAX_UNITS_PER_REQUEST,
};
use crate::core::synthesizer::LayoutOptions;
use crate::core::text::{PluralRules, SuffixRule};
use crate::domain::diagram::OutputFormat;
use crate::domain::model::StrategyKind;
use crate::nlp::Language;
use crate::utils::error::{Req2DomError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Every section is optional; missing values fall back to the defaults below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub segmenter: SegmenterConfig,
    pub grammar: GrammarConfig,
    pub generative: GenerativeConfig,
    pub hybrid: HybridConfig,
    pub normalizer: NormalizerConfig,
    pub layout: LayoutOptions,
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// grammar | generative | hybrid
    pub strategy: String,
    /// pt | en | auto
    pub language: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            strategy: "grammar".to_string(),
            language: "auto".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Must define named groups `prefix` and `number`.
    pub code_pattern: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarConfig {
    /// TOML file with extra stop nouns, attribute words and verbs.
    pub lexicon_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerativeConfig {
    pub provider: String,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub temperature: f32,
    pub max_units_per_request: usize,
    pub max_chars_per_request: usize,
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            endpoint: None,
            model: None,
            api_key: None,
            timeout_seconds: None,
            temperature: 0.1,
            max_units_per_request: DEFAULT_MAX_UNITS_PER_REQUEST,
            max_chars_per_request: DEFAULT_MAX_CHARS_PER_REQUEST,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    /// Strategy that builds the skeleton: grammar | generative
    pub structural: String,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            structural: "grammar".to_string(),
        }
    }
}

/// Plural folding overrides. Without rules, the rules of the detected language apply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub plural_rules: Option<Vec<SuffixRule>>,
    pub min_stem_length: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    /// File name without extension.
    pub filename: String,
    /// drawio | json
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "./output".to_string(),
            filename: "domain_model".to_string(),
            format: "drawio".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    /// compact | json
    pub log_format: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| Req2DomError::Config {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OPENROUTER_API_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn strategy(&self) -> Result<StrategyKind> {
        StrategyKind::parse(&self.pipeline.strategy).ok_or_else(|| {
            Req2DomError::InvalidConfigValue {
                field: "pipeline.strategy".to_string(),
                value: self.pipeline.strategy.clone(),
                reason: "Valid strategies: grammar, generative, hybrid".to_string(),
            }
        })
    }

    /// `None` when the language is detected per run.
    pub fn language(&self) -> Result<Option<Language>> {
        let value = self.pipeline.language.trim();
        if value.eq_ignore_ascii_case("auto") || value.is_empty() {
            return Ok(None);
        }
        Language::parse(value)
            .map(Some)
            .ok_or_else(|| Req2DomError::InvalidConfigValue {
                field: "pipeline.language".to_string(),
                value: value.to_string(),
                reason: "Valid languages: pt, en, auto".to_string(),
            })
    }

    pub fn structural_strategy(&self) -> Result<StrategyKind> {
        match StrategyKind::parse(&self.hybrid.structural) {
            Some(kind @ (StrategyKind::Grammar | StrategyKind::Generative)) => Ok(kind),
            _ => Err(Req2DomError::InvalidConfigValue {
                field: "hybrid.structural".to_string(),
                value: self.hybrid.structural.clone(),
                reason: "Valid structural strategies: grammar, generative".to_string(),
            }),
        }
    }

    pub fn provider(&self) -> Result<ProviderPreset> {
        ProviderPreset::parse(&self.generative.provider).ok_or_else(|| {
            Req2DomError::InvalidConfigValue {
                field: "generative.provider".to_string(),
                value: self.generative.provider.clone(),
                reason: "Valid providers: ollama, openai, openrouter, deepseek, custom"
                    .to_string(),
            }
        })
    }

    pub fn endpoint(&self) -> Result<String> {
        let preset = self.provider()?;
        match self.generative.endpoint.as_deref().map(str::trim) {
            Some(endpoint) if !endpoint.is_empty() => Ok(endpoint.to_string()),
            _ => preset
                .default_endpoint()
                .map(str::to_string)
                .ok_or_else(|| Req2DomError::MissingConfig {
                    field: "generative.endpoint".to_string(),
                }),
        }
    }

    pub fn model(&self) -> Result<String> {
        let preset = self.provider()?;
        Ok(self
            .generative
            .model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| preset.default_model().to_string()))
    }

    /// Configured key, else the preset's environment variable.
    /// A `${VAR}` left unsubstituted counts as missing.
    pub fn api_key(&self) -> Option<String> {
        let configured = self
            .generative
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty() && !k.starts_with("${"));
        configured.or_else(|| {
            self.provider()
                .ok()
                .and_then(|p| p.api_key_env())
                .and_then(|var| std::env::var(var).ok())
                .filter(|k| !k.trim().is_empty())
        })
    }

    pub fn timeout_seconds(&self) -> Result<u64> {
        let preset = self.provider()?;
        Ok(self
            .generative
            .timeout_seconds
            .unwrap_or_else(|| preset.default_timeout_seconds()))
    }

    pub fn batch_limits(&self) -> BatchLimits {
        BatchLimits {
            max_units: self.generative.max_units_per_request,
            max_chars: self.generative.max_chars_per_request,
        }
    }

    /// Configured plural rules, or `None` to use the language's own.
    pub fn plural_rules(&self) -> Option<PluralRules> {
        let rules = self.normalizer.plural_rules.clone()?;
        Some(PluralRules {
            rules,
            min_stem_length: self.normalizer.min_stem_length.unwrap_or(3),
        })
    }

    pub fn output_format(&self) -> Result<OutputFormat> {
        OutputFormat::parse(&self.output.format).ok_or_else(|| {
            Req2DomError::InvalidConfigValue {
                field: "output.format".to_string(),
                value: self.output.format.clone(),
                reason: "Valid formats: drawio, json".to_string(),
            }
        })
    }

    /// Output file name including the format extension.
    pub fn output_file(&self) -> Result<String> {
        Ok(format!(
            "{}.{}",
            self.output.filename,
            self.output_format()?.extension()
        ))
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        let strategy = self.strategy()?;
        self.language()?;
        self.output_format()?;
        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_non_empty_string("output.filename", &self.output.filename)?;

        if let Some(pattern) = &self.segmenter.code_pattern {
            validation::validate_code_pattern("segmenter.code_pattern", pattern)?;
        }
        if let Some(lexicon) = &self.grammar.lexicon_file {
            validation::validate_path("grammar.lexicon_file", lexicon)?;
        }

        // 生成式設定只在會用到時檢查
        let uses_generative = strategy != StrategyKind::Grammar
            || self.structural_strategy()? == StrategyKind::Generative;
        if uses_generative {
            self.provider()?;
            validation::validate_url("generative.endpoint", &self.endpoint()?)?;
            validation::validate_range("generative.temperature", self.generative.temperature, 0.0, 2.0)?;
            validation::validate_positive_number(
                "generative.max_units_per_request",
                self.generative.max_units_per_request,
                1,
            )?;
            validation::validate_positive_number(
                "generative.max_chars_per_request",
                self.generative.max_chars_per_request,
                100,
            )?;
            validation::validate_positive_number(
                "generative.timeout_seconds",
                self.timeout_seconds()? as usize,
                1,
            )?;
        }
        if strategy == StrategyKind::Hybrid {
            self.structural_strategy()?;
        }

        if let Some(rules) = &self.normalizer.plural_rules {
            for rule in rules {
                validation::validate_non_empty_string("normalizer.plural_rules.suffix", &rule.suffix)?;
            }
        }

        validation::validate_positive_number("layout.max_columns", self.layout.max_columns, 1)?;
        validation::validate_range("layout.cell_width", self.layout.cell_width, 1.0, 10_000.0)?;
        validation::validate_range("layout.cell_height", self.layout.cell_height, 1.0, 10_000.0)?;
        validation::validate_range("layout.min_node_width", self.layout.min_node_width, 1.0, 10_000.0)?;
        validation::validate_range("layout.row_height", self.layout.row_height, 1.0, 1_000.0)?;
        validation::validate_range("layout.header_height", self.layout.header_height, 1.0, 1_000.0)?;

        Ok(())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = TomlConfig::from_toml_str("").unwrap();

        assert_eq!(config.strategy().unwrap(), StrategyKind::Grammar);
        assert_eq!(config.language().unwrap(), None);
        assert_eq!(config.output_file().unwrap(), "domain_model.drawio");
        assert_eq!(config.layout.max_columns, 4);
        assert_eq!(config.provider().unwrap(), ProviderPreset::Ollama);
        assert_eq!(config.timeout_seconds().unwrap(), 300);
        assert!(config.plural_rules().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[pipeline]
strategy = "hybrid"
language = "pt"

[segmenter]
code_pattern = '(?P<prefix>REQ)-(?P<number>\d+):'

[generative]
provider = "openrouter"
model = "anthropic/claude-3-haiku"
timeout_seconds = 90
max_units_per_request = 10

[hybrid]
structural = "grammar"

[normalizer]
plural_rules = [{ suffix = "oes", replacement = "ao" }, { suffix = "s", replacement = "" }]
min_stem_length = 2

[layout]
max_columns = 3

[output]
path = "./diagrams"
format = "json"

[monitoring]
enabled = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.strategy().unwrap(), StrategyKind::Hybrid);
        assert_eq!(config.language().unwrap(), Some(Language::Pt));
        assert_eq!(config.endpoint().unwrap(), "https://openrouter.ai/api/v1");
        assert_eq!(config.timeout_seconds().unwrap(), 90);
        assert_eq!(config.batch_limits().max_units, 10);
        assert_eq!(config.plural_rules().unwrap().min_stem_length, 2);
        assert_eq!(config.layout.max_columns, 3);
        assert_eq!(config.layout.cell_width, 260.0);
        assert_eq!(config.output_file().unwrap(), "domain_model.json");
        assert!(config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("REQ2DOM_TEST_KEY", "sk-test-123456789");

        let toml_content = r#"
[generative]
provider = "openai"
api_key = "${REQ2DOM_TEST_KEY}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api_key().as_deref(), Some("sk-test-123456789"));

        std::env::remove_var("REQ2DOM_TEST_KEY");
    }

    #[test]
    fn test_unresolved_placeholder_is_not_a_key() {
        let toml_content = r#"
[generative]
provider = "custom"
api_key = "${REQ2DOM_UNSET_VARIABLE}"
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api_key(), None);
    }

    #[test]
    fn test_config_validation() {
        let invalid = [
            "[pipeline]\nstrategy = \"magic\"",
            "[pipeline]\nlanguage = \"fr\"",
            "[pipeline]\nstrategy = \"generative\"\n[generative]\nprovider = \"custom\"",
            "[pipeline]\nstrategy = \"generative\"\n[generative]\nendpoint = \"not a url\"",
            "[pipeline]\nstrategy = \"generative\"\n[generative]\ntemperature = 5.0",
            "[segmenter]\ncode_pattern = '([A-Z]+)(\\d+)'",
            "[layout]\nmax_columns = 0",
            "[output]\nformat = \"png\"",
        ];
        for content in invalid {
            let config = TomlConfig::from_toml_str(content).unwrap();
            assert!(config.validate().is_err(), "expected invalid: {}", content);
        }
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[pipeline]\nstrategy = \"generative\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.strategy().unwrap(), StrategyKind::Generative);
    }

    #[test]
    fn test_invalid_toml() {
        let err = TomlConfig::from_toml_str("[pipeline\nstrategy=").unwrap_err();
        assert!(matches!(err, Req2DomError::Config { .. }));
    }
}
