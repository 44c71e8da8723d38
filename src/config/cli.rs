use crate::config::toml_config::{MonitoringConfig, TomlConfig};
use clap::Parser;

/// Command-line flags; each one set overrides the TOML value.
#[derive(Debug, Clone, Parser)]
#[command(name = "req2dom")]
#[command(about = "Turns free-text requirements into a domain class diagram")]
pub struct CliConfig {
    /// Requirements text file, `-` for stdin
    #[arg(short, long, default_value = "-")]
    pub input: String,

    /// Path to TOML configuration file (optional)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Extraction strategy: grammar, generative or hybrid
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Requirements language: pt, en or auto
    #[arg(short, long)]
    pub language: Option<String>,

    /// Generation provider: ollama, openai, openrouter, deepseek or custom
    #[arg(long)]
    pub provider: Option<String>,

    /// Generation model identifier
    #[arg(long)]
    pub model: Option<String>,

    /// Generation endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<String>,

    /// Output file name without extension
    #[arg(long)]
    pub filename: Option<String>,

    /// Output format: drawio or json
    #[arg(short, long)]
    pub format: Option<String>,

    /// Print the structured result as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Print the document on stdout instead of writing a file
    #[arg(long)]
    pub stdout: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    pub monitor: Option<bool>,

    /// Dry run - show the effective configuration without generating
    #[arg(long)]
    pub dry_run: bool,
}

impl CliConfig {
    /// Loads the TOML file when given, then applies the flags on top.
    pub fn load(&self) -> crate::utils::error::Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut TomlConfig) {
        if let Some(strategy) = &self.strategy {
            config.pipeline.strategy = strategy.clone();
            tracing::info!("🔧 Strategy overridden to: {}", strategy);
        }
        if let Some(language) = &self.language {
            config.pipeline.language = language.clone();
        }
        if let Some(provider) = &self.provider {
            config.generative.provider = provider.clone();
        }
        if let Some(model) = &self.model {
            config.generative.model = Some(model.clone());
        }
        if let Some(endpoint) = &self.endpoint {
            config.generative.endpoint = Some(endpoint.clone());
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if let Some(filename) = &self.filename {
            config.output.filename = filename.clone();
        }
        if let Some(format) = &self.format {
            config.output.format = format.clone();
        }
        if let Some(enabled) = self.monitor {
            let monitoring = config.monitoring.get_or_insert_with(MonitoringConfig::default);
            monitoring.enabled = enabled;
        }
    }
}
