use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 管線階段，用於結構化錯誤回應
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Segmenter,
    Extraction,
    Normalizer,
    Synthesizer,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Segmenter => "segmenter",
            Stage::Extraction => "extraction",
            Stage::Normalizer => "normalizer",
            Stage::Synthesizer => "synthesizer",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an extraction strategy could not produce candidates.
///
/// The variants stay distinct: unavailable/timeout are worth a retry,
/// malformed replies and rejected credentials are not.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Extraction backend unavailable: {message}")]
    ProviderUnavailable { message: String },

    #[error("Extraction backend timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Malformed extraction response: {message}")]
    MalformedResponse { message: String },

    #[error("Extraction backend rejected credentials: {message}")]
    InvalidCredentials { message: String },
}

impl ExtractionError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExtractionError::ProviderUnavailable { .. } | ExtractionError::Timeout { .. }
        )
    }

    pub fn cause_name(&self) -> &'static str {
        match self {
            ExtractionError::ProviderUnavailable { .. } => "provider_unavailable",
            ExtractionError::Timeout { .. } => "timeout",
            ExtractionError::MalformedResponse { .. } => "malformed_response",
            ExtractionError::InvalidCredentials { .. } => "invalid_credentials",
        }
    }
}

#[derive(Error, Debug)]
pub enum Req2DomError {
    #[error("Requirements text is empty")]
    EmptyInput,

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Normalization produced no domain classes")]
    EmptyModel,

    #[error("Diagram serialization failed: {message}")]
    Serialization { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfig { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl Req2DomError {
    /// 錯誤發生的管線階段；設定與 IO 錯誤不屬於任何階段
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Req2DomError::EmptyInput => Some(Stage::Segmenter),
            Req2DomError::Extraction(_) => Some(Stage::Extraction),
            Req2DomError::EmptyModel => Some(Stage::Normalizer),
            Req2DomError::Serialization { .. } => Some(Stage::Synthesizer),
            _ => None,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Req2DomError::EmptyInput | Req2DomError::EmptyModel => ErrorSeverity::Low,
            Req2DomError::Extraction(e) if e.is_retryable() => ErrorSeverity::Medium,
            Req2DomError::Extraction(_) | Req2DomError::Serialization { .. } => ErrorSeverity::High,
            Req2DomError::Config { .. }
            | Req2DomError::MissingConfig { .. }
            | Req2DomError::InvalidConfigValue { .. } => ErrorSeverity::High,
            Req2DomError::Io(_) | Req2DomError::Json(_) => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Req2DomError::EmptyInput => "No requirements text was provided".to_string(),
            Req2DomError::Extraction(ExtractionError::InvalidCredentials { .. }) => {
                "The generation backend rejected the configured API key".to_string()
            }
            Req2DomError::Extraction(ExtractionError::Timeout { seconds }) => {
                format!("The generation backend did not answer within {}s", seconds)
            }
            Req2DomError::Extraction(e) => format!("Could not extract domain entities: {}", e),
            Req2DomError::EmptyModel => {
                "No domain classes could be identified in the requirements".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Req2DomError::EmptyInput => "Provide at least one requirement statement",
            Req2DomError::Extraction(ExtractionError::ProviderUnavailable { .. }) => {
                "Check that the generation backend is running and reachable, then retry"
            }
            Req2DomError::Extraction(ExtractionError::Timeout { .. }) => {
                "Retry later or raise generative.timeout_seconds"
            }
            Req2DomError::Extraction(ExtractionError::MalformedResponse { .. }) => {
                "Try another model or the hybrid strategy"
            }
            Req2DomError::Extraction(ExtractionError::InvalidCredentials { .. }) => {
                "Set a valid API key for the selected provider"
            }
            Req2DomError::EmptyModel => {
                "Rephrase the requirements so that actors and objects are named explicitly"
            }
            Req2DomError::Serialization { .. } => {
                "Remove control characters from class and attribute names"
            }
            Req2DomError::Config { .. }
            | Req2DomError::MissingConfig { .. }
            | Req2DomError::InvalidConfigValue { .. } => "Fix the configuration file or CLI flags",
            Req2DomError::Io(_) | Req2DomError::Json(_) => {
                "Check file permissions and the output path"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Req2DomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_mapping() {
        assert_eq!(Req2DomError::EmptyInput.stage(), Some(Stage::Segmenter));
        assert_eq!(Req2DomError::EmptyModel.stage(), Some(Stage::Normalizer));
        assert_eq!(
            Req2DomError::from(ExtractionError::Timeout { seconds: 5 }).stage(),
            Some(Stage::Extraction)
        );
        assert_eq!(
            Req2DomError::Serialization {
                message: "x".to_string()
            }
            .stage(),
            Some(Stage::Synthesizer)
        );
        assert_eq!(
            Req2DomError::Config {
                message: "x".to_string()
            }
            .stage(),
            None
        );
    }

    #[test]
    fn test_retryable_causes() {
        assert!(ExtractionError::Timeout { seconds: 1 }.is_retryable());
        assert!(ExtractionError::ProviderUnavailable {
            message: "down".to_string()
        }
        .is_retryable());
        assert!(!ExtractionError::MalformedResponse {
            message: "bad".to_string()
        }
        .is_retryable());
        assert!(!ExtractionError::InvalidCredentials {
            message: "401".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_stage_serializes_lowercase() {
        let json = serde_json::to_string(&Stage::Normalizer).unwrap();
        assert_eq!(json, "\"normalizer\"");
    }
}
