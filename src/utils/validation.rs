use crate::utils::error::{Req2DomError, Result};
use regex::Regex;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> Req2DomError {
    Req2DomError::InvalidConfigValue {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(invalid(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(invalid(field_name, url_str, format!("Invalid URL format: {}", e))),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

/// The requirement-code pattern must compile and expose prefix and number groups.
pub fn validate_code_pattern(field_name: &str, pattern: &str) -> Result<()> {
    let re = Regex::new(pattern)
        .map_err(|e| invalid(field_name, pattern, format!("Invalid regex: {}", e)))?;
    for group in ["prefix", "number"] {
        if !re.capture_names().flatten().any(|name| name == group) {
            return Err(invalid(
                field_name,
                pattern,
                format!("Pattern must define a named group '{}'", group),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("generative.endpoint", "https://openrouter.ai/api/v1").is_ok());
        assert!(validate_url("generative.endpoint", "http://localhost:11434").is_ok());
        assert!(validate_url("generative.endpoint", "").is_err());
        assert!(validate_url("generative.endpoint", "invalid-url").is_err());
        assert!(validate_url("generative.endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("generative.temperature", 0.1, 0.0, 2.0).is_ok());
        assert!(validate_range("generative.temperature", 3.0, 0.0, 2.0).is_err());
        assert!(validate_positive_number("layout.max_columns", 0, 1).is_err());
    }

    #[test]
    fn test_validate_code_pattern() {
        assert!(validate_code_pattern("segmenter.code_pattern", r"(?P<prefix>[A-Z]+)(?P<number>\d+):").is_ok());
        assert!(validate_code_pattern("segmenter.code_pattern", r"([A-Z]+)(\d+):").is_err());
        assert!(validate_code_pattern("segmenter.code_pattern", r"(?P<prefix>[A-Z").is_err());
    }
}
