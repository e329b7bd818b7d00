//! Runtime configuration
//!
//! Settings are read from the environment (optionally seeded from a `.env`
//! file) once at startup and never change afterwards.

use crate::llm::{GenerateConfig, LiteLlmConfig};
use crate::{Error, Result};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct Config {
    pub litellm_base_url: String,
    pub litellm_api_key: String,
    pub model: String,
    pub stream: bool,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset and blank values are treated alike.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| Error::Config(format!("{} not set", key)));

        Ok(Self {
            litellm_base_url: required("LITELLM_BASE_URL")?,
            litellm_api_key: required("LITELLM_API_KEY")?,
            model: get("LITELLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            stream: parse_optional("LLM_STREAM", get("LLM_STREAM"))?.unwrap_or(true),
            temperature: parse_optional("LLM_TEMPERATURE", get("LLM_TEMPERATURE"))?,
            max_output_tokens: parse_optional("LLM_MAX_OUTPUT_TOKENS", get("LLM_MAX_OUTPUT_TOKENS"))?,
            timeout: Duration::from_secs(
                parse_optional("LLM_TIMEOUT_SECS", get("LLM_TIMEOUT_SECS"))?
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        })
    }

    pub fn litellm(&self) -> LiteLlmConfig {
        LiteLlmConfig {
            base_url: self.litellm_base_url.clone(),
            api_key: self.litellm_api_key.clone(),
            model: self.model.clone(),
        }
    }

    /// Sampling settings to attach to requests, if any were configured.
    pub fn generate_config(&self) -> Option<GenerateConfig> {
        if self.temperature.is_none() && self.max_output_tokens.is_none() {
            return None;
        }
        Some(GenerateConfig {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        })
    }
}

fn parse_optional<T>(key: &str, value: Option<String>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| Error::Config(format!("{} is invalid ('{}'): {}", key, raw, e)))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply_when_optional_vars_missing() {
        let config = Config::from_lookup(lookup(&[
            ("LITELLM_BASE_URL", "http://localhost:4000"),
            ("LITELLM_API_KEY", "sk-test"),
        ]))
        .unwrap();

        assert_eq!(config.model, "gpt-4o");
        assert!(config.stream);
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert!(config.generate_config().is_none());
        assert_eq!(config.litellm().base_url, "http://localhost:4000");
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = Config::from_lookup(lookup(&[("LITELLM_BASE_URL", "http://localhost:4000")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("LITELLM_API_KEY")));
    }

    #[test]
    fn test_blank_base_url_is_treated_as_missing() {
        let err = Config::from_lookup(lookup(&[
            ("LITELLM_BASE_URL", "  "),
            ("LITELLM_API_KEY", "sk-test"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_optional_values_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("LITELLM_BASE_URL", "http://gw"),
            ("LITELLM_API_KEY", "k"),
            ("LITELLM_MODEL", "claude-3-5-sonnet"),
            ("LLM_STREAM", "false"),
            ("LLM_TEMPERATURE", "0.3"),
            ("LLM_MAX_OUTPUT_TOKENS", "2048"),
            ("LLM_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.model, "claude-3-5-sonnet");
        assert!(!config.stream);
        assert_eq!(
            config.generate_config(),
            Some(GenerateConfig {
                temperature: Some(0.3),
                max_output_tokens: Some(2048),
            })
        );
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_unparsable_value_is_config_error() {
        let err = Config::from_lookup(lookup(&[
            ("LITELLM_BASE_URL", "http://gw"),
            ("LITELLM_API_KEY", "k"),
            ("LLM_MAX_OUTPUT_TOKENS", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("LLM_MAX_OUTPUT_TOKENS")));
    }
}
