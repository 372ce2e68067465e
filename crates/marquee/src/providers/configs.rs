use anyhow::{anyhow, Result};
use std::env;

pub const OPENAI_DEFAULT_HOST: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_TOKENS: i32 = 500;

pub trait ProviderConfig {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self>
    where
        Self: Sized;

    /// Helper function to get environment variables with error handling
    fn get_env(key: &str, required: bool, default: Option<String>) -> Result<Option<String>> {
        match env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) if !required => Ok(default),
            Err(env::VarError::NotPresent) => Err(anyhow!(
                "Environment variable '{}' is required but not set.",
                key
            )),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

impl OpenAiProviderConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            host: OPENAI_DEFAULT_HOST.to_string(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            temperature: Some(DEFAULT_TEMPERATURE),
            max_tokens: Some(DEFAULT_MAX_TOKENS),
        }
    }
}

impl ProviderConfig for OpenAiProviderConfig {
    fn from_env() -> Result<Self> {
        let api_key = Self::get_env("OPENAI_API_KEY", true, None)?
            .ok_or_else(|| anyhow!("OpenAI API key should be present"))?;
        let mut config = Self::new(api_key);

        if let Some(host) = Self::get_env("OPENAI_HOST", false, None)? {
            config.host = host;
        }
        if let Some(model) = Self::get_env("MARQUEE_MODEL", false, None)? {
            config.model = model;
        }
        if let Some(temperature) = Self::get_env("MARQUEE_TEMPERATURE", false, None)? {
            config.temperature = Some(
                temperature
                    .parse()
                    .map_err(|_| anyhow!("MARQUEE_TEMPERATURE must be a number"))?,
            );
        }
        if let Some(max_tokens) = Self::get_env("MARQUEE_MAX_TOKENS", false, None)? {
            config.max_tokens = Some(
                max_tokens
                    .parse()
                    .map_err(|_| anyhow!("MARQUEE_MAX_TOKENS must be an integer"))?,
            );
        }

        Ok(config)
    }
}
