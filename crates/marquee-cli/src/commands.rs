pub mod build;
pub mod chat;

use anyhow::Result;
use marquee::providers::configs::{OpenAiProviderConfig, ProviderConfig};
use marquee::providers::openai::OpenAiProvider;
use std::sync::Arc;

pub fn provider_from_env() -> Result<Arc<OpenAiProvider>> {
    let config = OpenAiProviderConfig::from_env()?;
    tracing::debug!(model = %config.model, host = %config.host, "using OpenAI provider");
    Ok(Arc::new(OpenAiProvider::new(config)?))
}
