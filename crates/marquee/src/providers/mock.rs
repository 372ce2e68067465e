use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;

use crate::models::message::Message;
use crate::models::tool::Tool;
use crate::providers::base::{Completion, Provider, TokenStream, Usage};

/// A mock provider that returns pre-configured responses for testing
#[derive(Clone, Default)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<Completion>>>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new(responses: Vec<Completion>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::default(),
        }
    }

    /// Shorthand for a provider that replies with plain texts in order
    pub fn with_texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|text| Completion::text(*text)).collect())
    }

    /// Number of completions requested so far
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The history sent with each request, in order
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, messages: &[Message]) -> Result<Completion> {
        self.requests.lock().unwrap().push(messages.to_vec());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Err(anyhow!("mock provider has no responses left"))
        } else {
            Ok(responses.remove(0))
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, messages: &[Message], _tools: &[Tool]) -> Result<(Completion, Usage)> {
        Ok((self.next(messages)?, Usage::default()))
    }

    async fn stream(&self, messages: &[Message]) -> Result<TokenStream> {
        let text = self.next(messages)?.text;
        // Split into small fragments so callers have to reassemble the reply
        let tokens: Vec<Result<String>> = text
            .split_inclusive(' ')
            .map(|token| Ok(token.to_string()))
            .collect();
        Ok(Box::pin(futures::stream::iter(tokens)))
    }
}
