use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::models::function_call::FunctionCall;
use crate::models::message::Message;
use crate::models::tool::Tool;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// A non-streamed completion: the reply text plus any native function calls
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub text: String,
    pub function_calls: Vec<FunctionCall>,
}

impl Completion {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            function_calls: Vec::new(),
        }
    }

    pub fn with_function_call(mut self, call: FunctionCall) -> Self {
        self.function_calls.push(call);
        self
    }
}

/// Stream of text fragments; concatenated they form the whole reply
pub type TokenStream = BoxStream<'static, Result<String>>;

/// Base trait for model backends
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the next reply in one piece, declaring `tools` to the backend
    async fn complete(&self, messages: &[Message], tools: &[Tool]) -> Result<(Completion, Usage)>;

    /// Generate the next reply as a stream of text fragments
    async fn stream(&self, messages: &[Message]) -> Result<TokenStream>;
}
