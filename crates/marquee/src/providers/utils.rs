use anyhow::{anyhow, Result};
use regex::Regex;
use serde_json::{json, Value};

use crate::models::function_call::FunctionCall;
use crate::models::message::Message;
use crate::models::tool::Tool;
use crate::providers::base::Completion;

/// Convert internal Message format to OpenAI's API message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            json!({
                "role": message.role,
                "content": message.content,
            })
        })
        .collect()
}

/// Convert internal Tool format to OpenAI's API tool specification
pub fn tools_to_openai_spec(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": sanitize_function_name(&tool.name),
                "description": tool.description,
                "parameters": tool.parameters,
            }
        }));
    }

    Ok(result)
}

/// Convert OpenAI's API response to a completion.
///
/// Native tool calls are folded into the same `FunctionCall` shape the model
/// writes by hand, so callers handle both paths alike.
pub fn openai_response_to_completion(response: &Value) -> Result<Completion> {
    let original = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| anyhow!("No message in response: {}", response))?;

    let mut completion = Completion::text(
        original
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default(),
    );

    if let Some(tool_calls) = original.get("tool_calls").and_then(Value::as_array) {
        for tool_call in tool_calls {
            let function_name = tool_call["function"]["name"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            if !is_valid_function_name(&function_name) {
                tracing::warn!("dropping tool call with invalid name '{}'", function_name);
                continue;
            }

            let arguments = tool_call["function"]["arguments"]
                .as_str()
                .unwrap_or("{}");
            match serde_json::from_str::<Value>(arguments) {
                Ok(arguments) => {
                    completion = completion
                        .with_function_call(FunctionCall::new(function_name, arguments));
                }
                Err(e) => {
                    tracing::warn!(
                        "could not interpret arguments for '{}': {}",
                        function_name,
                        e
                    );
                }
            }
        }
    }

    Ok(completion)
}

/// One line of a chat completion event stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Token(String),
    Done,
    Ignore,
}

pub fn parse_stream_line(line: &str) -> Result<StreamEvent> {
    let Some(data) = line.trim_end_matches('\r').strip_prefix("data:") else {
        return Ok(StreamEvent::Ignore);
    };
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(StreamEvent::Done);
    }
    if data.is_empty() {
        return Ok(StreamEvent::Ignore);
    }

    let chunk: Value = serde_json::from_str(data)?;
    if let Some(error) = chunk.get("error") {
        return Err(anyhow!("OpenAI API error: {}", error));
    }

    match chunk["choices"][0]["delta"]["content"].as_str() {
        Some(token) if !token.is_empty() => Ok(StreamEvent::Token(token.to_string())),
        _ => Ok(StreamEvent::Ignore),
    }
}

fn sanitize_function_name(name: &str) -> String {
    let re = Regex::new(r"[^a-zA-Z0-9_-]").unwrap();
    re.replace_all(name, "_").to_string()
}

fn is_valid_function_name(name: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
    re.is_match(name)
}

#[derive(Debug, thiserror::Error)]
#[error("Context length exceeded. Message: {0}")]
pub struct ContextLengthExceededError(String);

pub fn check_openai_context_length_error(error: &Value) -> Option<ContextLengthExceededError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(ContextLengthExceededError(message))
    } else {
        None
    }
}
