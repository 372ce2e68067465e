use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{AgentError, AgentResult};

/// A function invocation written by the model as its entire reply:
/// `{"function_name": ..., "arguments": {...}, "rationale": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub function_name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl FunctionCall {
    pub fn new<S: Into<String>>(function_name: S, arguments: Value) -> Self {
        let arguments = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            function_name: function_name.into(),
            arguments,
            rationale: None,
        }
    }

    pub fn with_rationale<S: Into<String>>(mut self, rationale: S) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    /// A string argument, if present and non-blank
    pub fn argument(&self, name: &str) -> Option<&str> {
        self.arguments
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// An argument rendered as text, exactly as passed. Strings come back
    /// unquoted, other scalars in their JSON form. Missing, null, blank and
    /// structured values give `None`.
    pub fn argument_text(&self, name: &str) -> Option<String> {
        match self.arguments.get(name)? {
            Value::String(value) if value.trim().is_empty() => None,
            Value::String(value) => Some(value.clone()),
            value @ (Value::Number(_) | Value::Bool(_)) => Some(value.to_string()),
            _ => None,
        }
    }

    pub fn rationale(&self) -> &str {
        self.rationale.as_deref().unwrap_or_default()
    }
}

/// What an assistant reply turned out to be
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    PlainMessage { text: String },
    FunctionCall(FunctionCall),
}

impl Reply {
    /// Classify a complete assistant reply.
    ///
    /// Only replies whose trimmed text starts with `{` are candidates for a call.
    /// Text that fails to decode as JSON is conversation, not an error. A JSON
    /// object without a string `function_name` is a malformed call.
    pub fn classify(text: &str) -> AgentResult<Reply> {
        let trimmed = text.trim();
        if !trimmed.starts_with('{') {
            return Ok(Reply::PlainMessage {
                text: text.to_string(),
            });
        }

        let value: Value = match serde_json::from_str(trimmed) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("reply looked like JSON but did not decode: {}", e);
                return Ok(Reply::PlainMessage {
                    text: text.to_string(),
                });
            }
        };

        if !value.get("function_name").is_some_and(Value::is_string) {
            return Err(AgentError::MalformedCall);
        }

        serde_json::from_value(value)
            .map(Reply::FunctionCall)
            .map_err(|_| AgentError::MalformedCall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_text() {
        let reply = Reply::classify("Here are tonight's movies.").unwrap();
        assert_eq!(
            reply,
            Reply::PlainMessage {
                text: "Here are tonight's movies.".to_string()
            }
        );
    }

    #[test]
    fn test_plain_text_is_kept_verbatim() {
        let reply = Reply::classify("  Sure thing!\n").unwrap();
        assert_eq!(
            reply,
            Reply::PlainMessage {
                text: "  Sure thing!\n".to_string()
            }
        );
    }

    #[test]
    fn test_undecodable_json_is_plain() {
        let reply = Reply::classify("{ this is not json").unwrap();
        assert!(matches!(reply, Reply::PlainMessage { .. }));

        let reply = Reply::classify(r#"{"function_name": "x"} and some prose"#).unwrap();
        assert!(matches!(reply, Reply::PlainMessage { .. }));
    }

    #[test]
    fn test_missing_function_name() {
        let result = Reply::classify(r#"{"arguments": {"location": "Chicago, IL"}}"#);
        assert_eq!(result, Err(AgentError::MalformedCall));
    }

    #[test]
    fn test_function_name_must_be_a_string() {
        let result = Reply::classify(r#"{"function_name": 7}"#);
        assert_eq!(result, Err(AgentError::MalformedCall));

        let result = Reply::classify(r#"{"function_name": "get_showtimes", "arguments": []}"#);
        assert_eq!(result, Err(AgentError::MalformedCall));
    }

    #[test]
    fn test_function_call() {
        let text = r#"
            {"function_name": "get_now_playing_movies",
             "arguments": {"location": "Chicago, IL"},
             "rationale": "user asked"}
        "#;
        let Reply::FunctionCall(call) = Reply::classify(text).unwrap() else {
            panic!("expected a function call");
        };
        assert_eq!(call.function_name, "get_now_playing_movies");
        assert_eq!(call.argument("location"), Some("Chicago, IL"));
        assert_eq!(call.rationale(), "user asked");
    }

    #[test]
    fn test_argument_text() {
        let call = FunctionCall::new(
            "buy_ticket",
            json!({"showtime": 1930, "movie": " Barbie ", "theater": "", "seats": [1, 2], "vip": true}),
        );
        assert_eq!(call.argument_text("showtime"), Some("1930".to_string()));
        assert_eq!(call.argument_text("movie"), Some(" Barbie ".to_string()));
        assert_eq!(call.argument_text("vip"), Some("true".to_string()));
        assert_eq!(call.argument_text("theater"), None);
        assert_eq!(call.argument_text("seats"), None);
        assert_eq!(call.argument_text("location"), None);
    }

    #[test]
    fn test_arguments_default_to_empty() {
        let Reply::FunctionCall(call) =
            Reply::classify(r#"{"function_name": "get_now_playing_movies"}"#).unwrap()
        else {
            panic!("expected a function call");
        };
        assert!(call.arguments.is_empty());
        assert_eq!(call.rationale, None);
    }

    #[test]
    fn test_serialization_skips_missing_rationale() -> anyhow::Result<()> {
        let call = FunctionCall::new("buy_ticket", json!({"movie": "Up"}));
        let value = serde_json::to_value(&call)?;
        assert_eq!(
            value,
            json!({"function_name": "buy_ticket", "arguments": {"movie": "Up"}})
        );
        Ok(())
    }
}
