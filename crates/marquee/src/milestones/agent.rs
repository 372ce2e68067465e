use serde::Serialize;
use std::sync::Arc;

use crate::artifacts::{ArtifactStore, ArtifactUpdate, ARTIFACTS, UPDATE_ARTIFACT};
use crate::errors::{AgentError, AgentResult};
use crate::models::function_call::{FunctionCall, Reply};
use crate::models::message::Message;
use crate::prompt_template::load_prompt_file;
use crate::providers::base::Provider;

#[derive(Serialize)]
struct ArtifactView {
    name: &'static str,
    contents: String,
}

#[derive(Serialize)]
struct ImplementationContext {
    artifacts: Vec<ArtifactView>,
}

/// Runs one implementation step against the artifact store: shows the model
/// every artifact, applies the `updateArtifact` calls it makes and records its
/// summary in the history.
pub struct ImplementationAgent {
    provider: Arc<dyn Provider>,
    store: Arc<dyn ArtifactStore>,
}

impl ImplementationAgent {
    pub fn new(provider: Arc<dyn Provider>, store: Arc<dyn ArtifactStore>) -> Self {
        Self { provider, store }
    }

    async fn system_prompt(&self) -> AgentResult<String> {
        let mut artifacts = Vec::with_capacity(ARTIFACTS.len());
        for name in ARTIFACTS {
            let contents = self
                .store
                .read(name)
                .await
                .map_err(|e| AgentError::BackendUnavailable(e.to_string()))?;
            artifacts.push(ArtifactView { name, contents });
        }
        load_prompt_file("implementation.md", &ImplementationContext { artifacts })
            .map_err(|e| AgentError::Internal(e.to_string()))
    }

    pub async fn execute(&self, history: &mut Vec<Message>) -> AgentResult<String> {
        let mut messages = vec![Message::system(self.system_prompt().await?)];
        messages.extend(history.iter().cloned());

        let (completion, usage) = self
            .provider
            .complete(&messages, &[ArtifactUpdate::tool()])
            .await
            .map_err(|e| AgentError::BackendUnavailable(e.to_string()))?;
        tracing::debug!(?usage, "implementation step completed");

        let mut calls = completion.function_calls;
        let mut text = completion.text;
        // Models without native tool support answer with the call as a JSON document
        match Reply::classify(&text) {
            Ok(Reply::FunctionCall(call)) => {
                calls.push(call);
                text.clear();
            }
            Ok(Reply::PlainMessage { .. }) => {}
            Err(e) => {
                tracing::warn!(reply = %text.trim(), "ignoring malformed function call: {}", e);
                text = e.to_string();
            }
        }

        let mut updated = Vec::new();
        for call in &calls {
            if let Some(filename) = self.apply(call).await? {
                updated.push(filename);
            }
        }

        let summary = if !text.trim().is_empty() {
            text.trim().to_string()
        } else if updated.is_empty() {
            "No changes were made.".to_string()
        } else {
            format!("Updated {}.", updated.join(", "))
        };
        history.push(Message::assistant(summary.clone()));
        Ok(summary)
    }

    async fn apply(&self, call: &FunctionCall) -> AgentResult<Option<String>> {
        if call.function_name != UPDATE_ARTIFACT {
            tracing::warn!(function = %call.function_name, "ignoring unsupported function call");
            return Ok(None);
        }
        let update = match ArtifactUpdate::from_call(call) {
            Ok(update) => update,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed artifact update");
                return Ok(None);
            }
        };
        let ack = self
            .store
            .update(update)
            .await
            .map_err(|e| AgentError::BackendUnavailable(e.to_string()))?;
        tracing::info!(filename = %ack.filename, bytes = ack.bytes, "artifact updated");
        Ok(Some(ack.filename))
    }
}
