use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;

use crate::dispatcher::{Dispatch, Dispatcher};
use crate::errors::{AgentError, AgentResult};
use crate::models::function_call::{FunctionCall, Reply};
use crate::models::message::Message;
use crate::models::tool::Tool;
use crate::prompt_template::load_prompt_file;
use crate::providers::base::Provider;
use crate::session::{Session, SessionStore};

/// Function calls allowed in one turn before the loop gives up
pub const MAX_ITERATIONS: usize = 10;

/// How a turn ended
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    /// The model answered in prose
    Reply(String),
    /// A recovered error the user should see
    Notice(String),
    /// The user approved a purchase; finalizing it is not supported yet
    AwaitingFinalization(FunctionCall),
}

impl Turn {
    /// Text to show the user, if the turn produced any
    pub fn text(&self) -> Option<&str> {
        match self {
            Turn::Reply(text) | Turn::Notice(text) => Some(text.as_str()),
            Turn::AwaitingFinalization(_) => None,
        }
    }
}

#[derive(Serialize)]
struct PromptContext {
    tools: Vec<Tool>,
}

/// Drives one chat turn: ask the model, run any function it calls, ask again
pub struct Conversation {
    provider: Arc<dyn Provider>,
    dispatcher: Dispatcher,
    sessions: Arc<dyn SessionStore>,
    max_iterations: usize,
}

impl Conversation {
    pub fn new(
        provider: Arc<dyn Provider>,
        dispatcher: Dispatcher,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            provider,
            dispatcher,
            sessions,
            max_iterations: MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn system_prompt(&self) -> AgentResult<String> {
        let context = PromptContext {
            tools: self.dispatcher.tools(),
        };
        load_prompt_file("system.md", &context).map_err(|e| AgentError::Internal(e.to_string()))
    }

    /// Resume a stored session, or start a new one seeded with the system prompt
    pub async fn open_session(&self, id: &str) -> AgentResult<Session> {
        let stored = self
            .sessions
            .load(id)
            .await
            .map_err(|e| AgentError::Storage(e.to_string()))?;

        match stored {
            Some(messages) if !messages.is_empty() => Ok(Session {
                id: id.to_string(),
                messages,
            }),
            _ => Ok(Session::new(id, &self.system_prompt()?)),
        }
    }

    /// Run one turn for `user_text`, streaming reply fragments to `on_token`.
    ///
    /// The turn works on a copy of the history. The session is only updated,
    /// and persisted, once the turn reaches an end; a turn that fails or is
    /// dropped midway leaves the session as it was.
    #[tracing::instrument(skip_all, fields(session = %session.id))]
    pub async fn reply<F>(
        &self,
        session: &mut Session,
        user_text: &str,
        mut on_token: F,
    ) -> AgentResult<Turn>
    where
        F: FnMut(&str) + Send,
    {
        let mut messages = session.messages.clone();
        messages.push(Message::user(user_text));

        for iteration in 0..self.max_iterations {
            let text = self.generate(&messages, &mut on_token).await?;

            let call = match Reply::classify(&text) {
                Ok(Reply::PlainMessage { text }) => {
                    messages.push(Message::assistant(text.clone()));
                    return self.commit(session, messages, Turn::Reply(text)).await;
                }
                Ok(Reply::FunctionCall(call)) => call,
                Err(e) => {
                    messages.push(Message::assistant(text.trim()));
                    return self.notice(session, messages, e).await;
                }
            };

            tracing::debug!(iteration, function = %call.function_name, "model requested a function call");
            messages.push(Message::assistant(text.trim()));

            match self.dispatcher.dispatch(&call).await {
                Ok(Dispatch::Observe(observation)) => {
                    messages.push(Message::system(observation));
                }
                Ok(Dispatch::Halt) => {
                    return self
                        .commit(session, messages, Turn::AwaitingFinalization(call))
                        .await;
                }
                Err(e) => return self.notice(session, messages, e).await,
            }
        }

        let limit = AgentError::LoopLimitExceeded(self.max_iterations);
        tracing::warn!("{}", limit);
        self.notice(session, messages, limit).await
    }

    async fn generate(
        &self,
        messages: &[Message],
        on_token: &mut (dyn FnMut(&str) + Send),
    ) -> AgentResult<String> {
        let mut stream = self
            .provider
            .stream(messages)
            .await
            .map_err(|e| AgentError::BackendUnavailable(e.to_string()))?;

        let mut text = String::new();
        while let Some(token) = stream.next().await {
            let token = token.map_err(|e| AgentError::BackendUnavailable(e.to_string()))?;
            on_token(&token);
            text.push_str(&token);
        }
        Ok(text)
    }

    /// Record a recovered error as an observation and show it to the user
    async fn notice(
        &self,
        session: &mut Session,
        mut messages: Vec<Message>,
        error: AgentError,
    ) -> AgentResult<Turn> {
        let text = error.to_string();
        tracing::info!("ending turn with notice: {}", text);
        messages.push(Message::system(text.clone()));
        messages.push(Message::assistant(text.clone()));
        self.commit(session, messages, Turn::Notice(text)).await
    }

    async fn commit(
        &self,
        session: &mut Session,
        messages: Vec<Message>,
        turn: Turn,
    ) -> AgentResult<Turn> {
        self.sessions
            .save(&session.id, &messages)
            .await
            .map_err(|e| AgentError::Storage(e.to_string()))?;
        session.messages = messages;
        Ok(turn)
    }
}
