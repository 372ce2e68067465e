use std::sync::Arc;

use super::agent::ImplementationAgent;
use super::checklist;
use crate::artifacts::{ArtifactStore, ArtifactUpdate, PLAN};
use crate::errors::{AgentError, AgentResult};
use crate::models::message::Message;
use crate::providers::base::Provider;

pub const ALL_COMPLETE: &str =
    "All milestones have been completed. Please provide new instructions or feedback.";

#[derive(Debug, Clone, PartialEq)]
pub enum MilestoneOutcome {
    /// Nothing left to do; no model call was made
    AllComplete(String),
    Completed {
        milestone: String,
        summary: String,
        /// Whether this step ticked the milestone in plan.md
        marked: bool,
    },
}

/// Drives the implementation agent through plan.md, one pending item per call
pub struct MilestoneTracker {
    agent: ImplementationAgent,
    store: Arc<dyn ArtifactStore>,
}

impl MilestoneTracker {
    pub fn new(provider: Arc<dyn Provider>, store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            agent: ImplementationAgent::new(provider, store.clone()),
            store,
        }
    }

    async fn read_plan(&self) -> AgentResult<String> {
        self.store
            .read(PLAN)
            .await
            .map_err(|e| AgentError::BackendUnavailable(e.to_string()))
    }

    /// Implement the first pending milestone and tick it off.
    ///
    /// The plan is read again after the agent runs, since the agent may have
    /// rewritten it. The tick lands only if the milestone's line is still
    /// pending there, word for word. The history only grows once the agent
    /// has run; a failed execution leaves it as it was.
    #[tracing::instrument(skip_all)]
    pub async fn advance(&self, history: &mut Vec<Message>) -> AgentResult<MilestoneOutcome> {
        let plan = self.read_plan().await?;
        let Some(milestone) = checklist::next_pending(&plan) else {
            tracing::info!("all milestones complete");
            return Ok(MilestoneOutcome::AllComplete(ALL_COMPLETE.to_string()));
        };

        tracing::info!(%milestone, "working on milestone");
        let mut working = history.clone();
        working.push(Message::system(format!(
            "Focus on implementing this milestone: {}",
            milestone
        )));
        let summary = self.agent.execute(&mut working).await?;
        *history = working;

        let current = self.read_plan().await?;
        let updated = checklist::mark_complete(&current, &milestone);
        let marked = updated != current;
        if marked {
            self.store
                .update(ArtifactUpdate::new(PLAN, updated))
                .await
                .map_err(|e| AgentError::BackendUnavailable(e.to_string()))?;
            tracing::info!(%milestone, "milestone completed");
        } else {
            tracing::warn!(%milestone, "milestone is no longer pending in plan.md, leaving it as is");
        }

        Ok(MilestoneOutcome::Completed {
            milestone,
            summary,
            marked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{MemoryArtifactStore, INDEX_HTML, UPDATE_ARTIFACT};
    use crate::models::function_call::FunctionCall;
    use crate::models::role::Role;
    use crate::providers::base::Completion;
    use crate::providers::mock::MockProvider;
    use serde_json::json;

    const PLAN_DOC: &str = "# Page\n- [ ] Build header\n- [ ] Build footer\n";

    fn tracker(provider: &MockProvider, store: &Arc<MemoryArtifactStore>) -> MilestoneTracker {
        MilestoneTracker::new(Arc::new(provider.clone()), store.clone())
    }

    #[tokio::test]
    async fn test_advance_marks_first_pending() -> AgentResult<()> {
        let provider = MockProvider::new(vec![Completion::text("Header done.")
            .with_function_call(FunctionCall::new(
                UPDATE_ARTIFACT,
                json!({"filename": "index.html", "contents": "<header></header>"}),
            ))]);
        let store = Arc::new(MemoryArtifactStore::new().with_file(PLAN, PLAN_DOC));
        let mut history = Vec::new();

        let outcome = tracker(&provider, &store).advance(&mut history).await?;

        assert_eq!(
            outcome,
            MilestoneOutcome::Completed {
                milestone: "Build header".into(),
                summary: "Header done.".into(),
                marked: true,
            }
        );
        assert_eq!(
            store.read(PLAN).await.unwrap(),
            "# Page\n- [x] Build header\n- [ ] Build footer\n"
        );
        assert_eq!(store.read(INDEX_HTML).await.unwrap(), "<header></header>");

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::System);
        assert_eq!(
            history[0].content,
            "Focus on implementing this milestone: Build header"
        );
        assert_eq!(history[1].content, "Header done.");
        Ok(())
    }

    #[tokio::test]
    async fn test_advance_walks_the_plan_in_order() -> AgentResult<()> {
        let provider = MockProvider::with_texts(&["Header done.", "Footer done."]);
        let store = Arc::new(MemoryArtifactStore::new().with_file(PLAN, PLAN_DOC));
        let tracker = tracker(&provider, &store);
        let mut history = Vec::new();

        tracker.advance(&mut history).await?;
        let second = tracker.advance(&mut history).await?;
        assert!(matches!(
            second,
            MilestoneOutcome::Completed { ref milestone, marked: true, .. } if milestone == "Build footer"
        ));
        assert_eq!(
            store.read(PLAN).await.unwrap(),
            "# Page\n- [x] Build header\n- [x] Build footer\n"
        );

        let third = tracker.advance(&mut history).await?;
        assert_eq!(third, MilestoneOutcome::AllComplete(ALL_COMPLETE.to_string()));
        assert_eq!(provider.calls(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_all_complete_makes_no_calls_or_writes() -> AgentResult<()> {
        let provider = MockProvider::default();
        let store = Arc::new(
            MemoryArtifactStore::new().with_file(PLAN, "- [x] Build header\n- [x] Build footer\n"),
        );
        let mut history = Vec::new();

        let outcome = tracker(&provider, &store).advance(&mut history).await?;

        assert_eq!(outcome, MilestoneOutcome::AllComplete(ALL_COMPLETE.to_string()));
        assert_eq!(provider.calls(), 0);
        assert!(store.writes().await.is_empty());
        assert!(history.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_plan_is_all_complete() -> AgentResult<()> {
        let provider = MockProvider::default();
        let store = Arc::new(MemoryArtifactStore::new());

        let outcome = tracker(&provider, &store).advance(&mut Vec::new()).await?;
        assert!(matches!(outcome, MilestoneOutcome::AllComplete(_)));
        assert_eq!(provider.calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_rewritten_milestone_is_left_alone() -> AgentResult<()> {
        let rewritten = "# Page\n- [ ] Build header and nav\n- [ ] Build footer\n";
        let provider = MockProvider::new(vec![Completion::text("Reworded the plan.")
            .with_function_call(FunctionCall::new(
                UPDATE_ARTIFACT,
                json!({"filename": "plan.md", "contents": rewritten}),
            ))]);
        let store = Arc::new(MemoryArtifactStore::new().with_file(PLAN, PLAN_DOC));

        let outcome = tracker(&provider, &store).advance(&mut Vec::new()).await?;

        assert!(matches!(outcome, MilestoneOutcome::Completed { marked: false, .. }));
        assert_eq!(store.read(PLAN).await.unwrap(), rewritten);
        // Only the agent's own write happened
        assert_eq!(store.writes().await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_agent_ticked_milestone_itself() -> AgentResult<()> {
        let ticked = "# Page\n- [x] Build header\n- [ ] Build footer\n";
        let provider = MockProvider::new(vec![Completion::text("Done.").with_function_call(
            FunctionCall::new(UPDATE_ARTIFACT, json!({"filename": "plan.md", "contents": ticked})),
        )]);
        let store = Arc::new(MemoryArtifactStore::new().with_file(PLAN, PLAN_DOC));

        let outcome = tracker(&provider, &store).advance(&mut Vec::new()).await?;

        assert!(matches!(outcome, MilestoneOutcome::Completed { marked: false, .. }));
        assert_eq!(store.read(PLAN).await.unwrap(), ticked);
        assert_eq!(store.writes().await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_backend_failure_leaves_plan_pending() {
        let provider = MockProvider::default();
        let store = Arc::new(MemoryArtifactStore::new().with_file(PLAN, PLAN_DOC));

        let mut history = vec![Message::user("Build the page")];

        let result = tracker(&provider, &store).advance(&mut history).await;

        assert!(matches!(result, Err(AgentError::BackendUnavailable(_))));
        assert_eq!(store.read(PLAN).await.unwrap(), PLAN_DOC);
        assert!(store.writes().await.is_empty());
        assert_eq!(history, vec![Message::user("Build the page")]);
    }

    #[tokio::test]
    async fn test_retry_after_failure_has_one_directive() -> AgentResult<()> {
        let store = Arc::new(MemoryArtifactStore::new().with_file(PLAN, PLAN_DOC));
        let mut history = Vec::new();

        let failing = MockProvider::default();
        assert!(tracker(&failing, &store).advance(&mut history).await.is_err());

        let provider = MockProvider::with_texts(&["Header done."]);
        tracker(&provider, &store).advance(&mut history).await?;

        let directives = history
            .iter()
            .filter(|m| m.content.starts_with("Focus on implementing this milestone"))
            .count();
        assert_eq!(directives, 1);
        assert_eq!(history.len(), 2);
        Ok(())
    }
}
