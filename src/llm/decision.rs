use std::sync::Arc;

use crate::agent_engine::action::ActionProposal;
use crate::agent_engine::history::HistoryEntry;
use crate::llm::action_parser::parse_action;
use crate::llm::prompt::build_decision_prompt;
use crate::llm::provider::VisionModel;
use crate::perception::types::ScreenState;

/// Asks the vision model for the next action given the current frame.
pub struct DecisionClient {
    model: Arc<dyn VisionModel>,
    history_window: usize,
    app_names: Vec<String>,
}

impl DecisionClient {
    pub fn new(model: Arc<dyn VisionModel>, history_window: usize, app_names: Vec<String>) -> Self {
        Self {
            model,
            history_window,
            app_names,
        }
    }

    /// Never fails: model or transport errors come back as a `Wait` carrying the error.
    pub async fn decide(&self, screen: &ScreenState, task: &str, history: &[HistoryEntry]) -> ActionProposal {
        let tail = &history[history.len().saturating_sub(self.history_window)..];
        let prompt = build_decision_prompt(task, screen.width, screen.height, tail, &self.app_names);

        tracing::info!(
            model = %self.model.name(),
            history = tail.len(),
            width = screen.width,
            height = screen.height,
            "requesting next action"
        );

        match self.model.complete(&prompt, &screen.image_base64).await {
            Ok(reply) => {
                tracing::debug!(reply = %reply, "model reply");
                parse_action(&reply)
            }
            Err(e) => {
                tracing::warn!(error = %e, "model call failed, waiting this step");
                ActionProposal::wait(format!("model request failed: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent_engine::action::Action;
    use crate::errors::PhoneClawError;
    use crate::perception::screenshot::decode_screen;
    use crate::test_support::{png_base64, FakeModel};

    fn screen() -> ScreenState {
        decode_screen(png_base64(120, 260)).unwrap()
    }

    #[tokio::test]
    async fn parses_model_reply() {
        let model = Arc::new(FakeModel::new(
            "```json\n{\"action\":\"tap\",\"params\":{\"x\":60,\"y\":130},\"thought\":\"centre\"}\n```",
        ));
        let client = DecisionClient::new(model.clone(), 5, vec![]);

        let p = client.decide(&screen(), "tap the middle", &[]).await;
        assert_eq!(p.action, Action::Tap { x: 60, y: 130 });
        assert_eq!(p.rationale, "centre");

        let prompt = &model.prompts()[0];
        assert!(prompt.contains("120 x 260"));
        assert!(prompt.contains("tap the middle"));
    }

    #[tokio::test]
    async fn only_recent_history_reaches_the_prompt() {
        let model = Arc::new(FakeModel::new("{\"action\":\"wait\"}"));
        let client = DecisionClient::new(model.clone(), 5, vec![]);
        let history: Vec<HistoryEntry> = (1..=8)
            .map(|s| HistoryEntry::new(s, format!("tap({s}, {s})"), format!("reason {s}")))
            .collect();

        client.decide(&screen(), "t", &history).await;
        let prompt = &model.prompts()[0];
        assert!(!prompt.contains("step 3:"));
        for s in 4..=8 {
            assert!(prompt.contains(&format!("- step {s}: tap({s}, {s}): reason {s}")), "{s}");
        }
    }

    #[tokio::test]
    async fn model_error_degrades_to_wait() {
        let model = Arc::new(
            FakeModel::new("{\"action\":\"done\"}")
                .reply_err(PhoneClawError::LlmProvider("503 Service Unavailable: overloaded".into())),
        );
        let client = DecisionClient::new(model, 5, vec![]);

        let p = client.decide(&screen(), "t", &[]).await;
        assert_eq!(p.action, Action::Wait);
        assert!(p.rationale.contains("overloaded"), "{}", p.rationale);

        // next call is unaffected
        assert_eq!(client.decide(&screen(), "t", &[]).await.action, Action::Done);
    }
}
