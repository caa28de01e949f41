use std::fmt;

use serde::{Deserialize, Serialize};

/// The fixed action vocabulary. Each variant carries exactly the fields it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "params", rename_all = "snake_case")]
pub enum Action {
    Tap { x: i32, y: i32 },
    Swipe { x1: i32, y1: i32, x2: i32, y2: i32 },
    Input { text: String },
    Launch { app: String },
    Back,
    Home,
    Done,
    Wait,
    Failed,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Tap { .. } => "tap",
            Action::Swipe { .. } => "swipe",
            Action::Input { .. } => "input",
            Action::Launch { .. } => "launch",
            Action::Back => "back",
            Action::Home => "home",
            Action::Done => "done",
            Action::Wait => "wait",
            Action::Failed => "failed",
        }
    }

    /// Done and Wait may legitimately repeat back to back.
    pub fn exempt_from_repetition_guard(&self) -> bool {
        matches!(self, Action::Done | Action::Wait)
    }

    /// Canonical `(kind, params)` key used for repetition detection.
    pub fn signature(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Tap { x, y } => write!(f, "tap({x}, {y})"),
            Action::Swipe { x1, y1, x2, y2 } => write!(f, "swipe({x1}, {y1} -> {x2}, {y2})"),
            Action::Input { text } => write!(f, "input({text:?})"),
            Action::Launch { app } => write!(f, "launch({app:?})"),
            other => f.write_str(other.name()),
        }
    }
}

/// A validated action plus the model's stated reasoning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionProposal {
    #[serde(flatten)]
    pub action: Action,
    pub rationale: String,
}

impl ActionProposal {
    pub fn new(action: Action, rationale: impl Into<String>) -> Self {
        Self {
            action,
            rationale: rationale.into(),
        }
    }

    pub fn wait(rationale: impl Into<String>) -> Self {
        Self::new(Action::Wait, rationale)
    }

    pub fn failed(rationale: impl Into<String>) -> Self {
        Self::new(Action::Failed, rationale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_distinguishes_params() {
        let a = Action::Tap { x: 10, y: 20 };
        let b = Action::Tap { x: 10, y: 21 };
        assert_eq!(a.signature(), Action::Tap { x: 10, y: 20 }.signature());
        assert_ne!(a.signature(), b.signature());
        assert_ne!(
            Action::Input { text: "a".into() }.signature(),
            Action::Launch { app: "a".into() }.signature()
        );
    }

    #[test]
    fn serializes_as_action_and_params() {
        let proposal = ActionProposal::new(Action::Tap { x: 1, y: 2 }, "press ok");
        let json = serde_json::to_value(&proposal).unwrap();
        assert_eq!(json["action"], "tap");
        assert_eq!(json["params"]["x"], 1);
        assert_eq!(json["rationale"], "press ok");

        let back = serde_json::to_value(Action::Back).unwrap();
        assert_eq!(back, serde_json::json!({"action": "back"}));
    }

    #[test]
    fn repetition_exemptions() {
        assert!(Action::Done.exempt_from_repetition_guard());
        assert!(Action::Wait.exempt_from_repetition_guard());
        assert!(!Action::Failed.exempt_from_repetition_guard());
    }
}
