use std::path::PathBuf;
use std::time::Duration;

use crate::agent_engine::action::Action;
use crate::agent_engine::history::HistoryEntry;
use crate::perception::types::DeviceGeometry;

/// Lifecycle of one control-loop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopStatus {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
    Exhausted,
    Stopped,
}

/// Loop counters and outcome, written only by the engine.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct LoopState {
    pub task: Option<String>,
    pub current_step: u32,
    pub max_steps: u32,
    pub running: bool,
    pub last_action_signature: Option<String>,
    pub consecutive_capture_failures: u32,
    pub status: LoopStatus,
    pub last_action: Option<String>,
    pub last_rationale: Option<String>,
    /// Human-readable reason for the terminal status.
    pub outcome: Option<String>,
    pub geometry: Option<DeviceGeometry>,
}

/// What presentation surfaces see between steps.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct AgentSnapshot {
    pub state: LoopState,
    pub history: Vec<HistoryEntry>,
    pub logs: Vec<String>,
    pub screenshot_base64: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub max_steps: u32,
    pub history_window: usize,
    pub max_capture_failures: u32,
    pub capture_retry_delay: Duration,
    pub settle_long: Duration,
    pub settle_short: Duration,
    /// Where per-run JSONL history is written; `None` disables persistence.
    pub session_dir: Option<PathBuf>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_steps: 20,
            history_window: 5,
            max_capture_failures: 3,
            capture_retry_delay: Duration::from_secs(2),
            settle_long: Duration::from_millis(1_500),
            settle_short: Duration::from_millis(1_000),
            session_dir: None,
        }
    }
}

impl LoopConfig {
    /// Taps, text input and app launches trigger UI transitions that need longer to settle.
    pub fn settle_delay(&self, action: &Action) -> Duration {
        match action {
            Action::Tap { .. } | Action::Input { .. } | Action::Launch { .. } => self.settle_long,
            _ => self.settle_short,
        }
    }
}

/// Commands sent from presentation surfaces to the engine worker.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    GoalReceived(String),
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_delay_is_longer_after_tap_and_input() {
        let cfg = LoopConfig::default();
        assert_eq!(cfg.settle_delay(&Action::Tap { x: 0, y: 0 }), cfg.settle_long);
        assert_eq!(cfg.settle_delay(&Action::Input { text: "hi".into() }), cfg.settle_long);
        assert_eq!(cfg.settle_delay(&Action::Back), cfg.settle_short);
        assert_eq!(
            cfg.settle_delay(&Action::Swipe { x1: 0, y1: 0, x2: 0, y2: 9 }),
            cfg.settle_short
        );
        assert!(cfg.settle_long > cfg.settle_short);
    }
}
