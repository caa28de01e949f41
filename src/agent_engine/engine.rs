use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::agent_engine::action::Action;
use crate::agent_engine::handle::RunControl;
use crate::agent_engine::history::{HistoryEntry, OperatorLog, SessionHistory};
use crate::agent_engine::loop_control::LoopController;
use crate::agent_engine::state::{AgentEvent, AgentSnapshot, LoopConfig, LoopState, LoopStatus};
use crate::executor::dispatcher::ActionExecutor;
use crate::llm::decision::DecisionClient;
use crate::perception::screenshot::ScreenObserver;

/// Owns the perception-decide-act loop. Runs on its own task; everything
/// outside reads the published `AgentSnapshot`.
pub struct AgentEngine {
    observer: ScreenObserver,
    decider: DecisionClient,
    executor: ActionExecutor,
    config: LoopConfig,
    loop_ctrl: LoopController,
    history: SessionHistory,
    log: OperatorLog,
    state: LoopState,
    screenshot: Option<String>,
    state_tx: watch::Sender<AgentSnapshot>,
    control: Arc<RunControl>,
}

impl AgentEngine {
    pub fn new(
        observer: ScreenObserver,
        decider: DecisionClient,
        executor: ActionExecutor,
        config: LoopConfig,
    ) -> Self {
        let state = LoopState {
            max_steps: config.max_steps,
            ..LoopState::default()
        };
        let (state_tx, _) = watch::channel(AgentSnapshot {
            state: state.clone(),
            ..AgentSnapshot::default()
        });
        Self {
            observer,
            decider,
            executor,
            loop_ctrl: LoopController::new(&config),
            history: SessionHistory::new(None),
            config,
            log: OperatorLog::default(),
            state,
            screenshot: None,
            state_tx,
            control: Arc::new(RunControl::default()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AgentSnapshot> {
        self.state_tx.subscribe()
    }

    pub fn control(&self) -> Arc<RunControl> {
        self.control.clone()
    }

    pub fn executor(&self) -> &ActionExecutor {
        &self.executor
    }

    /// Serve goals until `Shutdown` or until every sender is dropped.
    pub async fn run_loop(mut self, mut event_rx: mpsc::Receiver<AgentEvent>) {
        while let Some(event) = event_rx.recv().await {
            match event {
                AgentEvent::GoalReceived(task) => {
                    let status = self.run_task(&task).await;
                    tracing::info!(?status, session = %self.history.session_id, "task finished");
                    self.control.release();
                    // republish so waiters observe the released claim
                    self.publish();
                }
                AgentEvent::Shutdown => break,
            }
        }
        tracing::info!("agent engine exited");
    }

    /// Drive one task to a terminal status.
    pub async fn run_task(&mut self, task: &str) -> LoopStatus {
        self.history = SessionHistory::new(self.config.session_dir.as_deref());
        self.log.clear();
        self.loop_ctrl.begin();
        self.screenshot = None;
        self.state = LoopState {
            task: Some(task.to_string()),
            running: true,
            status: LoopStatus::Running,
            geometry: self.observer.geometry(),
            ..LoopState::default()
        };
        self.loop_ctrl.write_into(&mut self.state);

        tracing::info!(
            task = %task,
            session = %self.history.session_id,
            max_steps = self.config.max_steps,
            "task started"
        );
        self.log.push(format!("task: {task}"));
        self.publish();

        let (status, outcome) = self.drive(task).await;
        self.finish(status, outcome)
    }

    async fn drive(&mut self, task: &str) -> (LoopStatus, String) {
        let max_steps = self.config.max_steps;
        loop {
            // ── Stop check at the step boundary ───────────────────────────
            if self.control.stop_requested() {
                return (LoopStatus::Stopped, "stopped by operator".into());
            }

            // ── Observe ───────────────────────────────────────────────────
            let screen = match self.observer.capture().await {
                Ok(screen) => {
                    self.loop_ctrl.record_capture_success();
                    screen
                }
                Err(e) => {
                    let tripped = self.loop_ctrl.record_capture_failure();
                    let failures = self.loop_ctrl.capture_failures();
                    tracing::warn!(failures, error = %e, "screen capture failed");
                    self.log.push(format!(
                        "screenshot failed ({failures}/{}): {e}",
                        self.config.max_capture_failures
                    ));
                    self.loop_ctrl.write_into(&mut self.state);
                    self.publish();
                    if tripped {
                        return (
                            LoopStatus::Failed,
                            format!("screen capture failed {failures} times in a row"),
                        );
                    }
                    tokio::time::sleep(self.config.capture_retry_delay).await;
                    continue;
                }
            };

            let step = self.loop_ctrl.current_step();
            self.state.geometry = Some(screen.geometry());
            self.screenshot = Some(screen.image_base64.clone());
            self.loop_ctrl.write_into(&mut self.state);
            self.log.push(format!("step {step}/{max_steps}: asking model"));
            self.publish();

            // ── Decide ────────────────────────────────────────────────────
            let recent = self.history.tail(self.config.history_window);
            let proposal = self.decider.decide(&screen, task, &recent).await;
            drop(screen);
            let proposal = self.loop_ctrl.guard_repetition(proposal);

            let summary = proposal.action.signature();
            tracing::info!(step, action = %summary, rationale = %proposal.rationale, "step decided");
            self.history
                .push(HistoryEntry::new(step, summary.clone(), proposal.rationale.clone()));
            if let Err(e) = self.history.flush() {
                tracing::warn!(error = %e, "failed to persist history entry");
            }
            self.state.last_action = Some(summary.clone());
            self.state.last_rationale = Some(proposal.rationale.clone());
            self.loop_ctrl.write_into(&mut self.state);
            self.log.push(format!("step {step}: {summary} | {}", proposal.rationale));
            self.publish();

            // ── Act ───────────────────────────────────────────────────────
            match &proposal.action {
                Action::Done => {
                    let outcome = if proposal.rationale.is_empty() {
                        "task completed".to_string()
                    } else {
                        proposal.rationale.clone()
                    };
                    return (LoopStatus::Succeeded, outcome);
                }
                Action::Failed => {
                    return (
                        LoopStatus::Failed,
                        format!("model gave up: {}", proposal.rationale),
                    );
                }
                action => {
                    let geometry = self.observer.geometry();
                    if !self.executor.execute(action, geometry).await {
                        self.log.push(format!("step {step}: {summary} was not delivered"));
                    }
                }
            }

            if self.loop_ctrl.advance() {
                return (
                    LoopStatus::Exhausted,
                    format!("step budget of {max_steps} exhausted"),
                );
            }
            self.loop_ctrl.write_into(&mut self.state);
            self.publish();

            tokio::time::sleep(self.config.settle_delay(&proposal.action)).await;
        }
    }

    fn finish(&mut self, status: LoopStatus, outcome: String) -> LoopStatus {
        self.loop_ctrl.write_into(&mut self.state);
        self.state.status = status;
        self.state.running = false;
        self.log.push(format!("{status:?}: {outcome}"));
        match status {
            LoopStatus::Succeeded => tracing::info!(outcome = %outcome, "task succeeded"),
            _ => tracing::warn!(?status, outcome = %outcome, "task did not succeed"),
        }
        self.state.outcome = Some(outcome);
        self.publish();
        status
    }

    fn publish(&self) {
        self.state_tx.send_replace(AgentSnapshot {
            state: self.state.clone(),
            history: self.history.entries(),
            logs: self.log.lines(),
            screenshot_base64: self.screenshot.clone(),
        });
    }
}
