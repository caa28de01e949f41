// Presentation-facing handle: start / stop / state / manual actions.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::agent_engine::action::Action;
use crate::agent_engine::engine::AgentEngine;
use crate::agent_engine::state::{AgentEvent, AgentSnapshot, LoopStatus};
use crate::errors::{PhoneClawError, PhoneClawResult};
use crate::executor::dispatcher::ActionExecutor;
use crate::perception::screenshot::decode_screen;

/// Flags shared between the engine worker and its handles.
#[derive(Debug, Default)]
pub struct RunControl {
    busy: AtomicBool,
    stop: AtomicBool,
}

impl RunControl {
    /// Claim the device for a run or a manual action. Fails if already claimed.
    pub fn try_acquire(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn claim(&self) -> Option<BusyClaim<'_>> {
        self.try_acquire().then_some(BusyClaim { control: self })
    }

    pub fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn clear_stop(&self) {
        self.stop.store(false, Ordering::Release);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }
}

/// Releases the busy claim on drop.
pub struct BusyClaim<'a> {
    control: &'a RunControl,
}

impl Drop for BusyClaim<'_> {
    fn drop(&mut self) {
        self.control.release();
    }
}

#[derive(Clone)]
pub struct AgentHandle {
    tx: mpsc::Sender<AgentEvent>,
    state_rx: watch::Receiver<AgentSnapshot>,
    control: Arc<RunControl>,
    executor: ActionExecutor,
}

/// Move the engine onto its own task and return a handle to drive it.
pub fn spawn_engine(engine: AgentEngine) -> (AgentHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel::<AgentEvent>(8);
    let handle = AgentHandle {
        tx,
        state_rx: engine.subscribe(),
        control: engine.control(),
        executor: engine.executor().clone(),
    };
    tracing::info!("spawning agent engine task");
    let join = tokio::spawn(engine.run_loop(rx));
    (handle, join)
}

impl AgentHandle {
    /// Start a run. Rejected, never queued, while a run or manual action holds the device.
    pub async fn start(&self, task: &str) -> PhoneClawResult<()> {
        let task = task.trim();
        if task.is_empty() {
            return Err(PhoneClawError::Agent("task must not be empty".into()));
        }
        if !self.control.try_acquire() {
            tracing::warn!(task = %task, "start rejected, agent busy");
            return Err(PhoneClawError::Busy);
        }
        self.control.clear_stop();
        if self.tx.send(AgentEvent::GoalReceived(task.to_string())).await.is_err() {
            self.control.release();
            return Err(PhoneClawError::Agent("agent engine is not running".into()));
        }
        Ok(())
    }

    /// Ask the running loop to stop at its next step boundary.
    /// Returns false (and does nothing) when nothing is running.
    pub fn stop(&self) -> bool {
        if !self.state_rx.borrow().state.running && !self.control.is_busy() {
            return false;
        }
        tracing::info!("stop requested");
        self.control.request_stop();
        true
    }

    pub fn state(&self) -> AgentSnapshot {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AgentSnapshot> {
        self.state_rx.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.control.is_busy()
    }

    /// Wait until the current claim is released and return the last terminal status.
    pub async fn wait_finished(&self) -> LoopStatus {
        let mut rx = self.state_rx.clone();
        loop {
            let status = rx.borrow_and_update().state.status;
            if !self.control.is_busy() && status != LoopStatus::Running {
                return status;
            }
            if rx.changed().await.is_err() {
                return rx.borrow().state.status;
            }
        }
    }

    /// Dispatch one operator action outside the loop. Rejected while the device is claimed.
    pub async fn manual(&self, action: Action) -> PhoneClawResult<bool> {
        let Some(_claim) = self.control.claim() else {
            tracing::warn!(action = %action, "manual action rejected, agent busy");
            return Err(PhoneClawError::Busy);
        };
        let geometry = self.state_rx.borrow().state.geometry;
        tracing::info!(action = %action, "manual action");
        Ok(self.executor.execute(&action, geometry).await)
    }

    /// Fresh read-only screenshot as base64 PNG.
    pub async fn capture_preview(&self) -> PhoneClawResult<String> {
        let raw = self.executor.device().screenshot().await?;
        Ok(decode_screen(raw)?.image_base64)
    }

    /// Whether the device helper answers and accessibility is enabled.
    pub async fn check_device(&self) -> bool {
        match self.executor.device().status().await {
            Ok(status) => status.accessibility_enabled,
            Err(e) => {
                tracing::debug!(error = %e, "device check failed");
                false
            }
        }
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(AgentEvent::Shutdown).await;
    }
}
