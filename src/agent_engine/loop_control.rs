// Loop control: step budget, capture-failure breaker and repetition guard.
use crate::agent_engine::action::{Action, ActionProposal};
use crate::agent_engine::state::{LoopConfig, LoopState};

pub const REPETITION_SUPPRESSED: &str = "repetition suppressed";

pub struct LoopController {
    max_steps: u32,
    max_capture_failures: u32,
    current_step: u32,
    capture_failures: u32,
    last_signature: Option<String>,
}

impl LoopController {
    pub fn new(config: &LoopConfig) -> Self {
        Self {
            max_steps: config.max_steps,
            max_capture_failures: config.max_capture_failures,
            current_step: 0,
            capture_failures: 0,
            last_signature: None,
        }
    }

    /// Reset counters for a fresh run; the first step is step 1.
    pub fn begin(&mut self) {
        self.current_step = 1;
        self.capture_failures = 0;
        self.last_signature = None;
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn capture_failures(&self) -> u32 {
        self.capture_failures
    }

    /// Returns true once the consecutive-failure streak reaches the limit.
    pub fn record_capture_failure(&mut self) -> bool {
        self.capture_failures += 1;
        self.capture_failures >= self.max_capture_failures
    }

    pub fn record_capture_success(&mut self) {
        self.capture_failures = 0;
    }

    /// Downgrade an exact repeat of the previous action to `Wait`.
    /// Only the immediately preceding signature is compared.
    pub fn guard_repetition(&mut self, proposal: ActionProposal) -> ActionProposal {
        let signature = proposal.action.signature();
        let repeated = !proposal.action.exempt_from_repetition_guard()
            && self.last_signature.as_deref() == Some(signature.as_str());

        let proposal = if repeated {
            tracing::warn!(
                step = self.current_step,
                signature = %signature,
                "same action as previous step, suppressing"
            );
            ActionProposal::new(Action::Wait, REPETITION_SUPPRESSED)
        } else {
            proposal
        };

        self.last_signature = Some(proposal.action.signature());
        proposal
    }

    /// Consume one step. Returns true when the budget is exhausted.
    pub fn advance(&mut self) -> bool {
        self.current_step += 1;
        self.current_step > self.max_steps
    }

    pub fn write_into(&self, state: &mut LoopState) {
        state.current_step = self.current_step;
        state.max_steps = self.max_steps;
        state.consecutive_capture_failures = self.capture_failures;
        state.last_action_signature = self.last_signature.clone();
    }
}
